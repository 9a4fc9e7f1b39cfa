use crate::engine::registry::Registry;
use crate::types::{Direction, Vec2};

pub fn clamp_to_board(cell: Vec2, board_size: i32) -> Vec2 {
    let max = board_size - 1;
    Vec2 {
        x: cell.x.clamp(0, max),
        y: cell.y.clamp(0, max),
    }
}

pub fn manhattan(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

pub fn offset(cell: Vec2, dir: Direction) -> Vec2 {
    let (dx, dy) = dir.delta();
    Vec2 {
        x: cell.x + dx,
        y: cell.y + dy,
    }
}

/// One clamped step from `cell`.
pub fn step(cell: Vec2, dir: Direction, board_size: i32) -> Vec2 {
    clamp_to_board(offset(cell, dir), board_size)
}

pub fn is_occupied(
    registry: &Registry,
    cell: Vec2,
    excluding_id: &str,
    only_uncaught: bool,
) -> bool {
    registry.iter().any(|player| {
        player.id != excluding_id && player.pos == cell && !(only_uncaught && player.is_caught())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registry::Player;
    use crate::types::Controller;

    fn placed(id: &str, x: i32, y: i32) -> Player {
        let mut player = Player::new(id.to_string(), id.to_string(), 0, Controller::Human);
        player.pos = Vec2::new(x, y);
        player
    }

    #[test]
    fn steps_stay_on_board() {
        let board_size = 8;
        for x in 0..board_size {
            for y in 0..board_size {
                for dir in Direction::ALL {
                    let next = step(Vec2::new(x, y), dir, board_size);
                    assert!((0..board_size).contains(&next.x));
                    assert!((0..board_size).contains(&next.y));
                }
            }
        }
    }

    #[test]
    fn clamp_pulls_outside_cells_to_edge() {
        assert_eq!(clamp_to_board(Vec2::new(-3, 9), 8), Vec2::new(0, 7));
    }

    #[test]
    fn manhattan_is_symmetric() {
        let a = Vec2::new(1, 5);
        let b = Vec2::new(4, 2);
        assert_eq!(manhattan(a, b), 6);
        assert_eq!(manhattan(b, a), 6);
    }

    #[test]
    fn occupancy_ignores_self_and_optionally_caught() {
        let mut registry = Registry::new();
        registry.insert(placed("a", 2, 2));
        let mut caught = placed("b", 3, 3);
        caught.caught = true;
        registry.insert(caught);

        assert!(!is_occupied(&registry, Vec2::new(2, 2), "a", true));
        assert!(is_occupied(&registry, Vec2::new(2, 2), "b", true));
        assert!(!is_occupied(&registry, Vec2::new(3, 3), "a", true));
        assert!(is_occupied(&registry, Vec2::new(3, 3), "a", false));
    }
}
