use rand::Rng;

use crate::constants::EVASION_PROXIMITY;
use crate::engine::grid::{clamp_to_board, is_occupied, manhattan, offset, step};
use crate::engine::registry::{Player, Registry};
use crate::types::{Direction, Role, Vec2};

/// Decision strategy for an AI-controlled participant, chosen by role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiPolicy {
    Pursuit,
    Evasion,
}

impl AiPolicy {
    /// `None` for humans and for caught players, who never act.
    pub fn for_player(player: &Player) -> Option<Self> {
        if !player.is_ai() || player.is_caught() {
            return None;
        }
        Some(match player.role() {
            Role::Giant => Self::Pursuit,
            Role::Runner => Self::Evasion,
        })
    }

    /// Target cell for this tick, already clamped and (for runners)
    /// occupancy-checked. `None` means stay put.
    pub fn decide<R: Rng>(
        self,
        registry: &Registry,
        player_id: &str,
        board_size: i32,
        rng: &mut R,
    ) -> Option<Vec2> {
        match self {
            Self::Pursuit => pursue(registry, player_id, board_size),
            Self::Evasion => evade(registry, player_id, board_size, rng),
        }
    }
}

/// Step toward the nearest runner. Distance ties go to the runner that
/// comes first in registry order.
pub fn pursue(registry: &Registry, giant_id: &str, board_size: i32) -> Option<Vec2> {
    let giant = registry.get(giant_id)?;
    let mut target: Option<&Player> = None;
    let mut best = i32::MAX;
    for player in registry.iter() {
        if player.id == giant.id || !player.is_runner() {
            continue;
        }
        let distance = manhattan(player.pos, giant.pos);
        if distance < best {
            best = distance;
            target = Some(player);
        }
    }
    let target = target?;

    let dx = target.pos.x - giant.pos.x;
    let dy = target.pos.y - giant.pos.y;
    let next = if dx.abs() > dy.abs() {
        Vec2::new(giant.pos.x + dx.signum(), giant.pos.y)
    } else if dy != 0 {
        Vec2::new(giant.pos.x, giant.pos.y + dy.signum())
    } else {
        return None;
    };
    Some(clamp_to_board(next, board_size))
}

pub fn evade<R: Rng>(
    registry: &Registry,
    runner_id: &str,
    board_size: i32,
    rng: &mut R,
) -> Option<Vec2> {
    let runner = registry.get(runner_id)?;
    let giant = registry.giant()?;
    let here = runner.pos;
    let dx = here.x - giant.pos.x;
    let dy = here.y - giant.pos.y;
    let distance = dx.abs() + dy.abs();

    let preferred = if distance <= EVASION_PROXIMITY {
        close_escape(here, dx, dy)
    } else {
        far_escape(here, dx, dy, rng)
    };
    let preferred = clamp_to_board(preferred, board_size);
    // A wall clamp that leaves the runner in place counts as blocked.
    if preferred != here && !is_occupied(registry, preferred, runner_id, true) {
        return Some(preferred);
    }

    let mut best: Option<(i32, Vec2)> = None;
    for dir in Direction::ALL {
        let cell = step(here, dir, board_size);
        if cell == here || is_occupied(registry, cell, runner_id, true) {
            continue;
        }
        let away = manhattan(cell, giant.pos);
        if away <= distance {
            continue;
        }
        if best.map(|(score, _)| away > score).unwrap_or(true) {
            best = Some((away, cell));
        }
    }
    best.map(|(_, cell)| cell)
}

fn close_escape(here: Vec2, dx: i32, dy: i32) -> Vec2 {
    let move_x = dx.signum();
    let move_y = dy.signum();
    if dx.abs() >= dy.abs() && move_x != 0 {
        Vec2::new(here.x + move_x, here.y)
    } else if move_y != 0 {
        Vec2::new(here.x, here.y + move_y)
    } else if move_x != 0 {
        Vec2::new(here.x + move_x, here.y)
    } else {
        here
    }
}

fn far_escape<R: Rng>(here: Vec2, dx: i32, dy: i32, rng: &mut R) -> Vec2 {
    if dx.abs() > dy.abs() {
        Vec2::new(here.x + dx.signum(), here.y)
    } else if dy != 0 {
        Vec2::new(here.x, here.y + dy.signum())
    } else {
        offset(here, Direction::ALL[rng.random_range(0..Direction::ALL.len())])
    }
}
