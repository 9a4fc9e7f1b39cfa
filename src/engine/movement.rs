use crate::engine::grid::{is_occupied, step};
use crate::engine::registry::Registry;
use crate::types::{Direction, Vec2};

/// Moves `player_id` one cell in `dir` if allowed and returns the new cell.
///
/// The giant is never blocked; stepping onto a runner is a catch. Anyone
/// else is rejected when another uncaught player holds the target cell, and
/// a rejected move leaves the position untouched.
pub fn attempt_move(
    registry: &mut Registry,
    player_id: &str,
    dir: Direction,
    board_size: i32,
) -> Option<Vec2> {
    let player = registry.get(player_id)?;
    let target = step(player.pos, dir, board_size);
    if !player.is_giant() && is_occupied(registry, target, player_id, true) {
        return None;
    }
    let player = registry.get_mut(player_id)?;
    player.pos = target;
    Some(target)
}
