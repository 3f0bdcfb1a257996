use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use rally_core::grid::{Direction, Pos};

use crate::board::Board;
use crate::robot::Robot;

/// Facing used when a robot falls back to its start-position marker.
const FALLBACK_FACING: Direction = Direction::East;

/// Decide where a respawning robot re-enters the board.
///
/// The primary backup cell wins when free. Otherwise the 8-neighbourhood
/// around it is searched in shuffled order (shuffled facings too, to avoid
/// deterministic bias), falling back to the robot's start marker, then one
/// more neighbourhood search around the start marker, and finally a forced
/// placement at the start marker. The search never loops forever.
pub fn place_at_backup(
    board: &Board,
    occupied: &[Pos],
    robot: &Robot,
    rng: &mut StdRng,
) -> (Pos, Direction) {
    if !occupied.contains(&robot.backup_pos) {
        return (robot.backup_pos, robot.backup_facing);
    }
    choose_alternative(board, occupied, robot, robot.backup_pos, rng, 0)
}

fn choose_alternative(
    board: &Board,
    occupied: &[Pos],
    robot: &Robot,
    around: Pos,
    rng: &mut StdRng,
    attempt: u8,
) -> (Pos, Direction) {
    let mut cells = board.neighbourhood(around);
    cells.shuffle(rng);
    for cell in cells {
        if !valid_respawn_position(board, occupied, cell) {
            continue;
        }
        let mut facings = Direction::ALL;
        facings.shuffle(rng);
        return (cell, facings[0]);
    }

    let start = board
        .start_position(robot.player_number)
        .unwrap_or(robot.backup_pos);
    if !occupied.contains(&start) {
        return (start, FALLBACK_FACING);
    }
    if attempt == 0 {
        return choose_alternative(board, occupied, robot, start, rng, 1);
    }
    tracing::warn!(
        player = robot.player_number,
        x = start.x,
        y = start.y,
        "Respawn search exhausted, forcing placement at start marker"
    );
    (start, FALLBACK_FACING)
}

fn valid_respawn_position(board: &Board, occupied: &[Pos], cell: Pos) -> bool {
    board.inside(cell) && !board.is_hole(cell) && !occupied.contains(&cell)
}
