use rally_core::grid::{Direction, Pos};

use crate::EngineEvent;
use crate::board::Board;
use crate::robot::Robot;

/// Result of a single one-cell move attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Blocked,
}

/// Whether a robot can leave `pos` in `direction`. A wall blocks from
/// either side of the shared edge: the origin cell declaring the edge, or
/// the destination cell declaring the paired edge.
pub fn can_move(board: &Board, pos: Pos, direction: Direction) -> bool {
    !board.has_wall(pos, direction)
        && !board.has_wall(pos.neighbour(direction), direction.opposite())
}

/// Index of the robot occupying `pos`, if any.
pub fn occupant(robots: &[Robot], pos: Pos) -> Option<usize> {
    robots.iter().position(|r| r.pos == pos)
}

/// Whether the whole chain of robots starting at `idx` can advance one
/// cell in `direction`. Every link must clear its own walls: one blocked
/// robot fails the entire chain.
fn can_push(board: &Board, robots: &[Robot], idx: usize, direction: Direction) -> bool {
    if !can_move(board, robots[idx].pos, direction) {
        return false;
    }
    match occupant(robots, robots[idx].pos.neighbour(direction)) {
        Some(next) => can_push(board, robots, next, direction),
        None => true,
    }
}

/// Advance the chain starting at `idx`, furthest robot first, so no two
/// robots ever share a cell mid-update.
fn push_chain(board: &Board, robots: &mut [Robot], idx: usize, direction: Direction) {
    let next_pos = robots[idx].pos.neighbour(direction);
    if let Some(next) = occupant(robots, next_pos) {
        push_chain(board, robots, next, direction);
    }
    robots[idx].pos = next_pos;
}

/// Attempt to move `mover` one cell in `direction`, pushing any chain of
/// robots ahead of it. Moving onto a hole or off the board edge succeeds
/// here; elimination is the turn engine's job at its phase boundaries.
pub fn attempt_move(
    board: &Board,
    robots: &mut [Robot],
    mover: usize,
    direction: Direction,
    events: &mut Vec<EngineEvent>,
) -> MoveOutcome {
    let from = robots[mover].pos;
    if !can_move(board, from, direction) {
        events.push(EngineEvent::WallImpact {
            player: robots[mover].player_number,
        });
        return MoveOutcome::Blocked;
    }

    let destination = from.neighbour(direction);
    if let Some(neighbour) = occupant(robots, destination) {
        if can_push(board, robots, neighbour, direction) {
            push_chain(board, robots, neighbour, direction);
        } else {
            return MoveOutcome::Blocked;
        }
    }

    robots[mover].pos = destination;
    // A programmed move ends any belt ride.
    robots[mover].last_belt_dir = None;
    MoveOutcome::Moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardDef;

    fn open_board() -> Board {
        Board::from_def(&BoardDef::new("open", 8, 8)).unwrap()
    }

    fn robot_at(number: u8, x: i32, y: i32) -> Robot {
        Robot::new(number, Pos::new(x, y), 3)
    }

    #[test]
    fn wall_on_origin_blocks() {
        let board =
            Board::from_def(&BoardDef::new("w", 8, 8).wall(2, 0, Direction::North)).unwrap();
        assert!(!can_move(&board, Pos::new(2, 0), Direction::North));
    }

    #[test]
    fn wall_on_destination_blocks() {
        let board =
            Board::from_def(&BoardDef::new("w", 8, 8).wall(2, 1, Direction::South)).unwrap();
        assert!(!can_move(&board, Pos::new(2, 0), Direction::North));
    }

    #[test]
    fn blocked_robot_stays_and_signals_impact() {
        let board =
            Board::from_def(&BoardDef::new("w", 8, 8).wall(2, 0, Direction::North)).unwrap();
        let mut robots = vec![robot_at(1, 2, 0)];
        let mut events = Vec::new();

        let outcome = attempt_move(&board, &mut robots, 0, Direction::North, &mut events);

        assert_eq!(outcome, MoveOutcome::Blocked);
        assert_eq!(robots[0].pos, Pos::new(2, 0));
        assert!(matches!(events[0], EngineEvent::WallImpact { player: 1 }));
    }

    #[test]
    fn simple_push() {
        let board = open_board();
        let mut robots = vec![robot_at(1, 3, 3), robot_at(2, 4, 3)];
        let mut events = Vec::new();

        let outcome = attempt_move(&board, &mut robots, 0, Direction::East, &mut events);

        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(robots[0].pos, Pos::new(4, 3));
        assert_eq!(robots[1].pos, Pos::new(5, 3));
    }

    #[test]
    fn chain_push_preserves_order() {
        let board = open_board();
        let mut robots = vec![
            robot_at(1, 1, 3),
            robot_at(2, 2, 3),
            robot_at(3, 3, 3),
            robot_at(4, 4, 3),
        ];
        let mut events = Vec::new();

        let outcome = attempt_move(&board, &mut robots, 0, Direction::East, &mut events);

        assert_eq!(outcome, MoveOutcome::Moved);
        for (i, robot) in robots.iter().enumerate() {
            assert_eq!(robot.pos, Pos::new(i as i32 + 2, 3));
        }
    }

    #[test]
    fn chain_against_wall_moves_nobody() {
        let board =
            Board::from_def(&BoardDef::new("w", 8, 8).wall(4, 3, Direction::East)).unwrap();
        let mut robots = vec![robot_at(1, 2, 3), robot_at(2, 3, 3), robot_at(3, 4, 3)];
        let mut events = Vec::new();

        let outcome = attempt_move(&board, &mut robots, 0, Direction::East, &mut events);

        assert_eq!(outcome, MoveOutcome::Blocked);
        assert_eq!(robots[0].pos, Pos::new(2, 3));
        assert_eq!(robots[1].pos, Pos::new(3, 3));
        assert_eq!(robots[2].pos, Pos::new(4, 3));
    }

    #[test]
    fn wall_between_chain_links_fails_whole_push() {
        // Wall between the two pushed robots, not at the end of the chain.
        let board =
            Board::from_def(&BoardDef::new("w", 8, 8).wall(3, 3, Direction::East)).unwrap();
        let mut robots = vec![robot_at(1, 2, 3), robot_at(2, 3, 3), robot_at(3, 4, 3)];
        let mut events = Vec::new();

        let outcome = attempt_move(&board, &mut robots, 0, Direction::East, &mut events);

        assert_eq!(outcome, MoveOutcome::Blocked);
        assert!(robots.iter().zip([2, 3, 4]).all(|(r, x)| r.pos.x == x));
    }

    #[test]
    fn move_off_board_edge_is_legal() {
        let board = open_board();
        let mut robots = vec![robot_at(1, 0, 0)];
        let mut events = Vec::new();

        let outcome = attempt_move(&board, &mut robots, 0, Direction::West, &mut events);

        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(robots[0].pos, Pos::new(-1, 0));
    }

    #[test]
    fn move_onto_hole_is_legal() {
        let board = Board::from_def(&BoardDef::new("h", 8, 8).hole(3, 0)).unwrap();
        let mut robots = vec![robot_at(1, 2, 0)];
        let mut events = Vec::new();

        let outcome = attempt_move(&board, &mut robots, 0, Direction::East, &mut events);

        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(robots[0].pos, Pos::new(3, 0));
    }

    #[test]
    fn push_off_board_edge_is_legal() {
        let board = open_board();
        let mut robots = vec![robot_at(1, 6, 0), robot_at(2, 7, 0)];
        let mut events = Vec::new();

        let outcome = attempt_move(&board, &mut robots, 0, Direction::East, &mut events);

        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(robots[0].pos, Pos::new(7, 0));
        assert_eq!(robots[1].pos, Pos::new(8, 0), "Pushed over the edge");
    }

    #[test]
    fn successful_move_clears_belt_memory() {
        let board = open_board();
        let mut robots = vec![robot_at(1, 3, 3)];
        robots[0].last_belt_dir = Some(Direction::North);
        let mut events = Vec::new();

        attempt_move(&board, &mut robots, 0, Direction::East, &mut events);

        assert_eq!(robots[0].last_belt_dir, None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Wall blocking is symmetric: can_move(c, d) is false exactly
            /// when either side of the shared edge declares a wall.
            #[test]
            fn wall_symmetry(
                wx in 0i32..8,
                wy in 0i32..8,
                edge_idx in 0usize..4,
                px in 0i32..8,
                py in 0i32..8,
                dir_idx in 0usize..4,
            ) {
                let edge = Direction::ALL[edge_idx];
                let dir = Direction::ALL[dir_idx];
                let board = Board::from_def(
                    &BoardDef::new("prop", 8, 8).wall(wx, wy, edge),
                ).unwrap();

                let pos = Pos::new(px, py);
                let expected = !(board.has_wall(pos, dir)
                    || board.has_wall(pos.neighbour(dir), dir.opposite()));
                prop_assert_eq!(can_move(&board, pos, dir), expected);
            }

            /// Pushing a chain of N robots with free space beyond shifts
            /// every robot exactly one cell, preserving relative order.
            #[test]
            fn chain_push_all_or_nothing(chain_len in 1usize..6, walled in proptest::bool::ANY) {
                let mut def = BoardDef::new("prop", 10, 3);
                if walled {
                    def = def.wall(chain_len as i32, 1, Direction::East);
                }
                let board = Board::from_def(&def).unwrap();

                let mut robots: Vec<Robot> = (0..=chain_len)
                    .map(|i| Robot::new(i as u8 + 1, Pos::new(i as i32, 1), 3))
                    .collect();
                let mut events = Vec::new();

                let outcome = attempt_move(&board, &mut robots, 0, Direction::East, &mut events);

                if walled {
                    prop_assert_eq!(outcome, MoveOutcome::Blocked);
                    for (i, robot) in robots.iter().enumerate() {
                        prop_assert_eq!(robot.pos, Pos::new(i as i32, 1));
                    }
                } else {
                    prop_assert_eq!(outcome, MoveOutcome::Moved);
                    for (i, robot) in robots.iter().enumerate() {
                        prop_assert_eq!(robot.pos, Pos::new(i as i32 + 1, 1));
                    }
                }
            }
        }
    }
}
