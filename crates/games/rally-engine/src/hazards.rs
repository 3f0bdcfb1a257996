use rally_core::grid::{Direction, Pos};
use rally_core::player::PlayerId;

use crate::EngineEvent;
use crate::board::Board;
use crate::movement::{can_move, occupant};
use crate::robot::{BeltPush, Robot};

/// Run one belt phase: the express-only pass, or the all-belts pass.
///
/// Pushes are collected as intents first; two intents resolving to the
/// same cell cancel each other, and an intent into a cell whose occupant
/// is staying put is cancelled too, so belts never stack robots. Belts
/// ignore walls.
pub fn run_belts(board: &Board, robots: &mut [Robot], express_only: bool) {
    for robot in robots.iter_mut() {
        let Some(belt) = board.belt_at(robot.pos) else {
            continue;
        };
        if express_only && !belt.express {
            continue;
        }
        // Riding onto a belt that bends relative to the previous push
        // rotates the robot the same way the belt turns.
        if let Some(last) = robot.last_belt_dir {
            if belt.direction == last.turn_right() {
                robot.facing = robot.facing.turn_right();
            } else if belt.direction == last.turn_left() {
                robot.facing = robot.facing.turn_left();
            }
        }
        robot.last_belt_dir = Some(belt.direction);
        robot.belt_push = Some(BeltPush {
            direction: belt.direction,
            to: robot.pos.neighbour(belt.direction),
        });
    }

    // Conflicting destinations: both pushes cancel, neither robot moves.
    for i in 0..robots.len() {
        for j in (i + 1)..robots.len() {
            if let (Some(a), Some(b)) = (robots[i].belt_push, robots[j].belt_push)
                && a.to == b.to
            {
                robots[i].belt_push = None;
                robots[j].belt_push = None;
            }
        }
    }

    // Cancelling one push can strand the robot behind it; iterate until
    // no intent targets a stationary robot's cell.
    loop {
        let mut changed = false;
        for i in 0..robots.len() {
            let Some(push) = robots[i].belt_push else {
                continue;
            };
            let blocked = robots
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && other.belt_push.is_none() && other.pos == push.to);
            if blocked {
                robots[i].belt_push = None;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    for robot in robots.iter_mut() {
        if let Some(push) = robot.belt_push.take() {
            robot.pos = push.to;
        }
    }
}

/// Rotate every robot standing on a rotate pad. In-place, no collisions.
pub fn run_rotate_pads(board: &Board, robots: &mut [Robot]) {
    for robot in robots.iter_mut() {
        match board.pad_at(robot.pos) {
            Some(rally_core::cards::Rotate::Left) => robot.facing = robot.facing.turn_left(),
            Some(rally_core::cards::Rotate::Right) => robot.facing = robot.facing.turn_right(),
            _ => {},
        }
    }
}

/// Cast one beam from `start`, marking the overlay cell by cell until a
/// wall blocks it, a robot takes the hit, or the beam leaves the board.
fn cast_beam(
    board: &mut Board,
    robots: &mut [Robot],
    start: Pos,
    direction: Direction,
    shooter: Option<PlayerId>,
    events: &mut Vec<EngineEvent>,
) {
    let mut cell = start;
    loop {
        if !board.inside(cell) {
            return;
        }
        board.mark_laser(cell, direction);
        if let Some(idx) = occupant(robots, cell) {
            robots[idx].apply_damage();
            events.push(EngineEvent::LaserHit {
                shooter,
                target: robots[idx].player_number,
            });
            return;
        }
        if !can_move(board, cell, direction) {
            return;
        }
        cell = cell.neighbour(direction);
    }
}

/// Every non-powered-down robot fires along its facing. The beam starts in
/// the neighbouring cell, so a robot never shoots itself, and a wall on
/// the robot's own edge suppresses the shot entirely.
pub fn fire_player_lasers(board: &mut Board, robots: &mut [Robot], events: &mut Vec<EngineEvent>) {
    let shooters: Vec<(PlayerId, Pos, Direction)> = robots
        .iter()
        .filter(|r| !r.powered_down)
        .map(|r| (r.player_number, r.pos, r.facing))
        .collect();

    for (number, pos, facing) in shooters {
        if can_move(board, pos, facing) {
            cast_beam(
                board,
                robots,
                pos.neighbour(facing),
                facing,
                Some(number),
                events,
            );
        }
    }
}

/// Board-mounted lasers fire from their emitter cell every register.
pub fn fire_board_lasers(board: &mut Board, robots: &mut [Robot], events: &mut Vec<EngineEvent>) {
    let emitters = board.emitters().to_vec();
    for emitter in emitters {
        cast_beam(board, robots, emitter.pos, emitter.direction, None, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardDef;
    use rally_core::cards::Rotate;

    fn robot_at(number: u8, x: i32, y: i32) -> Robot {
        Robot::new(number, Pos::new(x, y), 3)
    }

    #[test]
    fn belt_carries_occupant() {
        let board =
            Board::from_def(&BoardDef::new("b", 8, 8).belt(2, 2, Direction::North, false))
                .unwrap();
        let mut robots = vec![robot_at(1, 2, 2)];

        run_belts(&board, &mut robots, false);

        assert_eq!(robots[0].pos, Pos::new(2, 3));
        assert_eq!(robots[0].last_belt_dir, Some(Direction::North));
    }

    #[test]
    fn express_pass_skips_normal_belts() {
        let board = Board::from_def(
            &BoardDef::new("b", 8, 8)
                .belt(1, 1, Direction::East, false)
                .belt(4, 4, Direction::East, true),
        )
        .unwrap();
        let mut robots = vec![robot_at(1, 1, 1), robot_at(2, 4, 4)];

        run_belts(&board, &mut robots, true);

        assert_eq!(robots[0].pos, Pos::new(1, 1), "Normal belt must not move");
        assert_eq!(robots[1].pos, Pos::new(5, 4), "Express belt must move");
    }

    #[test]
    fn conflicting_destinations_cancel_both() {
        let board = Board::from_def(
            &BoardDef::new("b", 8, 8)
                .belt(2, 3, Direction::East, false)
                .belt(4, 3, Direction::West, false),
        )
        .unwrap();
        let mut robots = vec![robot_at(1, 2, 3), robot_at(2, 4, 3)];

        run_belts(&board, &mut robots, false);

        assert_eq!(robots[0].pos, Pos::new(2, 3));
        assert_eq!(robots[1].pos, Pos::new(4, 3));
    }

    #[test]
    fn belt_into_stationary_robot_cancels() {
        let board =
            Board::from_def(&BoardDef::new("b", 8, 8).belt(2, 3, Direction::East, false))
                .unwrap();
        let mut robots = vec![robot_at(1, 2, 3), robot_at(2, 3, 3)];

        run_belts(&board, &mut robots, false);

        assert_eq!(robots[0].pos, Pos::new(2, 3), "No silent stacking");
        assert_eq!(robots[1].pos, Pos::new(3, 3));
    }

    #[test]
    fn belt_train_advances_together() {
        let board = Board::from_def(
            &BoardDef::new("b", 8, 8)
                .belt(1, 1, Direction::East, false)
                .belt(2, 1, Direction::East, false),
        )
        .unwrap();
        let mut robots = vec![robot_at(1, 1, 1), robot_at(2, 2, 1)];

        run_belts(&board, &mut robots, false);

        assert_eq!(robots[0].pos, Pos::new(2, 1));
        assert_eq!(robots[1].pos, Pos::new(3, 1));
    }

    #[test]
    fn belt_bend_rotates_rider() {
        // East belt into a north belt: a left-hand bend.
        let board = Board::from_def(
            &BoardDef::new("b", 8, 8)
                .belt(1, 1, Direction::East, false)
                .belt(2, 1, Direction::North, false),
        )
        .unwrap();
        let mut robots = vec![robot_at(1, 1, 1)];
        robots[0].facing = Direction::East;

        run_belts(&board, &mut robots, false);
        assert_eq!(robots[0].pos, Pos::new(2, 1));
        assert_eq!(robots[0].facing, Direction::East, "First push never turns");

        run_belts(&board, &mut robots, false);
        assert_eq!(robots[0].pos, Pos::new(2, 2));
        assert_eq!(
            robots[0].facing,
            Direction::North,
            "East→north bend turns the rider left"
        );
    }

    #[test]
    fn belt_turn_rule_all_transitions() {
        // (previous push, belt direction, expected turn applied to a
        // north-facing robot). Straight-through and reversed transitions
        // leave the facing alone.
        let cases = [
            (Direction::North, Direction::East, Direction::East),
            (Direction::North, Direction::West, Direction::West),
            (Direction::South, Direction::West, Direction::East),
            (Direction::South, Direction::East, Direction::West),
            (Direction::East, Direction::South, Direction::East),
            (Direction::East, Direction::North, Direction::West),
            (Direction::West, Direction::North, Direction::East),
            (Direction::West, Direction::South, Direction::West),
            (Direction::North, Direction::North, Direction::North),
            (Direction::North, Direction::South, Direction::North),
        ];
        for (last, belt_dir, expected_facing) in cases {
            let board =
                Board::from_def(&BoardDef::new("b", 8, 8).belt(4, 4, belt_dir, false)).unwrap();
            let mut robots = vec![robot_at(1, 4, 4)];
            robots[0].facing = Direction::North;
            robots[0].last_belt_dir = Some(last);

            run_belts(&board, &mut robots, false);

            assert_eq!(
                robots[0].facing, expected_facing,
                "last push {last:?} onto {belt_dir:?} belt"
            );
        }
    }

    #[test]
    fn rotate_pads_turn_in_place() {
        let board = Board::from_def(
            &BoardDef::new("p", 8, 8)
                .pad(1, 1, Rotate::Left)
                .pad(2, 2, Rotate::Right),
        )
        .unwrap();
        let mut robots = vec![robot_at(1, 1, 1), robot_at(2, 2, 2), robot_at(3, 3, 3)];
        for robot in &mut robots {
            robot.facing = Direction::North;
        }

        run_rotate_pads(&board, &mut robots);

        assert_eq!(robots[0].facing, Direction::West);
        assert_eq!(robots[0].pos, Pos::new(1, 1));
        assert_eq!(robots[1].facing, Direction::East);
        assert_eq!(robots[2].facing, Direction::North);
    }

    #[test]
    fn player_laser_hits_first_robot_and_marks_overlay() {
        let mut board = Board::from_def(&BoardDef::new("l", 8, 8)).unwrap();
        let mut robots = vec![robot_at(1, 0, 0), robot_at(2, 3, 0), robot_at(3, 5, 0)];
        robots[0].facing = Direction::East;
        robots[1].facing = Direction::North;
        robots[2].facing = Direction::North;
        let mut events = Vec::new();

        fire_player_lasers(&mut board, &mut robots, &mut events);

        assert_eq!(robots[1].damage, 1, "First robot in the beam takes the hit");
        assert_eq!(robots[2].damage, 0, "Beam stops at the first robot");
        let lit: Vec<Pos> = board.laser_overlay().iter().map(|(p, _)| *p).collect();
        assert!(lit.contains(&Pos::new(1, 0)));
        assert!(lit.contains(&Pos::new(2, 0)));
        assert!(lit.contains(&Pos::new(3, 0)));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, EngineEvent::LaserHit { shooter: Some(1), target: 2 }))
        );
    }

    #[test]
    fn wall_stops_beam_without_damage() {
        let mut board =
            Board::from_def(&BoardDef::new("l", 8, 8).wall(1, 0, Direction::East)).unwrap();
        let mut robots = vec![robot_at(1, 0, 0), robot_at(2, 3, 0)];
        robots[0].facing = Direction::East;
        robots[1].facing = Direction::North;
        let mut events = Vec::new();

        fire_player_lasers(&mut board, &mut robots, &mut events);

        assert_eq!(robots[1].damage, 0);
        let lit: Vec<Pos> = board.laser_overlay().iter().map(|(p, _)| *p).collect();
        assert!(lit.contains(&Pos::new(1, 0)), "Beam reaches the wall cell");
        assert!(!lit.contains(&Pos::new(2, 0)), "Beam stops at the wall");
    }

    #[test]
    fn wall_on_own_edge_suppresses_shot() {
        let mut board =
            Board::from_def(&BoardDef::new("l", 8, 8).wall(0, 0, Direction::East)).unwrap();
        let mut robots = vec![robot_at(1, 0, 0), robot_at(2, 2, 0)];
        robots[0].facing = Direction::East;
        robots[1].facing = Direction::North;
        let mut events = Vec::new();

        fire_player_lasers(&mut board, &mut robots, &mut events);

        assert_eq!(robots[1].damage, 0);
        assert!(board.laser_overlay().is_empty());
    }

    #[test]
    fn powered_down_robot_does_not_fire() {
        let mut board = Board::from_def(&BoardDef::new("l", 8, 8)).unwrap();
        let mut robots = vec![robot_at(1, 0, 0), robot_at(2, 3, 0)];
        robots[0].facing = Direction::East;
        robots[0].powered_down = true;
        robots[1].facing = Direction::North;
        let mut events = Vec::new();

        fire_player_lasers(&mut board, &mut robots, &mut events);

        assert_eq!(robots[1].damage, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn board_laser_fires_from_emitter() {
        let mut board =
            Board::from_def(&BoardDef::new("l", 8, 8).laser(0, 4, Direction::East)).unwrap();
        let mut robots = vec![robot_at(1, 2, 4)];
        robots[0].facing = Direction::North;
        let mut events = Vec::new();

        fire_board_lasers(&mut board, &mut robots, &mut events);

        assert_eq!(robots[0].damage, 1);
        let lit: Vec<Pos> = board.laser_overlay().iter().map(|(p, _)| *p).collect();
        assert!(lit.contains(&Pos::new(0, 4)), "Emitter cell is lit");
        assert!(
            events
                .iter()
                .any(|e| matches!(e, EngineEvent::LaserHit { shooter: None, target: 1 }))
        );
    }

    #[test]
    fn beam_runs_off_open_board() {
        let mut board = Board::from_def(&BoardDef::new("l", 4, 4).laser(0, 2, Direction::East))
            .unwrap();
        let mut robots: Vec<Robot> = Vec::new();
        let mut events = Vec::new();

        fire_board_lasers(&mut board, &mut robots, &mut events);

        assert_eq!(board.laser_overlay().len(), 4, "Every cell in the row lit");
        assert!(events.is_empty());
    }
}
