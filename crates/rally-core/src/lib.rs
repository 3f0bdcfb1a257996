pub mod cards;
pub mod grid;
pub mod net;
pub mod player;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::cards::{ProgramCard, Rotate};
    use crate::player::{Player, PlayerId};

    /// Create `n` test players numbered 1..=n; player 1 is the host.
    pub fn make_players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player {
                number: i as PlayerId + 1,
                display_name: format!("Player{}", i + 1),
                is_host: i == 0,
                is_spectator: false,
            })
            .collect()
    }

    pub fn move_1(priority: u32) -> ProgramCard {
        ProgramCard::movement(priority, 1)
    }

    pub fn move_2(priority: u32) -> ProgramCard {
        ProgramCard::movement(priority, 2)
    }

    pub fn move_3(priority: u32) -> ProgramCard {
        ProgramCard::movement(priority, 3)
    }

    pub fn back_up(priority: u32) -> ProgramCard {
        ProgramCard::movement(priority, -1)
    }

    pub fn turn_left(priority: u32) -> ProgramCard {
        ProgramCard::rotation(priority, Rotate::Left)
    }

    pub fn turn_right(priority: u32) -> ProgramCard {
        ProgramCard::rotation(priority, Rotate::Right)
    }

    pub fn u_turn(priority: u32) -> ProgramCard {
        ProgramCard::rotation(priority, Rotate::UTurn)
    }

    /// A full five-card program of Move 1s with descending priorities,
    /// useful when a test only needs the round to resolve.
    pub fn idle_program() -> Vec<ProgramCard> {
        (0..5).map(|i| move_1(650 - i * 10)).collect()
    }
}
