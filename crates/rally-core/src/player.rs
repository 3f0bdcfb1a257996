use serde::{Deserialize, Serialize};

/// Player slot number, 1..=8. Doubles as the start-position marker number.
pub type PlayerId = u8;

/// Maximum number of player slots a board carries markers for.
pub const MAX_PLAYERS: usize = 8;

/// A player connected to a match session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub number: PlayerId,
    pub display_name: String,
    pub is_host: bool,
    pub is_spectator: bool,
}
