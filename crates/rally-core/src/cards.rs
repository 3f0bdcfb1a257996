use serde::{Deserialize, Serialize};

/// Rotation printed on a program card. `None` marks a movement card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotate {
    None,
    Left,
    Right,
    UTurn,
}

/// Lowest priority printed on any card in the deck.
pub const MIN_PRIORITY: u32 = 10;
/// Highest priority printed on any card in the deck.
pub const MAX_PRIORITY: u32 = 840;

/// A single program card: priority decides action order within a register,
/// `distance` is the number of one-cell steps (−1 = back up one cell),
/// rotation cards never move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCard {
    pub priority: u32,
    pub distance: i8,
    pub rotate: Rotate,
    pub name: String,
}

/// Why a received card was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    PriorityOutOfRange(u32),
    BadDistance(i8),
    /// Rotation cards must have distance 0; movement cards must not rotate.
    Inconsistent { distance: i8, rotate: Rotate },
}

impl std::fmt::Display for CardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PriorityOutOfRange(p) => {
                write!(f, "priority {p} outside [{MIN_PRIORITY}, {MAX_PRIORITY}]")
            },
            Self::BadDistance(d) => write!(f, "distance {d} is not one of -1, 0, 1, 2, 3"),
            Self::Inconsistent { distance, rotate } => {
                write!(f, "distance {distance} conflicts with rotation {rotate:?}")
            },
        }
    }
}

impl std::error::Error for CardError {}

impl ProgramCard {
    /// Movement card ("Move 1".."Move 3", or "Back up" for distance −1).
    pub fn movement(priority: u32, distance: i8) -> Self {
        let name = match distance {
            -1 => "Back up".to_string(),
            n => format!("Move {n}"),
        };
        Self {
            priority,
            distance,
            rotate: Rotate::None,
            name,
        }
    }

    /// Rotation card. Panics in debug builds if called with `Rotate::None`.
    pub fn rotation(priority: u32, rotate: Rotate) -> Self {
        debug_assert!(rotate != Rotate::None, "rotation card needs a rotation");
        let name = match rotate {
            Rotate::Left => "Left turn",
            Rotate::Right => "Right turn",
            Rotate::UTurn | Rotate::None => "U-turn",
        };
        Self {
            priority,
            distance: 0,
            rotate,
            name: name.to_string(),
        }
    }

    /// Whether this card only changes facing.
    pub fn is_rotation(&self) -> bool {
        self.rotate != Rotate::None
    }

    /// Check the invariants a card received off the wire must satisfy.
    pub fn validate(&self) -> Result<(), CardError> {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
            return Err(CardError::PriorityOutOfRange(self.priority));
        }
        if !matches!(self.distance, -1..=3) {
            return Err(CardError::BadDistance(self.distance));
        }
        let consistent = match self.rotate {
            Rotate::None => self.distance != 0,
            _ => self.distance == 0,
        };
        if !consistent {
            return Err(CardError::Inconsistent {
                distance: self.distance,
                rotate: self.rotate,
            });
        }
        Ok(())
    }
}
