use serde::{Deserialize, Serialize};

use crate::cards::Rotate;
use crate::grid::{Direction, Pos};
use crate::player::{Player, PlayerId};

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Client -> Host
    JoinMatch = 0x01,
    LeaveMatch = 0x02,
    ProgramCard = 0x03,
    PowerDown = 0x04,

    // Host -> Client
    JoinResponse = 0x10,
    PlayerList = 0x11,
    MatchStart = 0x12,
    PhaseState = 0x13,
    RoundEnd = 0x14,
    MatchEnd = 0x15,
}

impl MessageType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::JoinMatch),
            0x02 => Some(Self::LeaveMatch),
            0x03 => Some(Self::ProgramCard),
            0x04 => Some(Self::PowerDown),
            0x10 => Some(Self::JoinResponse),
            0x11 => Some(Self::PlayerList),
            0x12 => Some(Self::MatchStart),
            0x13 => Some(Self::PhaseState),
            0x14 => Some(Self::RoundEnd),
            0x15 => Some(Self::MatchEnd),
            _ => None,
        }
    }
}

/// One phase of a register resolution, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    RevealMove,
    ExpressBelts,
    AllBelts,
    RotatePads,
    PlayerLasers,
    BoardLasers,
    Checkpoints,
    Cleanup,
}

/// Request to join a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinMatchMsg {
    pub player_name: String,
    pub protocol_version: u8,
}

/// A player leaving mid-match forfeits its remaining registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveMatchMsg {
    pub player_number: PlayerId,
}

/// One programmed card for the sender's next open register slot.
///
/// The five fields are the whole programmed-move contract; any transport
/// that preserves them is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCardMsg {
    pub player_number: PlayerId,
    pub priority: u32,
    pub distance: i8,
    pub rotation: Rotate,
    pub name: String,
}

/// Announce (or withdraw) a power-down for the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerDownMsg {
    pub player_number: PlayerId,
    pub announce: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponseMsg {
    pub success: bool,
    pub player_number: Option<PlayerId>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerListMsg {
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStartMsg {
    pub board_name: String,
    pub flag_count: u8,
    pub players: Vec<Player>,
}

/// Per-robot state carried in every phase broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotStatus {
    pub player_number: PlayerId,
    pub pos: Pos,
    pub facing: Direction,
    pub damage: u8,
    pub lives: u8,
    pub flags_collected: u8,
    pub powered_down: bool,
}

/// A cell lit by a laser beam this phase, for beam animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaserOverlayCell {
    pub pos: Pos,
    pub vertical: bool,
    pub horizontal: bool,
}

/// Authoritative state after one completed phase. Observers animate from
/// these without participating in resolution timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStateMsg {
    pub round: u32,
    pub register: u8,
    pub phase: Phase,
    pub robots: Vec<RobotStatus>,
    pub lasers: Vec<LaserOverlayCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEndMsg {
    pub round: u32,
}

/// Why the match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    AllFlagsCollected,
    LastRobotStanding,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEndMsg {
    pub winner: Option<PlayerId>,
    pub outcome: MatchOutcome,
}

/// All messages a client may send to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    JoinMatch(JoinMatchMsg),
    LeaveMatch(LeaveMatchMsg),
    ProgramCard(ProgramCardMsg),
    PowerDown(PowerDownMsg),
}

impl ClientMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::JoinMatch(_) => MessageType::JoinMatch,
            Self::LeaveMatch(_) => MessageType::LeaveMatch,
            Self::ProgramCard(_) => MessageType::ProgramCard,
            Self::PowerDown(_) => MessageType::PowerDown,
        }
    }
}

/// All messages the host broadcasts to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    JoinResponse(JoinResponseMsg),
    PlayerList(PlayerListMsg),
    MatchStart(MatchStartMsg),
    PhaseState(PhaseStateMsg),
    RoundEnd(RoundEndMsg),
    MatchEnd(MatchEndMsg),
}

impl ServerMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::JoinResponse(_) => MessageType::JoinResponse,
            Self::PlayerList(_) => MessageType::PlayerList,
            Self::MatchStart(_) => MessageType::MatchStart,
            Self::PhaseState(_) => MessageType::PhaseState,
            Self::RoundEnd(_) => MessageType::RoundEnd,
            Self::MatchEnd(_) => MessageType::MatchEnd,
        }
    }
}
