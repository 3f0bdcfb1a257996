use serde::{Deserialize, Serialize};

use super::messages::{
    ClientMessage, JoinMatchMsg, JoinResponseMsg, LeaveMatchMsg, MatchEndMsg, MatchStartMsg,
    MessageType, PhaseStateMsg, PlayerListMsg, PowerDownMsg, ProgramCardMsg, RoundEndMsg,
    ServerMessage,
};

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Maximum message payload size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMessageType(u8),
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a serializable payload with a 1-byte type prefix.
pub fn encode_message<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes =
        rmp_serde::to_vec(payload).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

/// Encode a `ClientMessage` to wire format.
pub fn encode_client_message(msg: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ClientMessage::JoinMatch(m) => encode_message(MessageType::JoinMatch, m),
        ClientMessage::LeaveMatch(m) => encode_message(MessageType::LeaveMatch, m),
        ClientMessage::ProgramCard(m) => encode_message(MessageType::ProgramCard, m),
        ClientMessage::PowerDown(m) => encode_message(MessageType::PowerDown, m),
    }
}

/// Encode a `ServerMessage` to wire format.
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ServerMessage::JoinResponse(m) => encode_message(MessageType::JoinResponse, m),
        ServerMessage::PlayerList(m) => encode_message(MessageType::PlayerList, m),
        ServerMessage::MatchStart(m) => encode_message(MessageType::MatchStart, m),
        ServerMessage::PhaseState(m) => encode_message(MessageType::PhaseState, m),
        ServerMessage::RoundEnd(m) => encode_message(MessageType::RoundEnd, m),
        ServerMessage::MatchEnd(m) => encode_message(MessageType::MatchEnd, m),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    MessageType::from_byte(data[0]).ok_or(ProtocolError::UnknownMessageType(data[0]))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    rmp_serde::from_slice(&data[1..]).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Decode raw wire data into a `ClientMessage`.
pub fn decode_client_message(data: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::JoinMatch => Ok(ClientMessage::JoinMatch(decode_payload::<JoinMatchMsg>(
            data,
        )?)),
        MessageType::LeaveMatch => Ok(ClientMessage::LeaveMatch(
            decode_payload::<LeaveMatchMsg>(data)?,
        )),
        MessageType::ProgramCard => Ok(ClientMessage::ProgramCard(decode_payload::<
            ProgramCardMsg,
        >(data)?)),
        MessageType::PowerDown => Ok(ClientMessage::PowerDown(decode_payload::<PowerDownMsg>(
            data,
        )?)),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}

/// Decode raw wire data into a `ServerMessage`.
pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::JoinResponse => Ok(ServerMessage::JoinResponse(decode_payload::<
            JoinResponseMsg,
        >(data)?)),
        MessageType::PlayerList => Ok(ServerMessage::PlayerList(decode_payload::<PlayerListMsg>(
            data,
        )?)),
        MessageType::MatchStart => Ok(ServerMessage::MatchStart(decode_payload::<MatchStartMsg>(
            data,
        )?)),
        MessageType::PhaseState => Ok(ServerMessage::PhaseState(decode_payload::<PhaseStateMsg>(
            data,
        )?)),
        MessageType::RoundEnd => Ok(ServerMessage::RoundEnd(decode_payload::<RoundEndMsg>(
            data,
        )?)),
        MessageType::MatchEnd => Ok(ServerMessage::MatchEnd(decode_payload::<MatchEndMsg>(
            data,
        )?)),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}
