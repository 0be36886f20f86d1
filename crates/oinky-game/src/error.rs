//! Error types for minigame input handling.

use oinky_protocol::{PlayerId, ProtocolError};

/// Why a game rejected a packet.
///
/// None of these are fatal. The caller logs them and the sender's
/// packet simply has no effect.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The payload could not be decoded into the game's packet shape,
    /// or an outgoing packet could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The tag is not one this game understands.
    #[error("unknown game packet: {0}")]
    UnknownPacket(String),

    /// The sender is not a participant (or no longer alive).
    #[error("player {0} is not playing this game")]
    NotAPlayer(PlayerId),

    #[error("it is not your turn")]
    NotYourTurn,

    /// A column or cell outside the board.
    #[error("position out of range")]
    OutOfRange,

    #[error("column is full")]
    ColumnFull,

    /// A ship layout that breaks the fleet rules.
    #[error("invalid layout: {0}")]
    InvalidLayout(&'static str),

    #[error("already submitted")]
    AlreadySubmitted,

    /// The packet is valid, but not in the game's current phase.
    #[error("not allowed in the current phase")]
    WrongPhase,
}
