//! Unified error type for the Oinky server.

use oinky_game::GameError;
use oinky_party::PartyError;
use oinky_protocol::{PlayerId, ProtocolError};
use oinky_session::SessionError;
use oinky_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum OinkyError {
    /// A transport-level error (bind, accept, send).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unexpected packet).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (unknown player, empty name).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A party-level error (not found, already in party, game running).
    #[error(transparent)]
    Party(#[from] PartyError),

    /// A game rejected a packet.
    #[error(transparent)]
    Game(#[from] GameError),

    /// `start-game` named a game this server doesn't have.
    #[error("unknown game type: {0}")]
    UnknownGameType(String),

    /// Names are fixed while in a party.
    #[error("player {0} cannot change name while in a party")]
    NameLocked(PlayerId),
}
