//! Error types for the session layer.

use oinky_protocol::PlayerId;

/// Errors that can occur while managing players.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No player is registered under this id.
    /// Usually the player disconnected earlier in the same tick.
    #[error("player {0} not found")]
    NotFound(PlayerId),

    /// The requested display name is empty after trimming.
    #[error("name must not be empty")]
    EmptyName,
}
