//! Error types for the party layer.

use oinky_game::GameError;
use oinky_protocol::{PartyId, PlayerId};

/// Errors that can occur during party operations.
#[derive(Debug, thiserror::Error)]
pub enum PartyError {
    /// The party does not exist (or has been emptied and dropped).
    #[error("party {0} not found")]
    NotFound(PartyId),

    /// A player can be in at most one party.
    #[error("player {0} is already in party {1}")]
    AlreadyInParty(PlayerId, PartyId),

    #[error("player {0} is not in a party")]
    NotInParty(PlayerId),

    /// The party is playing; joining and starting are closed.
    #[error("party {0} already has a game running")]
    GameRunning(PartyId),

    /// A game packet arrived for a party that isn't playing.
    #[error("party {0} has no game running")]
    NoGameRunning(PartyId),

    /// The game type's factory refused this party, usually because of
    /// the member count.
    #[error("game {0} cannot be played by this party")]
    GameRefused(&'static str),

    /// The running game rejected a packet.
    #[error(transparent)]
    Game(#[from] GameError),
}
