//! The built-in minigames.
//!
//! Three games, three timing regimes:
//!
//! - [`FlappyGame`]: continuous physics, every member plays at once,
//!   driven by the server tick.
//! - [`ConnectFourGame`]: two players taking turns on a 7x6 board.
//! - [`BattleshipGame`]: two players, a private setup phase, then turns
//!   of firing at each other's fleet.
//!
//! [`GameKind`] is the closed registry the server consults on
//! `start-game`.

pub mod battleship;
pub mod connect4;
pub mod flappy;

#[cfg(test)]
mod testing;

use oinky_game::{Game, GameError, GameType, PartyView};
use oinky_protocol::{Codec, JsonCodec};
use serde::{Serialize, de::DeserializeOwned};

pub use battleship::BattleshipGame;
pub use connect4::ConnectFourGame;
pub use flappy::FlappyGame;

/// Every game the server can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKind {
    FlappyOinky,
    ConnectFour,
    Battleship,
}

impl GameKind {
    pub const ALL: [GameKind; 3] =
        [Self::FlappyOinky, Self::ConnectFour, Self::Battleship];

    /// Looks up a game by the name clients send in `start-game`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl GameType for GameKind {
    fn name(&self) -> &'static str {
        match self {
            Self::FlappyOinky => flappy::NAME,
            Self::ConnectFour => connect4::NAME,
            Self::Battleship => battleship::NAME,
        }
    }

    fn create(&self, party: &dyn PartyView) -> Option<Box<dyn Game>> {
        let members = party.members();
        match self {
            Self::FlappyOinky => {
                if members.is_empty() {
                    return None;
                }
                Some(Box::new(FlappyGame::new()))
            }
            Self::ConnectFour => {
                let game = ConnectFourGame::new(&members)?;
                Some(Box::new(game))
            }
            Self::Battleship => {
                let game = BattleshipGame::new(&members)?;
                Some(Box::new(game))
            }
        }
    }
}

/// Decodes a client packet, rejecting tags outside `accepted`.
///
/// Server-to-client tags of the same game are rejected too, so a client
/// can't forge an update.
pub(crate) fn decode_client<T: DeserializeOwned>(
    codec: &JsonCodec,
    payload: &[u8],
    accepted: &[&str],
) -> Result<T, GameError> {
    let kind = codec.peek_kind(payload)?;
    if !accepted.contains(&kind.as_str()) {
        return Err(GameError::UnknownPacket(kind));
    }
    Ok(codec.decode(payload)?)
}

/// Encodes `packet` and broadcasts it, logging if encoding fails.
pub(crate) fn broadcast<T: Serialize>(
    codec: &JsonCodec,
    party: &mut dyn PartyView,
    packet: &T,
) {
    match codec.encode(packet) {
        Ok(bytes) => party.broadcast(bytes),
        Err(e) => tracing::error!(error = %e, "failed to encode game packet"),
    }
}
