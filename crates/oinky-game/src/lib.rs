//! The contract between a party and the minigame it hosts.
//!
//! A minigame never sees the coordinator, the registry or other parties.
//! Everything it may do to the outside world goes through the narrow
//! [`PartyView`] it is handed on every call.
//!
//! # Key types
//!
//! - [`GameType`]: a named factory, consulted once per `start-game`
//! - [`Game`]: one running instance, owned by its party
//! - [`PartyView`]: members, broadcast, private send, end request
//! - [`GameError`]: rejected input, logged by the caller

mod error;
mod logic;

pub use error::GameError;
pub use logic::{Game, GameType, PartyView};
