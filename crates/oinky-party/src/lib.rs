//! Party management for the Oinky party server.
//!
//! A party is a lobby of players that can host one minigame at a time.
//! The [`PartyManager`] is the single owner of party membership; players
//! only know which party they are in through it.
//!
//! # Key types
//!
//! - [`PartyManager`]: creates parties, moves players in and out, starts,
//!   ends and ticks their games
//! - [`Party`]: one lobby and its optional running game
//! - [`Member`]: a player's public identity plus the link to reach them
//! - [`PartyError`]: why a lobby operation was refused

mod error;
mod manager;
mod party;

pub use error::PartyError;
pub use manager::PartyManager;
pub use party::{Member, Party};
