//! # Oinky
//!
//! Authoritative server for a multiplayer party-game platform.
//!
//! Players connect over TCP, gather in parties and start one of the
//! built-in minigames, which the server simulates at a fixed tick rate.
//! Everything a player does passes through one single-threaded
//! [`Coordinator`] loop, so party, player and game state need no locks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oinky::OinkyServer;
//!
//! # async fn start() -> Result<(), oinky::OinkyError> {
//! let server = OinkyServer::builder()
//!     .bind("0.0.0.0:3333")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::OinkyError;
pub use server::{Coordinator, OinkyServer, OinkyServerBuilder};

pub mod prelude {
    pub use crate::{Coordinator, OinkyError, OinkyServer, OinkyServerBuilder, ServerConfig};
    pub use oinky_game::{Game, GameError, GameType, PartyView};
    pub use oinky_minigames::GameKind;
    pub use oinky_protocol::{Codec, JsonCodec, Packet, PartyData, PartyId, PlayerData, PlayerId};
    pub use oinky_tick::{TickConfig, TickPolicy};
    pub use oinky_transport::LinkConfig;
}
