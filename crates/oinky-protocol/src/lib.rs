//! Wire protocol for the Oinky party server.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Packet`], [`PlayerId`], [`PartyData`], etc.): the
//!   global messages that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to/from bytes, and how the discriminator is read without
//!   decoding the whole packet ([`Codec::peek_kind`]).
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (length-prefixed frames)
//! and the coordinator (routing). It doesn't know about connections or
//! parties; it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (frames) → Protocol (Packet) → Coordinator (party / game)
//! ```
//!
//! Every packet, global or game-specific, is a flat JSON object with a
//! mandatory `"PacketName"` field. Minigames define their own packet
//! enums using the same [`KIND_FIELD`] so the router can dispatch on
//! the tag alone.

use std::time::Duration;

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Packet, PartyData, PartyId, PlayerData, PlayerId};

/// Name of the discriminator field carried by every packet.
pub const KIND_FIELD: &str = "PacketName";

/// TCP port the server listens on.
pub const PORT: u16 = 3333;

/// Length of one tick of the authoritative server loop.
pub const TICK_DURATION: Duration = Duration::from_millis(50);
