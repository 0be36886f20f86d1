//! Core protocol types for the wire format.
//!
//! This module defines every global type that travels "on the wire":
//! identities, lobby summaries, and the [`Packet`] enum that covers
//! connection, party, and game-lifecycle messages. Minigame packets are
//! defined next to each minigame.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected player.
///
/// Newtype over the 32-bit signed id the wire format uses, so a
/// `PartyId` can never be passed where a `PlayerId` is expected.
/// `#[serde(transparent)]` keeps it a plain number in JSON.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub i32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a party (lobby).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PartyId(pub i32);

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "party-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Public identity of a player, as shown to other players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerData {
    pub name: String,
    pub id: PlayerId,
}

/// A party summary: used in listings and in the membership snapshot a
/// player receives when joining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartyData {
    pub name: String,
    pub id: PartyId,
    /// Members in join order.
    pub players: Vec<PlayerData>,
}

// ---------------------------------------------------------------------------
// Packet: global messages
// ---------------------------------------------------------------------------

/// Every global (non-game) message, in both directions.
///
/// `#[serde(tag = "PacketName")]` produces flat, internally tagged JSON:
///
/// ```text
/// { "PacketName": "join-party", "Id": 1234 }
/// ```
///
/// Variant names become kebab-case tags, field names become PascalCase.
/// Any tag not listed here belongs to the running minigame and is
/// forwarded to it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "PacketName",
    rename_all = "kebab-case",
    rename_all_fields = "PascalCase"
)]
pub enum Packet {
    // -- Connection --

    /// Server → Client: the identity assigned to this connection.
    /// Re-sent after a successful name change.
    Welcome { your_id: PlayerId, your_name: String },

    /// Client → Server: "call me this from now on". Only allowed while
    /// not in a party.
    ChangeName { new_name: String },

    // -- Lobby --

    /// Client → Server: create a party and become its first member.
    CreateParty { name: String },

    /// Client → Server: "show me parties I could join".
    QueryParties,

    /// Server → Client: the joinable parties.
    ListParties { parties: Vec<PartyData> },

    /// Client → Server: join the party with this id.
    JoinParty { id: PartyId },

    /// Client → Server: leave the current party.
    LeaveParty,

    /// Server → Client: you are now in this party (full snapshot,
    /// including yourself).
    YouJoinedParty { party: PartyData },

    /// Server → Client: you are no longer in a party.
    YouLeftParty,

    /// Server → Party: someone joined.
    PlayerJoinedParty { player: PlayerData },

    /// Server → Party: someone left.
    PlayerLeftParty { id: PlayerId },

    // -- Game lifecycle --

    /// Client → Server: start a game of this type in my party.
    StartGame { game_type: String },

    /// Server → Party: a game of this type is now running.
    GameStarted { game_type: String },

    /// Server → Party: the running game is over.
    GameEnded,

    /// Client → Server: stop the running game.
    EndGame,
}

impl Packet {
    /// Every tag owned by the global protocol.
    pub const KINDS: [&'static str; 15] = [
        "welcome",
        "change-name",
        "create-party",
        "query-parties",
        "list-parties",
        "join-party",
        "leave-party",
        "you-joined-party",
        "you-left-party",
        "player-joined-party",
        "player-left-party",
        "start-game",
        "game-started",
        "game-ended",
        "end-game",
    ];

    /// Returns `true` if `kind` is a global tag (as opposed to a
    /// minigame tag that should be forwarded to the running game).
    pub fn is_global_kind(kind: &str) -> bool {
        Self::KINDS.contains(&kind)
    }

    /// The discriminator this packet is encoded with.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::ChangeName { .. } => "change-name",
            Self::CreateParty { .. } => "create-party",
            Self::QueryParties => "query-parties",
            Self::ListParties { .. } => "list-parties",
            Self::JoinParty { .. } => "join-party",
            Self::LeaveParty => "leave-party",
            Self::YouJoinedParty { .. } => "you-joined-party",
            Self::YouLeftParty => "you-left-party",
            Self::PlayerJoinedParty { .. } => "player-joined-party",
            Self::PlayerLeftParty { .. } => "player-left-party",
            Self::StartGame { .. } => "start-game",
            Self::GameStarted { .. } => "game-started",
            Self::GameEnded => "game-ended",
            Self::EndGame => "end-game",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
