//! A single party and the view its game gets of it.

use oinky_game::{Game, PartyView};
use oinky_protocol::{Codec, JsonCodec, Packet, PartyData, PartyId, PlayerData, PlayerId};
use oinky_transport::Link;

/// A party member: public identity plus the link to reach them.
#[derive(Debug, Clone)]
pub struct Member {
    pub data: PlayerData,
    pub link: Link,
}

impl Member {
    pub fn new(data: PlayerData, link: Link) -> Self {
        Self { data, link }
    }

    pub fn id(&self) -> PlayerId {
        self.data.id
    }

    /// Queues a payload. A member whose queue overflows is disconnected
    /// by the link; the party learns about it through the coordinator.
    pub(crate) fn send(&self, payload: Vec<u8>) {
        if let Err(e) = self.link.send(payload) {
            tracing::debug!(player_id = %self.data.id, error = %e, "dropped packet");
        }
    }
}

pub(crate) struct RunningGame {
    pub(crate) name: &'static str,
    pub(crate) instance: Box<dyn Game>,
}

/// One lobby.
///
/// Members are kept in join order; games rely on it (the first member
/// moves first in the turn-based games).
pub struct Party {
    id: PartyId,
    name: String,
    pub(crate) members: Vec<Member>,
    pub(crate) game: Option<RunningGame>,
}

impl std::fmt::Debug for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Party")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("members", &self.members.len())
            .field("game", &self.game_name())
            .finish()
    }
}

impl Party {
    pub(crate) fn new(id: PartyId, name: String) -> Self {
        Self {
            id,
            name,
            members: Vec::new(),
            game: None,
        }
    }

    pub fn id(&self) -> PartyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Public identities of the members, in join order.
    pub fn members(&self) -> Vec<PlayerData> {
        self.members.iter().map(|m| m.data.clone()).collect()
    }

    /// Name of the running game, if any.
    pub fn game_name(&self) -> Option<&'static str> {
        self.game.as_ref().map(|game| game.name)
    }

    /// Listed and joinable only while idle and non-empty.
    pub fn is_joinable(&self) -> bool {
        self.game.is_none() && !self.members.is_empty()
    }

    /// Snapshot sent in `you-joined-party` and `list-parties`.
    pub fn data(&self) -> PartyData {
        PartyData {
            name: self.name.clone(),
            id: self.id,
            players: self.members(),
        }
    }

    pub(crate) fn member(&self, player: PlayerId) -> Option<&Member> {
        self.members.iter().find(|m| m.id() == player)
    }

    /// Encodes `packet` once and queues it for every member.
    pub(crate) fn broadcast(&self, codec: &JsonCodec, packet: &Packet) {
        match codec.encode(packet) {
            Ok(bytes) => {
                for member in &self.members {
                    member.send(bytes.clone());
                }
            }
            Err(e) => {
                tracing::error!(party_id = %self.id, kind = packet.kind(), error = %e, "encode failed");
            }
        }
    }

    /// Runs `hook` against the running game, then ends the game if the
    /// hook asked for it. Returns `None` if no game is running.
    pub(crate) fn with_game<R>(
        &mut self,
        codec: &JsonCodec,
        hook: impl FnOnce(&mut dyn Game, &mut PartyContext<'_>) -> R,
    ) -> Option<R> {
        let running = self.game.as_mut()?;
        let mut ctx = PartyContext::new(&self.members);
        let result = hook(running.instance.as_mut(), &mut ctx);
        if ctx.end_requested() {
            self.end_game(codec);
        }
        Some(result)
    }

    /// The single path every game ending takes. No-op when idle.
    ///
    /// Calls the game's end hook, drops the instance and broadcasts
    /// `game-ended`. Returns `true` if a game was actually ended.
    pub(crate) fn end_game(&mut self, codec: &JsonCodec) -> bool {
        let Some(mut running) = self.game.take() else {
            return false;
        };
        let mut ctx = PartyContext::new(&self.members);
        running.instance.on_end(&mut ctx);
        self.broadcast(codec, &Packet::GameEnded);
        tracing::info!(party_id = %self.id, game = running.name, "game ended");
        true
    }
}

/// The [`PartyView`] handed to game hooks.
///
/// Borrows only the member list, so the game itself can be borrowed
/// mutably at the same time.
pub(crate) struct PartyContext<'a> {
    members: &'a [Member],
    end_requested: bool,
}

impl<'a> PartyContext<'a> {
    pub(crate) fn new(members: &'a [Member]) -> Self {
        Self {
            members,
            end_requested: false,
        }
    }

    pub(crate) fn end_requested(&self) -> bool {
        self.end_requested
    }
}

impl PartyView for PartyContext<'_> {
    fn members(&self) -> Vec<PlayerData> {
        self.members.iter().map(|m| m.data.clone()).collect()
    }

    fn broadcast(&mut self, payload: Vec<u8>) {
        for member in self.members {
            member.send(payload.clone());
        }
    }

    fn send_to(&mut self, player: PlayerId, payload: Vec<u8>) {
        if let Some(member) = self.members.iter().find(|m| m.id() == player) {
            member.send(payload);
        }
    }

    fn end_game(&mut self) {
        self.end_requested = true;
    }
}
