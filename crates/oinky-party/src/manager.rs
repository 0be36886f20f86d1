//! Party manager: creates parties, tracks membership, hosts games.

use std::collections::HashMap;

use oinky_game::GameType;
use oinky_protocol::{Codec, JsonCodec, Packet, PartyData, PartyId, PlayerId};
use rand::Rng;

use crate::party::{Party, PartyContext, RunningGame};
use crate::{Member, PartyError};

/// Owns every party and the player → party index.
///
/// All operations are synchronous: the manager lives on the
/// coordinator's loop, and sending only enqueues onto bounded queues.
#[derive(Debug, Default)]
pub struct PartyManager {
    /// Active parties, keyed by party ID.
    parties: HashMap<PartyId, Party>,

    /// Maps each player to the party they're currently in.
    /// A player can be in at most ONE party at a time (key invariant).
    player_parties: HashMap<PlayerId, PartyId>,

    codec: JsonCodec,
}

impl PartyManager {
    /// Creates a new, empty party manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a party with `owner` as its only member.
    ///
    /// # Errors
    /// [`PartyError::AlreadyInParty`] if `owner` is in a party.
    pub fn create_party(
        &mut self,
        owner: Member,
        name: String,
    ) -> Result<PartyId, PartyError> {
        if let Some(current) = self.party_of(owner.id()) {
            return Err(PartyError::AlreadyInParty(owner.id(), current));
        }

        let mut rng = rand::rng();
        let party_id = loop {
            let candidate = PartyId(rng.random_range(0..=i32::MAX));
            if !self.parties.contains_key(&candidate) {
                break candidate;
            }
        };

        tracing::info!(%party_id, %name, owner = %owner.id(), "party created");
        self.parties.insert(party_id, Party::new(party_id, name));
        self.add_member(party_id, owner);
        Ok(party_id)
    }

    /// Adds a player to an idle party.
    ///
    /// # Errors
    /// - [`PartyError::AlreadyInParty`] if the player is in a party.
    /// - [`PartyError::NotFound`] if the party doesn't exist.
    /// - [`PartyError::GameRunning`] if the party is playing.
    pub fn join_party(
        &mut self,
        party_id: PartyId,
        member: Member,
    ) -> Result<(), PartyError> {
        if let Some(current) = self.party_of(member.id()) {
            return Err(PartyError::AlreadyInParty(member.id(), current));
        }
        let party = self
            .parties
            .get(&party_id)
            .ok_or(PartyError::NotFound(party_id))?;
        if party.game.is_some() {
            return Err(PartyError::GameRunning(party_id));
        }

        self.add_member(party_id, member);
        Ok(())
    }

    /// Existing members hear about the newcomer first (from a view that
    /// doesn't include them yet), then the newcomer gets the full
    /// snapshot, themselves included.
    fn add_member(&mut self, party_id: PartyId, member: Member) {
        let Some(party) = self.parties.get_mut(&party_id) else {
            return;
        };

        party.broadcast(
            &self.codec,
            &Packet::PlayerJoinedParty {
                player: member.data.clone(),
            },
        );

        let player_id = member.id();
        party.members.push(member);
        self.player_parties.insert(player_id, party_id);

        let snapshot = Packet::YouJoinedParty { party: party.data() };
        if let Some(joined) = party.member(player_id) {
            send_packet(&self.codec, joined, &snapshot);
        }
        tracing::info!(%party_id, %player_id, "player joined party");
    }

    /// Removes a player from their party, if they are in one.
    ///
    /// A running game is told first (`members()` still includes the
    /// player at that point) and may end itself. Then the remaining
    /// members get `player-left-party` and the player gets
    /// `you-left-party`. A party left empty is dropped, ending its game.
    ///
    /// Returns the party the player left. Calling it again for the same
    /// player returns `None`, so duplicate disconnects are harmless.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<PartyId> {
        let party_id = self.player_parties.remove(&player_id)?;
        let party = self.parties.get_mut(&party_id)?;

        party.with_game(&self.codec, |game, ctx| {
            game.on_player_left(ctx, player_id);
        });

        let index = party.members.iter().position(|m| m.id() == player_id)?;
        let leaving = party.members.remove(index);

        party.broadcast(&self.codec, &Packet::PlayerLeftParty { id: player_id });
        send_packet(&self.codec, &leaving, &Packet::YouLeftParty);
        tracing::info!(%party_id, %player_id, "player left party");

        if party.members.is_empty() {
            party.end_game(&self.codec);
            self.parties.remove(&party_id);
            tracing::info!(%party_id, "party dropped");
        }
        Some(party_id)
    }

    /// Starts a game of `game_type` in an idle party.
    ///
    /// # Errors
    /// - [`PartyError::NotFound`] if the party doesn't exist.
    /// - [`PartyError::GameRunning`] if a game is already running.
    /// - [`PartyError::GameRefused`] if the factory declines the party.
    pub fn start_game(
        &mut self,
        party_id: PartyId,
        game_type: &dyn GameType,
    ) -> Result<(), PartyError> {
        let party = self
            .parties
            .get_mut(&party_id)
            .ok_or(PartyError::NotFound(party_id))?;
        if party.game.is_some() {
            return Err(PartyError::GameRunning(party_id));
        }

        let name = game_type.name();
        let mut ctx = PartyContext::new(&party.members);
        let mut instance = game_type
            .create(&ctx)
            .ok_or(PartyError::GameRefused(name))?;
        instance.on_start(&mut ctx);
        let end_requested = ctx.end_requested();

        party.game = Some(RunningGame { name, instance });
        party.broadcast(
            &self.codec,
            &Packet::GameStarted {
                game_type: name.to_string(),
            },
        );
        tracing::info!(%party_id, game = name, "game started");

        if end_requested {
            party.end_game(&self.codec);
        }
        Ok(())
    }

    /// Ends the party's game. Does nothing if no game is running.
    ///
    /// # Errors
    /// [`PartyError::NotFound`] if the party doesn't exist.
    pub fn end_game(&mut self, party_id: PartyId) -> Result<(), PartyError> {
        let party = self
            .parties
            .get_mut(&party_id)
            .ok_or(PartyError::NotFound(party_id))?;
        party.end_game(&self.codec);
        Ok(())
    }

    /// Forwards a game packet from `sender` to their party's game.
    ///
    /// # Errors
    /// - [`PartyError::NotInParty`] if the sender isn't in a party.
    /// - [`PartyError::NoGameRunning`] if their party is idle.
    /// - [`PartyError::Game`] if the game rejected the packet.
    pub fn handle_game_packet(
        &mut self,
        sender: PlayerId,
        payload: &[u8],
    ) -> Result<(), PartyError> {
        let party_id = self
            .party_of(sender)
            .ok_or(PartyError::NotInParty(sender))?;
        let party = self
            .parties
            .get_mut(&party_id)
            .ok_or(PartyError::NotFound(party_id))?;

        party
            .with_game(&self.codec, |game, ctx| {
                game.on_packet(ctx, sender, payload)
            })
            .ok_or(PartyError::NoGameRunning(party_id))??;
        Ok(())
    }

    /// Advances every running game by one tick.
    pub fn tick_all(&mut self) {
        for party in self.parties.values_mut() {
            party.with_game(&self.codec, |game, ctx| game.tick(ctx));
        }
    }

    /// Summaries of every party a player could join right now.
    pub fn list_joinable(&self) -> Vec<PartyData> {
        self.parties
            .values()
            .filter(|party| party.is_joinable())
            .map(Party::data)
            .collect()
    }

    /// Returns the party a player is currently in, if any.
    pub fn party_of(&self, player_id: PlayerId) -> Option<PartyId> {
        self.player_parties.get(&player_id).copied()
    }

    pub fn party(&self, party_id: PartyId) -> Option<&Party> {
        self.parties.get(&party_id)
    }

    /// Number of live parties.
    pub fn party_count(&self) -> usize {
        self.parties.len()
    }
}

fn send_packet(codec: &JsonCodec, member: &Member, packet: &Packet) {
    match codec.encode(packet) {
        Ok(bytes) => member.send(bytes),
        Err(e) => tracing::error!(kind = packet.kind(), error = %e, "encode failed"),
    }
}
