//! Packet router: global packets against the lobby, the rest to games.
//!
//! The coordinator has already read the packet's tag. Global tags are
//! decoded into [`Packet`] and handled here; every other tag belongs to
//! the sender's running game and is forwarded untouched.

use oinky_minigames::GameKind;
use oinky_party::{Member, PartyError, PartyManager};
use oinky_protocol::{Codec, JsonCodec, Packet, PlayerId, ProtocolError};
use oinky_session::{PlayerRegistry, SessionError};

use crate::OinkyError;

/// The state the router works on. Owned by the coordinator.
#[derive(Debug, Default)]
pub(crate) struct ServerState {
    pub(crate) players: PlayerRegistry,
    pub(crate) parties: PartyManager,
    pub(crate) codec: JsonCodec,
}

impl ServerState {
    /// Encodes `packet` and queues it for one player.
    pub(crate) fn send(
        &self,
        player_id: PlayerId,
        packet: &Packet,
    ) -> Result<(), OinkyError> {
        let player = self
            .players
            .get(player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        player.send(self.codec.encode(packet)?)?;
        Ok(())
    }

    fn member(&self, player_id: PlayerId) -> Result<Member, OinkyError> {
        let player = self
            .players
            .get(player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        Ok(Member::new(player.data(), player.link().clone()))
    }
}

/// Handles one packet whose tag is `kind`.
///
/// Errors are the sender's problem only; the caller logs them.
pub(crate) fn handle_packet(
    state: &mut ServerState,
    sender: PlayerId,
    kind: &str,
    payload: &[u8],
) -> Result<(), OinkyError> {
    if !Packet::is_global_kind(kind) {
        state.parties.handle_game_packet(sender, payload)?;
        return Ok(());
    }

    let packet: Packet = state.codec.decode(payload)?;
    tracing::debug!(player_id = %sender, kind, "global packet");

    match packet {
        Packet::ChangeName { new_name } => change_name(state, sender, &new_name),
        Packet::CreateParty { name } => {
            let member = state.member(sender)?;
            state.parties.create_party(member, name)?;
            Ok(())
        }
        Packet::QueryParties => {
            let parties = state.parties.list_joinable();
            state.send(sender, &Packet::ListParties { parties })
        }
        Packet::JoinParty { id } => {
            let member = state.member(sender)?;
            state.parties.join_party(id, member)?;
            Ok(())
        }
        Packet::LeaveParty => {
            state
                .parties
                .remove_player(sender)
                .ok_or(PartyError::NotInParty(sender))?;
            Ok(())
        }
        Packet::StartGame { game_type } => {
            let game = GameKind::from_name(&game_type)
                .ok_or(OinkyError::UnknownGameType(game_type))?;
            let party_id = state
                .parties
                .party_of(sender)
                .ok_or(PartyError::NotInParty(sender))?;
            state.parties.start_game(party_id, &game)?;
            Ok(())
        }
        Packet::EndGame => {
            let party_id = state
                .parties
                .party_of(sender)
                .ok_or(PartyError::NotInParty(sender))?;
            let running = state
                .parties
                .party(party_id)
                .and_then(|party| party.game_name());
            if running.is_none() {
                return Err(PartyError::NoGameRunning(party_id).into());
            }
            state.parties.end_game(party_id)?;
            Ok(())
        }
        Packet::Welcome { .. }
        | Packet::ListParties { .. }
        | Packet::YouJoinedParty { .. }
        | Packet::YouLeftParty
        | Packet::PlayerJoinedParty { .. }
        | Packet::PlayerLeftParty { .. }
        | Packet::GameStarted { .. }
        | Packet::GameEnded => {
            Err(ProtocolError::UnexpectedPacket(kind.to_string()).into())
        }
    }
}

/// Renames a player who isn't in a party, then re-sends `welcome` so
/// the client learns the accepted name.
fn change_name(
    state: &mut ServerState,
    sender: PlayerId,
    new_name: &str,
) -> Result<(), OinkyError> {
    if state.parties.party_of(sender).is_some() {
        return Err(OinkyError::NameLocked(sender));
    }
    let player = state.players.rename(sender, new_name)?;
    let welcome = Packet::Welcome {
        your_id: player.id(),
        your_name: player.name().to_string(),
    };
    state.send(sender, &welcome)
}
