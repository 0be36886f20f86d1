//! The `Game` and `GameType` traits: the extension point for minigames.
//!
//! The party manager calls these hooks at the right time; a game only
//! writes its rules.

use oinky_protocol::{PlayerData, PlayerId};

use crate::GameError;

/// What a running game may see of, and do to, its party.
///
/// Implemented by the party manager. Games get a fresh `&mut dyn
/// PartyView` on every hook call and must not hold on to it.
pub trait PartyView {
    /// Current members, in the order they joined.
    fn members(&self) -> Vec<PlayerData>;

    /// Queues `payload` for every member.
    fn broadcast(&mut self, payload: Vec<u8>);

    /// Queues `payload` for one member. Unknown ids are ignored.
    fn send_to(&mut self, player: PlayerId, payload: Vec<u8>);

    /// Asks for the game to end.
    ///
    /// Takes effect once the current hook returns: the party runs its
    /// end funnel, which calls [`Game::on_end`] and broadcasts
    /// `game-ended`. Calling it more than once is harmless.
    fn end_game(&mut self);
}

/// One running minigame, owned by the party that started it.
///
/// All hooks run on the coordinator's loop, one at a time. `on_start`
/// is called exactly once before anything else, and `on_end` exactly
/// once after which the instance is dropped.
pub trait Game: Send {
    /// Called right after the instance is stored in the party.
    fn on_start(&mut self, _party: &mut dyn PartyView) {}

    /// Called once when the game ends, for any reason.
    fn on_end(&mut self, _party: &mut dyn PartyView) {}

    /// Called before `player` is removed from the party.
    ///
    /// `party.members()` still includes the leaving player.
    fn on_player_left(&mut self, party: &mut dyn PartyView, player: PlayerId);

    /// Handles one game packet from `sender`.
    ///
    /// `payload` is the raw packet body, tag included. Returning an error
    /// leaves the game untouched; the caller only logs it.
    fn on_packet(
        &mut self,
        party: &mut dyn PartyView,
        sender: PlayerId,
        payload: &[u8],
    ) -> Result<(), GameError>;

    /// Advances the game by one server tick. Default: no-op.
    fn tick(&mut self, _party: &mut dyn PartyView) {}
}

/// A named game factory.
pub trait GameType {
    /// The name clients use in `start-game`.
    fn name(&self) -> &'static str;

    /// Creates an instance for `party`, or `None` if the party can't
    /// play this game (for example, the wrong number of members).
    fn create(&self, party: &dyn PartyView) -> Option<Box<dyn Game>>;
}
