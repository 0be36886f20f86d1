//! Battleship for exactly two players.
//!
//! Setup phase: each player privately submits a fleet. Combat phase
//! (once both fleets are in): players take turns firing at each other's
//! grid. A hit earns another shot; sinking the last ship cell ends the
//! game on the spot.

use std::collections::{BTreeMap, HashSet};

use oinky_game::{Game, GameError, PartyView};
use oinky_protocol::{Codec, JsonCodec, PlayerData, PlayerId};
use serde::{Deserialize, Serialize};

pub const NAME: &str = "schiffe_versenken";

pub const BOARD_WIDTH: i32 = 10;
pub const BOARD_HEIGHT: i32 = 10;

pub const SETUP_SHIPS: &str = "schiffe-versenken-setup-ships";
pub const FIRE: &str = "schiffe-versenken-fire";
pub const GAME_STARTED: &str = "schiffe-versenken-game-started";
pub const FIRE_RESULT: &str = "schiffe-versenken-fire-result";
pub const OPPONENT_FIRED: &str = "schiffe-versenken-ship-destroyed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "PacketName")]
pub enum BattleshipPacket {
    #[serde(rename = "schiffe-versenken-setup-ships", rename_all = "PascalCase")]
    SetupShips { ships: Vec<Ship> },

    #[serde(rename = "schiffe-versenken-fire", rename_all = "PascalCase")]
    Fire { position: Position },

    /// Broadcast once both fleets are placed.
    #[serde(rename = "schiffe-versenken-game-started")]
    GameStarted,

    /// To the shooter only.
    #[serde(rename = "schiffe-versenken-fire-result", rename_all = "PascalCase")]
    FireResult { position: Position, hit: bool },

    /// To the target only. Reveals the cell, nothing else.
    #[serde(rename = "schiffe-versenken-ship-destroyed", rename_all = "PascalCase")]
    OpponentFired { position: Position },
}

impl BattleshipPacket {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetupShips { .. } => SETUP_SHIPS,
            Self::Fire { .. } => FIRE,
            Self::GameStarted => GAME_STARTED,
            Self::FireResult { .. } => FIRE_RESULT,
            Self::OpponentFired { .. } => OPPONENT_FIRED,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "PascalCase")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(&self) -> bool {
        (0..BOARD_WIDTH).contains(&self.x) && (0..BOARD_HEIGHT).contains(&self.y)
    }

    /// The cell itself and its eight neighbors.
    fn surroundings(self) -> impl Iterator<Item = Position> {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).map(move |dy| Position::new(self.x + dx, self.y + dy))
        })
    }
}

/// The cells of one ship, in any order.
pub type Ship = Vec<Position>;

/// Required number of ships per ship length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fleet(BTreeMap<usize, usize>);

impl Fleet {
    pub fn new(counts: impl IntoIterator<Item = (usize, usize)>) -> Self {
        Self(counts.into_iter().filter(|(_, count)| *count > 0).collect())
    }

    /// Checks a submitted layout against this fleet.
    ///
    /// # Errors
    /// [`GameError::InvalidLayout`] if the ship lengths don't match the
    /// fleet exactly, a ship is off the grid, bent or broken, or two
    /// ships touch (diagonally included).
    pub fn validate(&self, ships: &[Ship]) -> Result<(), GameError> {
        let mut lengths: BTreeMap<usize, usize> = BTreeMap::new();
        for ship in ships {
            *lengths.entry(ship.len()).or_default() += 1;
        }
        if lengths != self.0 {
            return Err(GameError::InvalidLayout("wrong set of ships"));
        }

        for ship in ships {
            if !ship.iter().all(Position::in_bounds) {
                return Err(GameError::InvalidLayout("ship outside the grid"));
            }
            if !is_straight_line(ship) {
                return Err(GameError::InvalidLayout("ship is not a straight line"));
            }
        }

        for (i, ship) in ships.iter().enumerate() {
            let blocked: HashSet<Position> =
                ship.iter().flat_map(|cell| cell.surroundings()).collect();
            let touches = ships
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .any(|(_, other)| other.iter().any(|cell| blocked.contains(cell)));
            if touches {
                return Err(GameError::InvalidLayout("ships touch"));
            }
        }
        Ok(())
    }
}

impl Default for Fleet {
    /// One single-cell ship and two ships of length two.
    fn default() -> Self {
        Self::new([(1, 1), (2, 2)])
    }
}

/// Whether the cells form one horizontal or vertical run without gaps.
fn is_straight_line(ship: &[Position]) -> bool {
    let Some(first) = ship.first() else {
        return false;
    };
    if ship.iter().all(|cell| cell.x == first.x) {
        is_contiguous(ship.iter().map(|cell| cell.y).collect())
    } else if ship.iter().all(|cell| cell.y == first.y) {
        is_contiguous(ship.iter().map(|cell| cell.x).collect())
    } else {
        false
    }
}

fn is_contiguous(mut values: Vec<i32>) -> bool {
    values.sort_unstable();
    values.windows(2).all(|pair| pair[0] + 1 == pair[1])
}

#[derive(Debug)]
struct Side {
    id: PlayerId,
    /// Cells of ships not yet hit. `None` until the fleet is submitted.
    ships: Option<HashSet<Position>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Setup,
    Combat,
}

/// A running game of battleship.
#[derive(Debug)]
pub struct BattleshipGame {
    codec: JsonCodec,
    fleet: Fleet,
    sides: [Side; 2],
    phase: Phase,
    /// Index into `sides` of the player allowed to fire.
    current: usize,
}

impl BattleshipGame {
    /// Creates a game with the default fleet for exactly two members.
    pub fn new(members: &[PlayerData]) -> Option<Self> {
        Self::with_fleet(members, Fleet::default())
    }

    /// Creates a game with a custom fleet for exactly two members.
    pub fn with_fleet(members: &[PlayerData], fleet: Fleet) -> Option<Self> {
        let [first, second] = members else {
            return None;
        };
        Some(Self {
            codec: JsonCodec,
            fleet,
            sides: [
                Side { id: first.id, ships: None },
                Side { id: second.id, ships: None },
            ],
            phase: Phase::Setup,
            current: 0,
        })
    }

    /// Whether both fleets are placed and firing has begun.
    pub fn in_combat(&self) -> bool {
        self.phase == Phase::Combat
    }

    fn side_of(&self, player: PlayerId) -> Result<usize, GameError> {
        self.sides
            .iter()
            .position(|side| side.id == player)
            .ok_or(GameError::NotAPlayer(player))
    }

    fn setup_ships(
        &mut self,
        party: &mut dyn PartyView,
        me: usize,
        ships: Vec<Ship>,
    ) -> Result<(), GameError> {
        if self.sides[me].ships.is_some() {
            return Err(GameError::AlreadySubmitted);
        }
        self.fleet.validate(&ships)?;

        self.sides[me].ships = Some(ships.into_iter().flatten().collect());
        tracing::debug!(player_id = %self.sides[me].id, "fleet placed");

        if self.sides.iter().all(|side| side.ships.is_some()) {
            self.phase = Phase::Combat;
            crate::broadcast(&self.codec, party, &BattleshipPacket::GameStarted);
        }
        Ok(())
    }

    fn fire(
        &mut self,
        party: &mut dyn PartyView,
        me: usize,
        position: Position,
    ) -> Result<(), GameError> {
        if self.phase != Phase::Combat {
            return Err(GameError::WrongPhase);
        }
        if me != self.current {
            return Err(GameError::NotYourTurn);
        }
        if !position.in_bounds() {
            return Err(GameError::OutOfRange);
        }

        let opponent = 1 - me;
        let Some(target) = self.sides[opponent].ships.as_mut() else {
            return Err(GameError::WrongPhase);
        };
        let hit = target.remove(&position);

        if hit && target.is_empty() {
            tracing::info!(winner = %self.sides[me].id, "fleet sunk");
            party.end_game();
            return Ok(());
        }

        let result = self
            .codec
            .encode(&BattleshipPacket::FireResult { position, hit })?;
        let notice = self
            .codec
            .encode(&BattleshipPacket::OpponentFired { position })?;
        party.send_to(self.sides[me].id, result);
        party.send_to(self.sides[opponent].id, notice);

        if !hit {
            self.current = opponent;
        }
        Ok(())
    }
}

impl Game for BattleshipGame {
    fn on_player_left(&mut self, party: &mut dyn PartyView, _player: PlayerId) {
        party.end_game();
    }

    fn on_packet(
        &mut self,
        party: &mut dyn PartyView,
        sender: PlayerId,
        payload: &[u8],
    ) -> Result<(), GameError> {
        let packet: BattleshipPacket =
            crate::decode_client(&self.codec, payload, &[SETUP_SHIPS, FIRE])?;
        let me = self.side_of(sender)?;
        match packet {
            BattleshipPacket::SetupShips { ships } => {
                self.setup_ships(party, me, ships)
            }
            BattleshipPacket::Fire { position } => self.fire(party, me, position),
            other => Err(GameError::UnknownPacket(other.kind().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingParty, payload};
    use serde_json::{Value, json};

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);

    fn ship(cells: &[(i32, i32)]) -> Ship {
        cells.iter().map(|(x, y)| Position::new(*x, *y)).collect()
    }

    fn valid_layout() -> Vec<Ship> {
        vec![
            ship(&[(0, 0)]),
            ship(&[(2, 0), (3, 0)]),
            ship(&[(5, 5), (5, 6)]),
        ]
    }

    fn setup_packet(ships: &[Ship]) -> Vec<u8> {
        payload(json!({ "PacketName": SETUP_SHIPS, "Ships": ships }))
    }

    fn fire_packet(x: i32, y: i32) -> Vec<u8> {
        payload(json!({ "PacketName": FIRE, "Position": { "X": x, "Y": y } }))
    }

    fn in_combat() -> (BattleshipGame, RecordingParty) {
        let mut party = RecordingParty::new(2);
        let mut game = BattleshipGame::new(&party.members).unwrap();
        game.on_start(&mut party);
        let layout = setup_packet(&valid_layout());
        game.on_packet(&mut party, P1, &layout).unwrap();
        game.on_packet(&mut party, P2, &layout).unwrap();
        (game, party)
    }

    fn fire_result(value: &Value) -> (i64, i64, bool) {
        assert_eq!(value["PacketName"], FIRE_RESULT);
        (
            value["Position"]["X"].as_i64().unwrap(),
            value["Position"]["Y"].as_i64().unwrap(),
            value["Hit"].as_bool().unwrap(),
        )
    }

    // -- layout validation ------------------------------------------------

    #[test]
    fn test_exact_fleet_without_touching_is_accepted() {
        assert!(Fleet::default().validate(&valid_layout()).is_ok());
    }

    #[test]
    fn test_diagonally_touching_ships_are_rejected() {
        let layout = vec![
            ship(&[(0, 0)]),
            ship(&[(2, 2), (3, 2)]),
            ship(&[(4, 3), (5, 3)]),
        ];
        assert!(matches!(
            Fleet::default().validate(&layout),
            Err(GameError::InvalidLayout("ships touch"))
        ));
    }

    #[test]
    fn test_overlapping_ships_are_rejected() {
        let layout = vec![
            ship(&[(0, 0)]),
            ship(&[(2, 2), (3, 2)]),
            ship(&[(3, 2), (4, 2)]),
        ];
        assert!(Fleet::default().validate(&layout).is_err());
    }

    #[test]
    fn test_wrong_ship_lengths_are_rejected() {
        let too_many_singles = vec![
            ship(&[(0, 0)]),
            ship(&[(2, 0)]),
            ship(&[(5, 5), (5, 6)]),
        ];
        let missing_ship = vec![ship(&[(0, 0)]), ship(&[(2, 0), (3, 0)])];
        for layout in [too_many_singles, missing_ship] {
            assert!(matches!(
                Fleet::default().validate(&layout),
                Err(GameError::InvalidLayout("wrong set of ships"))
            ));
        }
    }

    #[test]
    fn test_bent_broken_and_off_grid_ships_are_rejected() {
        let bent = ship(&[(5, 5), (6, 6)]);
        let broken = ship(&[(5, 5), (7, 5)]);
        let doubled = ship(&[(5, 5), (5, 5)]);
        let off_grid = ship(&[(9, 9), (10, 9)]);
        for bad in [bent, broken, doubled, off_grid] {
            let layout = vec![ship(&[(0, 0)]), ship(&[(2, 0), (3, 0)]), bad];
            assert!(Fleet::default().validate(&layout).is_err());
        }
    }

    #[test]
    fn test_custom_fleet() {
        let fleet = Fleet::new([(3, 1)]);
        assert!(fleet.validate(&[ship(&[(4, 2), (4, 3), (4, 1)])]).is_ok());
        assert!(fleet.validate(&valid_layout()).is_err());
    }

    // -- setup phase ------------------------------------------------------

    #[test]
    fn test_game_starts_once_both_fleets_are_placed() {
        let mut party = RecordingParty::new(2);
        let mut game = BattleshipGame::new(&party.members).unwrap();
        let layout = setup_packet(&valid_layout());

        game.on_packet(&mut party, P1, &layout).unwrap();
        assert!(!game.in_combat());
        assert!(party.broadcasts.is_empty());

        game.on_packet(&mut party, P2, &layout).unwrap();
        assert!(game.in_combat());
        assert_eq!(party.broadcasts, vec![json!({ "PacketName": GAME_STARTED })]);
    }

    #[test]
    fn test_second_submission_is_rejected() {
        let mut party = RecordingParty::new(2);
        let mut game = BattleshipGame::new(&party.members).unwrap();
        let layout = setup_packet(&valid_layout());

        game.on_packet(&mut party, P1, &layout).unwrap();
        let err = game.on_packet(&mut party, P1, &layout).unwrap_err();
        assert!(matches!(err, GameError::AlreadySubmitted));
    }

    #[test]
    fn test_invalid_submission_can_be_retried() {
        let mut party = RecordingParty::new(2);
        let mut game = BattleshipGame::new(&party.members).unwrap();

        let bad = setup_packet(&[ship(&[(0, 0)])]);
        assert!(game.on_packet(&mut party, P1, &bad).is_err());
        game.on_packet(&mut party, P1, &setup_packet(&valid_layout()))
            .unwrap();
    }

    #[test]
    fn test_fire_during_setup_is_rejected() {
        let mut party = RecordingParty::new(2);
        let mut game = BattleshipGame::new(&party.members).unwrap();

        let err = game.on_packet(&mut party, P1, &fire_packet(0, 0)).unwrap_err();
        assert!(matches!(err, GameError::WrongPhase));
    }

    // -- combat phase -----------------------------------------------------

    #[test]
    fn test_first_member_fires_first() {
        let (mut game, mut party) = in_combat();

        let err = game.on_packet(&mut party, P2, &fire_packet(0, 0)).unwrap_err();
        assert!(matches!(err, GameError::NotYourTurn));
    }

    #[test]
    fn test_out_of_range_fire_is_rejected() {
        let (mut game, mut party) = in_combat();

        let err = game.on_packet(&mut party, P1, &fire_packet(10, 0)).unwrap_err();
        assert!(matches!(err, GameError::OutOfRange));
        assert!(party.sent.is_empty());
    }

    #[test]
    fn test_miss_passes_turn_and_notifies_both_privately() {
        let (mut game, mut party) = in_combat();

        game.on_packet(&mut party, P1, &fire_packet(9, 9)).unwrap();

        let to_p1 = party.take_sent_to(P1);
        let to_p2 = party.take_sent_to(P2);
        assert_eq!(to_p1.len(), 1);
        assert_eq!(fire_result(&to_p1[0]), (9, 9, false));
        assert_eq!(
            to_p2,
            vec![json!({ "PacketName": OPPONENT_FIRED, "Position": { "X": 9, "Y": 9 } })]
        );

        let err = game.on_packet(&mut party, P1, &fire_packet(8, 8)).unwrap_err();
        assert!(matches!(err, GameError::NotYourTurn));
        game.on_packet(&mut party, P2, &fire_packet(8, 8)).unwrap();
    }

    #[test]
    fn test_hit_keeps_turn_and_repeat_hit_is_a_miss() {
        let (mut game, mut party) = in_combat();

        game.on_packet(&mut party, P1, &fire_packet(2, 0)).unwrap();
        assert_eq!(fire_result(&party.take_sent_to(P1)[0]), (2, 0, true));

        game.on_packet(&mut party, P1, &fire_packet(2, 0)).unwrap();
        assert_eq!(fire_result(&party.take_sent_to(P1)[0]), (2, 0, false));

        let err = game.on_packet(&mut party, P1, &fire_packet(3, 0)).unwrap_err();
        assert!(matches!(err, GameError::NotYourTurn));
    }

    #[test]
    fn test_sinking_the_last_cell_ends_game_without_result() {
        let (mut game, mut party) = in_combat();
        let cells = [(0, 0), (2, 0), (3, 0), (5, 5), (5, 6)];

        for (x, y) in &cells[..4] {
            game.on_packet(&mut party, P1, &fire_packet(*x, *y)).unwrap();
        }
        assert!(!party.end_requested);
        party.sent.clear();

        game.on_packet(&mut party, P1, &fire_packet(5, 6)).unwrap();
        assert!(party.end_requested);
        assert!(party.sent.is_empty());
    }

    #[test]
    fn test_player_leaving_ends_game_in_either_phase() {
        let mut party = RecordingParty::new(2);
        let mut game = BattleshipGame::new(&party.members).unwrap();
        game.on_player_left(&mut party, P2);
        assert!(party.end_requested);

        let (mut game, mut party) = in_combat();
        game.on_player_left(&mut party, P1);
        assert!(party.end_requested);
    }

    #[test]
    fn test_server_packets_from_client_are_rejected() {
        let (mut game, mut party) = in_combat();

        let forged = payload(json!({ "PacketName": GAME_STARTED }));
        let err = game.on_packet(&mut party, P1, &forged).unwrap_err();
        assert!(matches!(err, GameError::UnknownPacket(_)));
    }

    #[test]
    fn test_packets_survive_the_codec() {
        let codec = JsonCodec;
        let packets = [
            BattleshipPacket::SetupShips { ships: valid_layout() },
            BattleshipPacket::Fire { position: Position::new(9, 0) },
            BattleshipPacket::GameStarted,
            BattleshipPacket::FireResult { position: Position::new(3, 4), hit: true },
            BattleshipPacket::OpponentFired { position: Position::new(0, 9) },
        ];
        for packet in packets {
            let bytes = codec.encode(&packet).unwrap();
            assert_eq!(codec.peek_kind(&bytes).unwrap(), packet.kind());
            let decoded: BattleshipPacket = codec.decode(&bytes).unwrap();
            assert_eq!(decoded, packet);
        }

        let notice = codec
            .encode(&BattleshipPacket::OpponentFired { position: Position::new(1, 2) })
            .unwrap();
        assert_eq!(
            notice,
            br#"{"PacketName":"schiffe-versenken-ship-destroyed","Position":{"X":1,"Y":2}}"#
        );
    }
}
