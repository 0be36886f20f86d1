//! Flappy oinky: every party member flies at once, last one alive wins.
//!
//! The world is the unit square with (0, 0) in the top left corner.
//! Positions name an entity's top left corner and speeds are added to
//! positions once per tick. The server decides who dies; a client learns
//! of a death when the player is missing from the next update.

use std::collections::BTreeMap;

use oinky_game::{Game, GameError, PartyView};
use oinky_protocol::{JsonCodec, PlayerId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const NAME: &str = "flappyoinky";

/// Width and height of an oinky.
pub const OINKY_SIZE: f64 = 0.06;
/// Fixed x position of every oinky.
pub const OINKY_POS_X: f64 = 0.5 - OINKY_SIZE / 2.0;
pub const OINKY_START_POS_Y: f64 = 0.5 - OINKY_SIZE / 2.0;
/// Added to an oinky's vertical speed every tick.
pub const OINKY_ACCELERATION_Y: f64 = 0.001;
/// Vertical speed right after a jump.
pub const OINKY_JUMP_SPEED_Y: f64 = -0.02;

/// Ticks between two obstacle spawns.
pub const OBSTACLE_SPAWN_RATE: u32 = 70;
pub const OBSTACLE_WIDTH: f64 = 0.06;
/// Height of the gap an oinky has to fly through.
pub const OBSTACLE_GAP_HEIGHT: f64 = 0.4;
/// Added to an obstacle's x position every tick.
pub const OBSTACLE_SPEED_X: f64 = -0.005;

pub const JUMP: &str = "oinky-bird-jump";
pub const UPDATE: &str = "oinky-bird-update";

/// Flappy oinky packets, both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "PacketName")]
pub enum FlappyPacket {
    /// Client to server: make my oinky jump.
    #[serde(rename = "oinky-bird-jump")]
    Jump,

    /// Server to clients, every tick.
    #[serde(rename = "oinky-bird-update", rename_all = "PascalCase")]
    Update {
        players: Vec<PlayerUpdate>,
        obstacles: Vec<ObstacleUpdate>,
        /// How many obstacles have spawned so far.
        obstacle_count: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerUpdate {
    pub player: PlayerId,
    pub position_y: f64,
    pub speed_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObstacleUpdate {
    /// Top edge of the obstacle's lower half.
    pub free_space_lower_y: f64,
    /// Bottom edge of the obstacle's upper half.
    pub free_space_upper_y: f64,
    pub pos_x: f64,
}

#[derive(Debug, Clone, Copy)]
struct Oinky {
    position_y: f64,
    speed_y: f64,
}

impl Oinky {
    fn tick(&mut self) {
        self.speed_y += OINKY_ACCELERATION_Y;
        self.position_y += self.speed_y;
    }

    fn is_outside_world(&self) -> bool {
        !(0.0..=1.0).contains(&self.position_y)
    }

    fn is_touching(&self, obstacles: &[Obstacle]) -> bool {
        obstacles.iter().any(|obstacle| {
            let overlaps_x = obstacle.pos_x < OINKY_POS_X + OINKY_SIZE
                && obstacle.pos_x + OBSTACLE_WIDTH > OINKY_POS_X;
            let inside_gap = self.position_y >= obstacle.free_space_upper_y
                && self.position_y + OINKY_SIZE <= obstacle.free_space_lower_y;
            overlaps_x && !inside_gap
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Obstacle {
    free_space_lower_y: f64,
    free_space_upper_y: f64,
    pos_x: f64,
}

impl Obstacle {
    fn spawn(rng: &mut impl Rng) -> Self {
        let mut lower_y: f64 = rng.random();
        if lower_y - OBSTACLE_GAP_HEIGHT < 0.0 {
            lower_y = 1.0 - OBSTACLE_GAP_HEIGHT;
        }
        Self {
            free_space_lower_y: lower_y,
            free_space_upper_y: lower_y - OBSTACLE_GAP_HEIGHT,
            pos_x: 1.0,
        }
    }

    fn is_outside_world(&self) -> bool {
        self.pos_x + OBSTACLE_WIDTH < 0.0
    }
}

/// A running flappy oinky game.
#[derive(Debug)]
pub struct FlappyGame {
    codec: JsonCodec,
    rng: StdRng,
    alive: BTreeMap<PlayerId, Oinky>,
    obstacles: Vec<Obstacle>,
    ticks_until_next_obstacle: u32,
    obstacle_count: u32,
}

impl FlappyGame {
    /// Creates a game with randomly placed obstacle gaps.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    /// Creates a game whose obstacle gaps follow `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            codec: JsonCodec,
            rng,
            alive: BTreeMap::new(),
            obstacles: Vec::new(),
            ticks_until_next_obstacle: OBSTACLE_SPAWN_RATE,
            obstacle_count: 0,
        }
    }

    /// Ids of the players still in the air.
    pub fn alive(&self) -> Vec<PlayerId> {
        self.alive.keys().copied().collect()
    }

    /// Moves every oinky and removes the dead ones.
    /// Returns `true` once nobody is left.
    fn tick_players(&mut self) -> bool {
        let obstacles = &self.obstacles;
        self.alive.retain(|id, oinky| {
            oinky.tick();
            let dead = oinky.is_outside_world() || oinky.is_touching(obstacles);
            if dead {
                tracing::debug!(player_id = %id, y = oinky.position_y, "oinky died");
            }
            !dead
        });
        self.alive.is_empty()
    }

    fn tick_obstacles(&mut self) {
        self.ticks_until_next_obstacle -= 1;
        if self.ticks_until_next_obstacle == 0 {
            self.ticks_until_next_obstacle = OBSTACLE_SPAWN_RATE;
            self.obstacle_count += 1;
            self.obstacles.push(Obstacle::spawn(&mut self.rng));
        }

        self.obstacles.retain(|obstacle| !obstacle.is_outside_world());
        for obstacle in &mut self.obstacles {
            obstacle.pos_x += OBSTACLE_SPEED_X;
        }
    }

    fn update_packet(&self) -> FlappyPacket {
        FlappyPacket::Update {
            players: self
                .alive
                .iter()
                .map(|(id, oinky)| PlayerUpdate {
                    player: *id,
                    position_y: oinky.position_y,
                    speed_y: oinky.speed_y,
                })
                .collect(),
            obstacles: self
                .obstacles
                .iter()
                .map(|obstacle| ObstacleUpdate {
                    free_space_lower_y: obstacle.free_space_lower_y,
                    free_space_upper_y: obstacle.free_space_upper_y,
                    pos_x: obstacle.pos_x,
                })
                .collect(),
            obstacle_count: self.obstacle_count,
        }
    }
}

impl Default for FlappyGame {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for FlappyGame {
    fn on_start(&mut self, party: &mut dyn PartyView) {
        for member in party.members() {
            self.alive.insert(
                member.id,
                Oinky {
                    position_y: OINKY_START_POS_Y,
                    speed_y: 0.0,
                },
            );
        }
    }

    fn on_player_left(&mut self, party: &mut dyn PartyView, player: PlayerId) {
        self.alive.remove(&player);
        if self.alive.is_empty() {
            party.end_game();
        }
    }

    fn on_packet(
        &mut self,
        _party: &mut dyn PartyView,
        sender: PlayerId,
        payload: &[u8],
    ) -> Result<(), GameError> {
        let packet: FlappyPacket =
            crate::decode_client(&self.codec, payload, &[JUMP])?;
        match packet {
            FlappyPacket::Jump => {
                let oinky = self
                    .alive
                    .get_mut(&sender)
                    .ok_or(GameError::NotAPlayer(sender))?;
                oinky.speed_y = OINKY_JUMP_SPEED_Y;
                Ok(())
            }
            FlappyPacket::Update { .. } => {
                Err(GameError::UnknownPacket(UPDATE.to_string()))
            }
        }
    }

    fn tick(&mut self, party: &mut dyn PartyView) {
        if self.tick_players() {
            party.end_game();
            return;
        }
        self.tick_obstacles();
        crate::broadcast(&self.codec, party, &self.update_packet());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingParty, payload};
    use serde_json::{Value, json};

    fn jump() -> Vec<u8> {
        payload(json!({ "PacketName": JUMP }))
    }

    fn listed_players(update: &Value) -> Vec<i64> {
        update["Players"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["Player"].as_i64().unwrap())
            .collect()
    }

    /// Runs `ticks` ticks. Player 2, if present, jumps every 39 ticks,
    /// which brings it back to its start height each time.
    fn run(game: &mut FlappyGame, party: &mut RecordingParty, ticks: usize) {
        for n in 0..ticks {
            if n % 39 == 0 && party.members.len() > 1 {
                game.on_packet(party, PlayerId(2), &jump()).unwrap();
            }
            game.tick(party);
        }
    }

    #[test]
    fn test_start_places_every_member() {
        let mut party = RecordingParty::new(3);
        let mut game = FlappyGame::seeded(1);
        game.on_start(&mut party);

        assert_eq!(game.alive(), vec![PlayerId(1), PlayerId(2), PlayerId(3)]);

        game.tick(&mut party);
        let update = &party.broadcasts[0];
        assert_eq!(update["PacketName"], UPDATE);
        assert_eq!(listed_players(update), vec![1, 2, 3]);
        assert_eq!(update["ObstacleCount"], 0);
        let y = update["Players"][0]["PositionY"].as_f64().unwrap();
        assert!((y - (OINKY_START_POS_Y + OINKY_ACCELERATION_Y)).abs() < 1e-12);
    }

    #[test]
    fn test_falling_player_is_removed_once_and_no_longer_listed() {
        let mut party = RecordingParty::new(2);
        let mut game = FlappyGame::seeded(1);
        game.on_start(&mut party);

        run(&mut game, &mut party, 40);

        // Without jumping, player 1 passes y = 1 on tick 33.
        assert!(listed_players(&party.broadcasts[31]).contains(&1));
        for update in &party.broadcasts[32..] {
            assert_eq!(listed_players(update), vec![2]);
        }
        assert_eq!(game.alive(), vec![PlayerId(2)]);
        assert!(!party.end_requested);
    }

    #[test]
    fn test_last_death_ends_game_without_update() {
        let mut party = RecordingParty::new(1);
        let mut game = FlappyGame::seeded(1);
        game.on_start(&mut party);

        run(&mut game, &mut party, 33);

        assert!(party.end_requested);
        assert_eq!(party.broadcasts.len(), 32);
    }

    #[test]
    fn test_jump_resets_speed() {
        let mut party = RecordingParty::new(1);
        let mut game = FlappyGame::seeded(1);
        game.on_start(&mut party);

        game.tick(&mut party);
        game.on_packet(&mut party, PlayerId(1), &jump()).unwrap();
        game.tick(&mut party);

        let speed = party.broadcasts[1]["Players"][0]["SpeedY"].as_f64().unwrap();
        assert!((speed - (OINKY_JUMP_SPEED_Y + OINKY_ACCELERATION_Y)).abs() < 1e-12);
    }

    #[test]
    fn test_speaks_the_oinky_bird_tags() {
        let mut party = RecordingParty::new(1);
        let mut game = FlappyGame::seeded(1);
        game.on_start(&mut party);

        let jump = payload(json!({ "PacketName": "oinky-bird-jump" }));
        game.on_packet(&mut party, PlayerId(1), &jump).unwrap();
        game.tick(&mut party);

        assert_eq!(party.broadcasts[0]["PacketName"], "oinky-bird-update");
    }

    #[test]
    fn test_obstacle_spawns_with_gap_after_spawn_rate() {
        let mut party = RecordingParty::new(2);
        let mut game = FlappyGame::seeded(7);
        game.on_start(&mut party);

        run(&mut game, &mut party, OBSTACLE_SPAWN_RATE as usize);

        let before = &party.broadcasts[OBSTACLE_SPAWN_RATE as usize - 2];
        assert_eq!(before["ObstacleCount"], 0);

        let update = party.broadcasts.last().unwrap();
        assert_eq!(update["ObstacleCount"], 1);
        let obstacle = &update["Obstacles"][0];
        let lower = obstacle["FreeSpaceLowerY"].as_f64().unwrap();
        let upper = obstacle["FreeSpaceUpperY"].as_f64().unwrap();
        let x = obstacle["PosX"].as_f64().unwrap();
        assert!(upper >= 0.0 && lower < 1.0);
        assert!((lower - upper - OBSTACLE_GAP_HEIGHT).abs() < 1e-12);
        assert!((x - (1.0 + OBSTACLE_SPEED_X)).abs() < 1e-12);
    }

    #[test]
    fn test_obstacle_outside_gap_kills() {
        let mut party = RecordingParty::new(1);
        let mut game = FlappyGame::seeded(1);
        game.on_start(&mut party);
        game.obstacles.push(Obstacle {
            free_space_lower_y: 0.4,
            free_space_upper_y: 0.0,
            pos_x: OINKY_POS_X,
        });

        game.tick(&mut party);
        assert!(party.end_requested);
    }

    #[test]
    fn test_obstacle_gap_lets_player_through() {
        let mut party = RecordingParty::new(1);
        let mut game = FlappyGame::seeded(1);
        game.on_start(&mut party);
        game.obstacles.push(Obstacle {
            free_space_lower_y: 0.8,
            free_space_upper_y: 0.4,
            pos_x: OINKY_POS_X,
        });

        game.tick(&mut party);
        assert!(!party.end_requested);
        assert_eq!(game.alive(), vec![PlayerId(1)]);
    }

    #[test]
    fn test_jump_from_dead_player_is_rejected() {
        let mut party = RecordingParty::new(2);
        let mut game = FlappyGame::seeded(1);
        game.on_start(&mut party);
        game.on_player_left(&mut party, PlayerId(1));

        let err = game.on_packet(&mut party, PlayerId(1), &jump()).unwrap_err();
        assert!(matches!(err, GameError::NotAPlayer(PlayerId(1))));
    }

    #[test]
    fn test_client_cannot_send_update() {
        let mut party = RecordingParty::new(1);
        let mut game = FlappyGame::seeded(1);
        game.on_start(&mut party);

        let forged = payload(json!({
            "PacketName": UPDATE,
            "Players": [],
            "Obstacles": [],
            "ObstacleCount": 0,
        }));
        let err = game.on_packet(&mut party, PlayerId(1), &forged).unwrap_err();
        assert!(matches!(err, GameError::UnknownPacket(_)));
    }

    #[test]
    fn test_last_player_leaving_ends_game() {
        let mut party = RecordingParty::new(2);
        let mut game = FlappyGame::seeded(1);
        game.on_start(&mut party);

        game.on_player_left(&mut party, PlayerId(1));
        assert!(!party.end_requested);
        game.on_player_left(&mut party, PlayerId(2));
        assert!(party.end_requested);
    }

    #[test]
    fn test_update_positions_survive_the_codec_exactly() {
        use oinky_protocol::Codec;

        let codec = JsonCodec;
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let packet = FlappyPacket::Update {
                players: vec![PlayerUpdate {
                    player: PlayerId(rng.random_range(0..=i32::MAX)),
                    position_y: rng.random(),
                    speed_y: rng.random::<f64>() - 0.5,
                }],
                obstacles: vec![ObstacleUpdate {
                    free_space_lower_y: rng.random(),
                    free_space_upper_y: rng.random(),
                    pos_x: rng.random(),
                }],
                obstacle_count: rng.random(),
            };
            let bytes = codec.encode(&packet).unwrap();
            let decoded: FlappyPacket = codec.decode(&bytes).unwrap();
            assert_eq!(decoded, packet);
        }

        let jump = codec.encode(&FlappyPacket::Jump).unwrap();
        assert_eq!(jump, br#"{"PacketName":"oinky-bird-jump"}"#);
    }
}
