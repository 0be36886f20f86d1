//! Connect four for exactly two players.

use oinky_game::{Game, GameError, PartyView};
use oinky_protocol::{JsonCodec, PlayerData, PlayerId};
use serde::{Deserialize, Serialize};

pub const NAME: &str = "connect4";

pub const BOARD_WIDTH: usize = 7;
pub const BOARD_HEIGHT: usize = 6;

/// Same-colored cells in a row needed to win.
const RUN_TO_WIN: usize = 4;

pub const PLACE: &str = "connect-4-player-place";
pub const PLACED: &str = "connect-4-player-placed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "PacketName")]
pub enum ConnectFourPacket {
    /// Client to server: drop a piece into column `x`.
    #[serde(rename = "connect-4-player-place", rename_all = "PascalCase")]
    Place { x: i32 },

    /// Server to clients: `player` dropped a piece into column `x`.
    #[serde(rename = "connect-4-player-placed", rename_all = "PascalCase")]
    Placed { player: Color, x: i32 },
}

/// Piece color. The first party member plays red and moves first.
///
/// On the wire a color is a bool: `true` for red, `false` for yellow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum Color {
    Red,
    Yellow,
}

impl From<bool> for Color {
    fn from(red: bool) -> Self {
        if red { Self::Red } else { Self::Yellow }
    }
}

impl From<Color> for bool {
    fn from(color: Color) -> Self {
        color == Color::Red
    }
}

impl Color {
    fn other(self) -> Self {
        match self {
            Self::Red => Self::Yellow,
            Self::Yellow => Self::Red,
        }
    }
}

/// The grid, indexed `[x][y]` with `y = 0` the top row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Color>; BOARD_HEIGHT]; BOARD_WIDTH],
}

impl Board {
    pub fn cell(&self, x: usize, y: usize) -> Option<Color> {
        self.cells[x][y]
    }

    fn is_column_full(&self, x: usize) -> bool {
        self.cells[x][0].is_some()
    }

    fn is_full(&self) -> bool {
        (0..BOARD_WIDTH).all(|x| self.is_column_full(x))
    }

    /// Drops a piece to the lowest empty cell of column `x`.
    fn drop_piece(&mut self, x: usize, color: Color) {
        if let Some(cell) = self.cells[x].iter_mut().rev().find(|c| c.is_none()) {
            *cell = Some(color);
        }
    }

    /// Scans every row and column for a run of four.
    fn winner(&self) -> Option<Color> {
        let rows = (0..BOARD_HEIGHT)
            .map(|y| (0..BOARD_WIDTH).map(|x| self.cells[x][y]).collect::<Vec<_>>());
        let columns = self.cells.iter().map(|column| column.to_vec());
        rows.chain(columns).find_map(|line| run_of_four(&line))
    }
}

fn run_of_four(line: &[Option<Color>]) -> Option<Color> {
    let mut current = None;
    let mut count = 0;
    for cell in line {
        match cell {
            Some(color) if current == Some(*color) => count += 1,
            Some(color) => {
                current = Some(*color);
                count = 1;
            }
            None => {
                current = None;
                count = 0;
            }
        }
        if count == RUN_TO_WIN {
            return current;
        }
    }
    None
}

/// A running game of connect four.
#[derive(Debug)]
pub struct ConnectFourGame {
    codec: JsonCodec,
    board: Board,
    red: PlayerId,
    yellow: PlayerId,
    turn: Color,
}

impl ConnectFourGame {
    /// Creates a game for exactly two members, or `None`.
    pub fn new(members: &[PlayerData]) -> Option<Self> {
        let [red, yellow] = members else {
            return None;
        };
        Some(Self {
            codec: JsonCodec,
            board: Board::default(),
            red: red.id,
            yellow: yellow.id,
            turn: Color::Red,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    fn color_of(&self, player: PlayerId) -> Option<Color> {
        if player == self.red {
            Some(Color::Red)
        } else if player == self.yellow {
            Some(Color::Yellow)
        } else {
            None
        }
    }

    fn place(
        &mut self,
        party: &mut dyn PartyView,
        sender: PlayerId,
        x: i32,
    ) -> Result<(), GameError> {
        let color = self.color_of(sender).ok_or(GameError::NotAPlayer(sender))?;
        if color != self.turn {
            return Err(GameError::NotYourTurn);
        }
        let column = usize::try_from(x)
            .ok()
            .filter(|column| *column < BOARD_WIDTH)
            .ok_or(GameError::OutOfRange)?;
        if self.board.is_column_full(column) {
            return Err(GameError::ColumnFull);
        }

        self.board.drop_piece(column, color);
        self.turn = color.other();
        crate::broadcast(
            &self.codec,
            party,
            &ConnectFourPacket::Placed { player: color, x },
        );

        if let Some(winner) = self.board.winner() {
            tracing::info!(?winner, "connect four won");
            party.end_game();
        } else if self.board.is_full() {
            tracing::info!("connect four drawn");
            party.end_game();
        }
        Ok(())
    }
}

impl Game for ConnectFourGame {
    fn on_player_left(&mut self, party: &mut dyn PartyView, _player: PlayerId) {
        party.end_game();
    }

    fn on_packet(
        &mut self,
        party: &mut dyn PartyView,
        sender: PlayerId,
        payload: &[u8],
    ) -> Result<(), GameError> {
        let packet: ConnectFourPacket =
            crate::decode_client(&self.codec, payload, &[PLACE])?;
        match packet {
            ConnectFourPacket::Place { x } => self.place(party, sender, x),
            ConnectFourPacket::Placed { .. } => {
                Err(GameError::UnknownPacket(PLACED.to_string()))
            }
        }
    }
}
