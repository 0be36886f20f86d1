//! A `PartyView` that records everything a game does.

use oinky_game::PartyView;
use oinky_protocol::{PlayerData, PlayerId};
use serde_json::Value;

pub(crate) struct RecordingParty {
    pub members: Vec<PlayerData>,
    pub broadcasts: Vec<Value>,
    pub sent: Vec<(PlayerId, Value)>,
    pub end_requested: bool,
}

impl RecordingParty {
    /// A party of `size` players with ids 1..=size.
    pub fn new(size: i32) -> Self {
        Self {
            members: (1..=size)
                .map(|i| PlayerData {
                    name: format!("p{i}"),
                    id: PlayerId(i),
                })
                .collect(),
            broadcasts: Vec::new(),
            sent: Vec::new(),
            end_requested: false,
        }
    }

    /// Takes the private packets sent to `player` so far.
    pub fn take_sent_to(&mut self, player: PlayerId) -> Vec<Value> {
        let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.sent)
            .into_iter()
            .partition(|(to, _)| *to == player);
        self.sent = rest;
        mine.into_iter().map(|(_, value)| value).collect()
    }
}

impl PartyView for RecordingParty {
    fn members(&self) -> Vec<PlayerData> {
        self.members.clone()
    }

    fn broadcast(&mut self, payload: Vec<u8>) {
        self.broadcasts.push(serde_json::from_slice(&payload).unwrap());
    }

    fn send_to(&mut self, player: PlayerId, payload: Vec<u8>) {
        self.sent
            .push((player, serde_json::from_slice(&payload).unwrap()));
    }

    fn end_game(&mut self) {
        self.end_requested = true;
    }
}

/// Encodes a JSON value as a packet payload.
pub(crate) fn payload(value: Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
}
