//! The player entity.

use oinky_protocol::{PlayerData, PlayerId};
use oinky_transport::{Link, TransportError};
use tokio::sync::mpsc;

/// One connected player.
///
/// Created when a connection is accepted, dropped when it closes. The
/// party a player is in is tracked by the party manager, not here.
#[derive(Debug)]
pub struct Player {
    pub(crate) id: PlayerId,
    pub(crate) name: String,
    pub(crate) link: Link,
    pub(crate) inbound: mpsc::Receiver<Vec<u8>>,
}

impl Player {
    /// The player's id.
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// The player's current display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The player's connection.
    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Public identity, as shown to other players.
    pub fn data(&self) -> PlayerData {
        PlayerData {
            name: self.name.clone(),
            id: self.id,
        }
    }

    /// Queues a payload for this player. Never waits.
    ///
    /// # Errors
    /// See [`Link::send`]. A full queue disconnects the player.
    pub fn send(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.link.send(payload)
    }

    /// Takes everything currently queued from this player, oldest first.
    ///
    /// Only what is queued at the time of the call is returned; payloads
    /// that arrive during processing wait for the next tick.
    pub fn drain_inbound(&mut self) -> Vec<Vec<u8>> {
        let mut payloads = Vec::with_capacity(self.inbound.len());
        for _ in 0..self.inbound.len() {
            match self.inbound.try_recv() {
                Ok(payload) => payloads.push(payload),
                Err(_) => break,
            }
        }
        payloads
    }
}
