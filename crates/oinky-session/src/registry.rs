//! The player registry: every connected player, keyed by id.
//!
//! # Concurrency note
//!
//! `PlayerRegistry` is NOT thread-safe by itself; it uses plain
//! `HashMap`s. It is owned by the coordinator, which is the only task
//! that ever touches player state.

use std::collections::HashMap;

use oinky_protocol::PlayerId;
use oinky_transport::{ConnectionId, Link};
use rand::Rng;
use tokio::sync::mpsc;

use crate::{Player, SessionError};

/// Names handed out to new players until they pick their own.
pub const DEFAULT_NAMES: [&str; 3] = ["Oinky", "Lama", "Grunz Grunz"];

/// Owns all connected players.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, Player>,
    /// Index from connection to player, for disconnect notifications.
    connections: HashMap<ConnectionId, PlayerId>,
}

impl PlayerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly accepted connection as a new player.
    ///
    /// The player gets a random non-negative id that is unique among
    /// registered players, and a random default name.
    pub fn register(
        &mut self,
        link: Link,
        inbound: mpsc::Receiver<Vec<u8>>,
    ) -> &Player {
        let mut rng = rand::rng();
        let id = loop {
            let candidate = PlayerId(rng.random_range(0..=i32::MAX));
            if !self.players.contains_key(&candidate) {
                break candidate;
            }
        };
        let name = DEFAULT_NAMES[rng.random_range(0..DEFAULT_NAMES.len())];

        self.connections.insert(link.id(), id);
        tracing::info!(player_id = %id, conn = %link.id(), name, "player registered");

        self.players.entry(id).or_insert(Player {
            id,
            name: name.to_string(),
            link,
            inbound,
        })
    }

    /// Removes the player behind a closed connection.
    ///
    /// Returns `None` if the connection was already removed, which makes
    /// duplicate disconnect notifications harmless.
    pub fn remove_connection(&mut self, conn: ConnectionId) -> Option<Player> {
        let id = self.connections.remove(&conn)?;
        let player = self.players.remove(&id)?;
        tracing::info!(player_id = %id, %conn, "player deregistered");
        Some(player)
    }

    /// The player behind a connection, if still registered.
    pub fn player_on(&self, conn: ConnectionId) -> Option<PlayerId> {
        self.connections.get(&conn).copied()
    }

    /// Looks up a player by id.
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Looks up a player by id, mutably.
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Changes a player's display name.
    ///
    /// Leading and trailing whitespace is trimmed.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] if the player isn't registered.
    /// - [`SessionError::EmptyName`] if nothing is left after trimming.
    pub fn rename(
        &mut self,
        id: PlayerId,
        new_name: &str,
    ) -> Result<&Player, SessionError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        let player = self
            .players
            .get_mut(&id)
            .ok_or(SessionError::NotFound(id))?;

        tracing::info!(player_id = %id, old = %player.name, new = new_name, "player renamed");
        player.name = new_name.to_string();
        Ok(player)
    }

    /// Ids of every registered player.
    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    /// Number of registered players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no player is registered.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attach(
        registry: &mut PlayerRegistry,
        conn: u64,
    ) -> (PlayerId, mpsc::Receiver<Vec<u8>>, mpsc::Sender<Vec<u8>>) {
        let (disconnects, _) = mpsc::unbounded_channel();
        let (link, outbound) = Link::new(ConnectionId::new(conn), 8, disconnects);
        let (inbound_tx, inbound_rx) = mpsc::channel(8);
        let id = registry.register(link, inbound_rx).id();
        (id, outbound, inbound_tx)
    }

    #[test]
    fn test_register_assigns_unique_ids_and_default_names() {
        let mut registry = PlayerRegistry::new();
        let (a, _, _) = attach(&mut registry, 1);
        let (b, _, _) = attach(&mut registry, 2);

        assert_ne!(a, b);
        assert!(a.0 >= 0 && b.0 >= 0);
        assert_eq!(registry.len(), 2);
        let name = registry.get(a).unwrap().name();
        assert!(DEFAULT_NAMES.contains(&name));
    }

    #[test]
    fn test_remove_connection_is_idempotent() {
        let mut registry = PlayerRegistry::new();
        let (a, _, _) = attach(&mut registry, 1);

        assert_eq!(registry.player_on(ConnectionId::new(1)), Some(a));
        let removed = registry.remove_connection(ConnectionId::new(1)).unwrap();
        assert_eq!(registry.player_on(ConnectionId::new(1)), None);
        assert_eq!(removed.id(), a);
        assert!(registry.remove_connection(ConnectionId::new(1)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rename_trims_and_rejects_empty() {
        let mut registry = PlayerRegistry::new();
        let (a, _, _) = attach(&mut registry, 1);

        assert_eq!(registry.rename(a, "  Alice ").unwrap().name(), "Alice");
        assert!(matches!(
            registry.rename(a, "   "),
            Err(SessionError::EmptyName)
        ));
        assert!(matches!(
            registry.rename(PlayerId(-1), "Bob"),
            Err(SessionError::NotFound(_))
        ));
    }

    #[test]
    fn test_drain_inbound_takes_queued_payloads_in_order() {
        let mut registry = PlayerRegistry::new();
        let (a, _, inbound) = attach(&mut registry, 1);

        inbound.try_send(b"1".to_vec()).unwrap();
        inbound.try_send(b"2".to_vec()).unwrap();

        let player = registry.get_mut(a).unwrap();
        assert_eq!(player.drain_inbound(), vec![b"1".to_vec(), b"2".to_vec()]);
        assert!(player.drain_inbound().is_empty());
    }

    #[test]
    fn test_send_goes_through_link() {
        let mut registry = PlayerRegistry::new();
        let (a, mut outbound, _) = attach(&mut registry, 1);

        registry.get(a).unwrap().send(b"hi".to_vec()).unwrap();
        assert_eq!(outbound.try_recv().unwrap(), b"hi");
    }
}
