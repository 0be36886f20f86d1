//! `OinkyServer` builder, accept loop, and the coordinator loop.
//!
//! This is the entry point for running an Oinky server. It ties
//! together all the layers: transport → session → party → games.
//!
//! ```text
//! accept loop (task) ──streams──→ ┌─────────────┐
//! read loops (tasks) ──payloads─→ │ Coordinator │ ──→ write loops (tasks)
//! links ──────────disconnects───→ └─────────────┘
//! ```
//!
//! The coordinator is the only place that touches player, party and
//! game state. One [`step`](Coordinator::step) per tick.

use std::net::SocketAddr;
use std::time::Duration;

use oinky_protocol::{Codec, Packet, PlayerId};
use oinky_tick::{TickConfig, TickPolicy, TickScheduler};
use oinky_transport::{
    ConnectionId, Link, LinkConfig, TcpTransport, Transport, spawn_link,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::handler::{ServerState, handle_packet};
use crate::{OinkyError, ServerConfig};

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// The single authoritative loop.
///
/// Each [`step`](Self::step), in order:
/// 1. registers new connections and welcomes them,
/// 2. removes players whose connection closed,
/// 3. drains and routes every player's queued packets,
/// 4. ticks every running game.
///
/// `S` is the stream type handed over by the accept loop.
pub struct Coordinator<S> {
    state: ServerState,
    link_config: LinkConfig,
    incoming: mpsc::Receiver<S>,
    disconnects_tx: mpsc::UnboundedSender<ConnectionId>,
    disconnects: mpsc::UnboundedReceiver<ConnectionId>,
    next_conn_id: u64,
}

impl<S> Coordinator<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Creates a coordinator fed by `incoming`.
    pub fn new(incoming: mpsc::Receiver<S>, link_config: LinkConfig) -> Self {
        let (disconnects_tx, disconnects) = mpsc::unbounded_channel();
        Self {
            state: ServerState::default(),
            link_config,
            incoming,
            disconnects_tx,
            disconnects,
            next_conn_id: 1,
        }
    }

    /// Runs one iteration of the loop. Never waits.
    ///
    /// Must be called from within a Tokio runtime: new connections get
    /// their I/O tasks spawned here.
    pub fn step(&mut self) {
        self.accept_new();
        self.drain_disconnects();
        self.drain_inbound();
        self.state.parties.tick_all();
    }

    /// Steps once per tick, forever.
    pub async fn run(mut self, tick: TickConfig) {
        let mut scheduler = TickScheduler::new(tick);
        tracing::info!(interval = ?scheduler.interval(), "coordinator running");
        loop {
            self.step();
            scheduler.record_tick_end();
            scheduler.wait_for_tick().await;
        }
    }

    /// Number of registered players.
    pub fn player_count(&self) -> usize {
        self.state.players.len()
    }

    /// Number of live parties.
    pub fn party_count(&self) -> usize {
        self.state.parties.party_count()
    }

    fn accept_new(&mut self) {
        while let Ok(stream) = self.incoming.try_recv() {
            let conn = ConnectionId::new(self.next_conn_id);
            self.next_conn_id += 1;

            // `welcome` goes through the outbound queue, so it is still the
            // first frame the client sees even though the pump starts here.
            let (link, inbound) = spawn_link(
                stream,
                conn,
                self.link_config,
                self.disconnects_tx.clone(),
            );
            let player = self.state.players.register(link, inbound);
            let welcome = Packet::Welcome {
                your_id: player.id(),
                your_name: player.name().to_string(),
            };
            let player_id = player.id();

            if let Err(e) = self.state.send(player_id, &welcome) {
                tracing::warn!(%player_id, error = %e, "failed to send welcome");
            }
        }
    }

    fn drain_disconnects(&mut self) {
        while let Ok(conn) = self.disconnects.try_recv() {
            let Some(player_id) = self.state.players.player_on(conn) else {
                continue;
            };
            self.state.parties.remove_player(player_id);
            self.state.players.remove_connection(conn);
        }
    }

    fn drain_inbound(&mut self) {
        for player_id in self.state.players.ids() {
            let Some(player) = self.state.players.get_mut(player_id) else {
                continue;
            };
            let link = player.link().clone();
            for payload in player.drain_inbound() {
                if link.is_disconnected() {
                    break;
                }
                self.route(player_id, &payload, &link);
            }
        }
    }

    /// A payload without a readable tag is a framing-level violation and
    /// costs the sender its connection. Anything past that only gets
    /// logged.
    fn route(
        &mut self,
        player_id: PlayerId,
        payload: &[u8],
        link: &Link,
    ) {
        let kind = match self.state.codec.peek_kind(payload) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(%player_id, error = %e, "malformed packet, disconnecting");
                link.disconnect();
                return;
            }
        };

        if let Err(e) = handle_packet(&mut self.state, player_id, &kind, payload) {
            tracing::warn!(%player_id, %kind, error = %e, "packet rejected");
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting an Oinky server.
///
/// # Example
///
/// ```rust,ignore
/// let server = OinkyServer::builder()
///     .bind("127.0.0.1:0")
///     .tick_interval(Duration::from_millis(20))
///     .build()
///     .await?;
/// let addr = server.local_addr()?;
/// server.run().await
/// ```
#[derive(Debug, Default)]
pub struct OinkyServerBuilder {
    config: ServerConfig,
}

impl OinkyServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick.interval = interval;
        self
    }

    pub fn tick_policy(mut self, policy: TickPolicy) -> Self {
        self.config.tick.policy = policy;
        self
    }

    /// Sets both per-connection queue capacities.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.link.inbound_capacity = capacity;
        self.config.link.outbound_capacity = capacity;
        self
    }

    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.config.link.max_frame_len = len;
        self
    }

    /// Binds the listener. The server doesn't accept anyone until
    /// [`OinkyServer::run`] is called.
    pub async fn build(self) -> Result<OinkyServer, OinkyError> {
        let transport = TcpTransport::bind(&self.config.bind_addr).await?;
        Ok(OinkyServer {
            transport,
            config: self.config,
        })
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A bound Oinky server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct OinkyServer {
    transport: TcpTransport,
    config: ServerConfig,
}

impl OinkyServer {
    /// Creates a new builder.
    pub fn builder() -> OinkyServerBuilder {
        OinkyServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop and the coordinator until the process is
    /// terminated.
    pub async fn run(self) -> Result<(), OinkyError> {
        tracing::info!(addr = %self.config.bind_addr, "Oinky server running");

        let (incoming_tx, incoming) = mpsc::channel(self.config.accept_backlog);
        tokio::spawn(accept_loop(self.transport, incoming_tx));

        Coordinator::new(incoming, self.config.link)
            .run(self.config.tick)
            .await;
        Ok(())
    }
}

/// Hands every accepted stream to the coordinator, waiting while the
/// backlog is full.
async fn accept_loop(mut transport: TcpTransport, incoming: mpsc::Sender<TcpStream>) {
    loop {
        match transport.accept().await {
            Ok(stream) => {
                if incoming.send(stream).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
            }
        }
    }
}
