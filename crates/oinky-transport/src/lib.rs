//! Transport layer for the Oinky party server.
//!
//! - [`Transport`] / [`TcpTransport`]: accepting raw byte streams.
//! - [`read_frame`] / [`write_frame`]: the `[u32 BE length][payload]`
//!   framing every message travels in.
//! - [`Link`] / [`spawn_link`]: the per-connection pump: a read loop and
//!   a write loop that turn a byte stream into bounded inbound/outbound
//!   queues, plus an idempotent disconnect.
//!
//! Nothing here knows about packets or players. A connection is a
//! [`ConnectionId`] and a stream of opaque payloads.

#![allow(async_fn_in_trait)]

mod error;
mod frame;
mod link;
mod tcp;

pub use error::TransportError;
pub use frame::{DEFAULT_MAX_FRAME_LEN, read_frame, write_frame};
pub use link::{Link, LinkConfig, spawn_link};
pub use tcp::TcpTransport;

use std::fmt;

use tokio::io::{AsyncRead, AsyncWrite};

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming byte streams.
pub trait Transport: Send + Sync + 'static {
    /// The stream type produced by this transport.
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Stream, Self::Error>;
}
