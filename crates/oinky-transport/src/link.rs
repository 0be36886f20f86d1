//! The per-connection pump.
//!
//! Every connection gets two independent Tokio tasks:
//!
//! ```text
//!             ┌────────────┐  inbound (bounded)   ┌─────────────┐
//!  stream ──→ │ read loop  │ ───────────────────→ │ coordinator │
//!             └────────────┘                      │             │
//!             ┌────────────┐  outbound (bounded)  │             │
//!  stream ←── │ write loop │ ←─────────────────── │  Link::send │
//!             └────────────┘                      └─────────────┘
//! ```
//!
//! The tasks share no state with the rest of the server beyond the two
//! queues and a [`Link`]: a cheap, cloneable handle that owns the
//! outbound sender and the one-shot disconnect guard.
//!
//! Sending never waits. If a client stops reading and its outbound queue
//! fills up, the connection is dropped instead of stalling the caller
//! (the tick loop, and with it every other client).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;

use crate::{ConnectionId, TransportError, read_frame, write_frame};

/// Queue sizes and frame limit for one connection.
#[derive(Debug, Clone, Copy)]
pub struct LinkConfig {
    /// Payloads read from the client but not yet handled.
    pub inbound_capacity: usize,
    /// Payloads queued for the client but not yet written.
    pub outbound_capacity: usize,
    /// Largest payload the read loop accepts.
    pub max_frame_len: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            inbound_capacity: 100,
            outbound_capacity: 100,
            max_frame_len: crate::DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Handle to one connection's outbound side and its disconnect guard.
///
/// Clones share the same connection. Dropping every clone does not
/// close the connection; call [`disconnect`](Self::disconnect).
#[derive(Debug, Clone)]
pub struct Link {
    inner: Arc<LinkInner>,
}

#[derive(Debug)]
struct LinkInner {
    id: ConnectionId,
    outbound: mpsc::Sender<Vec<u8>>,
    /// Flipped to `true` exactly once; both loops watch it.
    stop: watch::Sender<bool>,
    disconnected: AtomicBool,
    /// Where the coordinator learns about closed connections.
    disconnects: mpsc::UnboundedSender<ConnectionId>,
}

impl Link {
    /// Creates a link without any I/O attached.
    ///
    /// Returns the receiving end of the outbound queue. [`spawn_link`]
    /// hands it to a write loop; in-process peers (and tests) can read
    /// it directly.
    pub fn new(
        id: ConnectionId,
        outbound_capacity: usize,
        disconnects: mpsc::UnboundedSender<ConnectionId>,
    ) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (outbound, outbound_rx) = mpsc::channel(outbound_capacity);
        let (stop, _) = watch::channel(false);
        let link = Self {
            inner: Arc::new(LinkInner {
                id,
                outbound,
                stop,
                disconnected: AtomicBool::new(false),
                disconnects,
            }),
        };
        (link, outbound_rx)
    }

    /// The connection this link belongs to.
    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    /// Queues a payload for the client without waiting.
    ///
    /// # Errors
    /// - [`TransportError::QueueFull`] if the client is not keeping up.
    ///   The connection is disconnected before this returns.
    /// - [`TransportError::Disconnected`] if the connection is already
    ///   gone. The payload is dropped.
    pub fn send(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        let id = self.inner.id;
        if self.is_disconnected() {
            return Err(TransportError::Disconnected(id));
        }

        match self.inner.outbound.try_send(payload) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                tracing::warn!(conn = %id, "outbound queue full, dropping slow client");
                self.disconnect();
                Err(TransportError::QueueFull(id))
            }
            Err(TrySendError::Closed(_)) => {
                self.disconnect();
                Err(TransportError::Disconnected(id))
            }
        }
    }

    /// Tears the connection down. Safe to call any number of times,
    /// from any task; only the first call has an effect.
    ///
    /// Signals both loops to stop (which drops the stream halves) and
    /// notifies the coordinator exactly once.
    pub fn disconnect(&self) {
        if self.inner.disconnected.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!(conn = %self.inner.id, "disconnecting");
        self.inner.stop.send_replace(true);
        // The coordinator may already be gone during shutdown.
        let _ = self.inner.disconnects.send(self.inner.id);
    }

    /// Whether [`disconnect`](Self::disconnect) has been called.
    pub fn is_disconnected(&self) -> bool {
        self.inner.disconnected.load(Ordering::Acquire)
    }

    fn stop_signal(&self) -> watch::Receiver<bool> {
        self.inner.stop.subscribe()
    }
}

/// Starts the read and write loops for `stream`.
///
/// Returns the [`Link`] for sending and disconnecting, and the receiving
/// end of the bounded inbound queue.
pub fn spawn_link<S>(
    stream: S,
    id: ConnectionId,
    config: LinkConfig,
    disconnects: mpsc::UnboundedSender<ConnectionId>,
) -> (Link, mpsc::Receiver<Vec<u8>>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let (link, outbound_rx) =
        Link::new(id, config.outbound_capacity, disconnects);
    let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity);

    tokio::spawn(read_loop(
        reader,
        inbound_tx,
        link.clone(),
        config.max_frame_len,
    ));
    tokio::spawn(write_loop(writer, outbound_rx, link.clone()));

    tracing::debug!(conn = %id, "connection pump started");
    (link, inbound_rx)
}

async fn read_loop<R>(
    mut reader: R,
    inbound: mpsc::Sender<Vec<u8>>,
    link: Link,
    max_frame_len: usize,
) where
    R: AsyncRead + Unpin,
{
    let mut stop = link.stop_signal();

    loop {
        let payload = tokio::select! {
            _ = stop.wait_for(|stopped| *stopped) => break,
            frame = read_frame(&mut reader, max_frame_len) => match frame {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::debug!(conn = %link.id(), error = %e, "read loop ended");
                    break;
                }
            },
        };

        // Waits while the inbound queue is full; fails once the
        // coordinator has dropped the receiver.
        if inbound.send(payload).await.is_err() {
            break;
        }
    }

    link.disconnect();
}

async fn write_loop<W>(
    mut writer: W,
    mut outbound: mpsc::Receiver<Vec<u8>>,
    link: Link,
) where
    W: AsyncWrite + Unpin,
{
    let mut stop = link.stop_signal();

    loop {
        let payload = tokio::select! {
            _ = stop.wait_for(|stopped| *stopped) => break,
            next = outbound.recv() => match next {
                Some(payload) => payload,
                None => break,
            },
        };

        if let Err(e) = write_frame(&mut writer, &payload).await {
            tracing::debug!(conn = %link.id(), error = %e, "write loop ended");
            break;
        }
    }

    let _ = writer.shutdown().await;
    link.disconnect();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached(capacity: usize) -> (
        Link,
        mpsc::Receiver<Vec<u8>>,
        mpsc::UnboundedReceiver<ConnectionId>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (link, outbound) = Link::new(ConnectionId::new(1), capacity, tx);
        (link, outbound, rx)
    }

    #[test]
    fn test_send_queues_payload() {
        let (link, mut outbound, _disconnects) = detached(4);
        link.send(b"a".to_vec()).unwrap();
        assert_eq!(outbound.try_recv().unwrap(), b"a");
    }

    #[test]
    fn test_disconnect_notifies_exactly_once() {
        let (link, _outbound, mut disconnects) = detached(4);
        let clone = link.clone();

        link.disconnect();
        clone.disconnect();
        link.disconnect();

        assert_eq!(disconnects.try_recv().unwrap(), ConnectionId::new(1));
        assert!(disconnects.try_recv().is_err());
        assert!(clone.is_disconnected());
    }

    #[test]
    fn test_full_queue_disconnects_instead_of_blocking() {
        let (link, _outbound, mut disconnects) = detached(2);
        link.send(b"1".to_vec()).unwrap();
        link.send(b"2".to_vec()).unwrap();

        let err = link.send(b"3".to_vec()).unwrap_err();
        assert!(matches!(err, TransportError::QueueFull(_)));
        assert!(link.is_disconnected());
        assert!(disconnects.try_recv().is_ok());
    }

    #[test]
    fn test_send_after_disconnect_is_rejected() {
        let (link, mut outbound, _disconnects) = detached(4);
        link.disconnect();
        let err = link.send(b"late".to_vec()).unwrap_err();
        assert!(matches!(err, TransportError::Disconnected(_)));
        assert!(outbound.try_recv().is_err());
    }
}
