use crate::ConnectionId;

/// Errors that can occur in the transport layer.
///
/// Every one of these is fatal to the connection it happened on and to
/// nothing else.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer closed the stream.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing to the stream failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading from the stream failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// A frame declared (or would need) a length above the limit.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },

    /// The outbound queue was full; the connection has been dropped.
    #[error("outbound queue of {0} is full")]
    QueueFull(ConnectionId),

    /// The connection is already disconnected.
    #[error("{0} is disconnected")]
    Disconnected(ConnectionId),
}
