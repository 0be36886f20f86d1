//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. When you see
//! a `ProtocolError`, you know the problem is in serialization, not in
//! networking or party bookkeeping.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes are not a valid encoded packet.
    ///
    /// Common causes: not JSON at all, the `PacketName` field is
    /// missing, or the fields don't match the shape the tag promises.
    #[cfg(feature = "json")]
    #[error("malformed packet: {0}")]
    MalformedPacket(serde_json::Error),

    /// The packet decoded fine but is not allowed here.
    ///
    /// For example, a client sending a server-only packet like
    /// `welcome`.
    #[error("unexpected packet: {0}")]
    UnexpectedPacket(String),
}
