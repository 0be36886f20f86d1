//! Codec trait and implementations for serializing/deserializing packets.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The rest of the server doesn't care HOW packets are serialized; it
//! just needs something that implements the [`Codec`] trait.
//!
//! On top of plain encode/decode, the codec can *peek* at a packet's
//! discriminator. The router needs the tag before it knows which
//! concrete type (global [`Packet`](crate::Packet) or some minigame's
//! packet enum) to decode into.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between threads.
/// - `'static` → the codec doesn't borrow temporary data.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::MalformedPacket` if the bytes are not a
    /// valid encoding, lack the tag, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;

    /// Reads only the discriminator of an encoded packet.
    ///
    /// All other fields are ignored, so this succeeds for packets of
    /// any shape as long as they carry the tag.
    ///
    /// # Errors
    /// Returns `ProtocolError::MalformedPacket` if the bytes are not a
    /// structured record or the tag field is missing.
    fn peek_kind(&self, data: &[u8]) -> Result<String, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is human-readable, which makes packets easy to log and to
/// produce from any client language.
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use oinky_protocol::{Codec, JsonCodec, Packet};
///
/// let codec = JsonCodec;
///
/// let packet = Packet::CreateParty { name: "Test".into() };
/// let bytes = codec.encode(&packet).unwrap();
///
/// assert_eq!(codec.peek_kind(&bytes).unwrap(), "create-party");
///
/// let decoded: Packet = codec.decode(&bytes).unwrap();
/// assert_eq!(packet, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

/// Just the tag of a packet. serde skips every other field.
#[cfg(feature = "json")]
#[derive(serde::Deserialize)]
struct Tagged {
    #[serde(rename = "PacketName")]
    kind: String,
}

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::MalformedPacket)
    }

    fn peek_kind(&self, data: &[u8]) -> Result<String, ProtocolError> {
        let tagged: Tagged = serde_json::from_slice(data)
            .map_err(ProtocolError::MalformedPacket)?;
        Ok(tagged.kind)
    }
}
