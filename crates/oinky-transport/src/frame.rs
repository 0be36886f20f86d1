//! Length-prefixed framing.
//!
//! ```text
//! ┌──────────────────────┬───────────────────────────┐
//! │ length: u32 (BE)     │ payload: `length` bytes   │
//! └──────────────────────┴───────────────────────────┘
//! ```
//!
//! The transport may hand us partial data at any point, so both
//! directions use `read_exact` / `write_all`, which loop until the whole
//! buffer is satisfied.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::TransportError;

/// Largest payload accepted by default (1 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 1 << 20;

/// Reads one frame and returns its payload.
///
/// # Errors
/// - [`TransportError::ConnectionClosed`] if the stream ends, including
///   in the middle of the length prefix or the payload.
/// - [`TransportError::FrameTooLarge`] if the declared length exceeds
///   `max_len`. Nothing past the prefix is read.
/// - [`TransportError::ReceiveFailed`] for any other I/O error.
pub async fn read_frame<R>(
    reader: &mut R,
    max_len: usize,
) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 4];
    reader.read_exact(&mut prefix).await.map_err(read_error)?;

    let len = u32::from_be_bytes(prefix) as usize;
    if len > max_len {
        return Err(TransportError::FrameTooLarge { len, max: max_len });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(read_error)?;
    Ok(payload)
}

/// Writes one frame: the big-endian length, then the payload.
///
/// # Errors
/// - [`TransportError::FrameTooLarge`] if the payload length doesn't fit
///   in the 4-byte prefix.
/// - [`TransportError::SendFailed`] if the stream rejects the write.
pub async fn write_frame<W>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).map_err(|_| {
        TransportError::FrameTooLarge {
            len: payload.len(),
            max: u32::MAX as usize,
        }
    })?;

    writer
        .write_all(&len.to_be_bytes())
        .await
        .map_err(TransportError::SendFailed)?;
    writer
        .write_all(payload)
        .await
        .map_err(TransportError::SendFailed)?;
    writer.flush().await.map_err(TransportError::SendFailed)
}

fn read_error(e: std::io::Error) -> TransportError {
    if e.kind() == ErrorKind::UnexpectedEof {
        TransportError::ConnectionClosed("end of stream".into())
    } else {
        TransportError::ReceiveFailed(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_round_trip_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(64);
        write_frame(&mut a, b"hello").await.unwrap();
        let payload = read_frame(&mut b, DEFAULT_MAX_FRAME_LEN).await.unwrap();
        assert_eq!(payload, b"hello");
    }

    #[tokio::test]
    async fn test_prefix_is_big_endian() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        write_frame(&mut a, &[7u8; 258]).await.unwrap();
        let mut prefix = [0u8; 4];
        b.read_exact(&mut prefix).await.unwrap();
        assert_eq!(prefix, [0, 0, 1, 2]);
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let (mut a, mut b) = tokio::io::duplex(64);
        write_frame(&mut a, b"").await.unwrap();
        let payload = read_frame(&mut b, DEFAULT_MAX_FRAME_LEN).await.unwrap();
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_payload_delivered_in_pieces() {
        // A tiny duplex buffer forces the payload across many reads.
        let (mut a, mut b) = tokio::io::duplex(3);
        let body = vec![9u8; 100];
        let expected = body.clone();
        let writer = tokio::spawn(async move {
            write_frame(&mut a, &body).await.unwrap();
        });
        let payload = read_frame(&mut b, DEFAULT_MAX_FRAME_LEN).await.unwrap();
        writer.await.unwrap();
        assert_eq!(payload, expected);
    }

    #[tokio::test]
    async fn test_oversized_declared_length_is_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&100u32.to_be_bytes()).await.unwrap();
        let err = read_frame(&mut b, 10).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::FrameTooLarge { len: 100, max: 10 }
        ));
    }

    #[tokio::test]
    async fn test_short_prefix_then_close() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&[0, 0]).await.unwrap();
        drop(a);
        let err = read_frame(&mut b, DEFAULT_MAX_FRAME_LEN).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed(_)));
    }

    #[tokio::test]
    async fn test_truncated_payload_then_close() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&5u32.to_be_bytes()).await.unwrap();
        a.write_all(b"ab").await.unwrap();
        drop(a);
        let err = read_frame(&mut b, DEFAULT_MAX_FRAME_LEN).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed(_)));
    }
}
