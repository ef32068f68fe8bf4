//! Length-prefixed framing for byte streams.
//!
//! Every framed message on the wire looks like this:
//!
//! ```text
//! +---------------------+--------------------+
//! | length (4 bytes)    |   payload          |
//! | i32 big-endian      |   (length bytes)   |
//! +---------------------+--------------------+
//! ```
//!
//! The length does not include the prefix itself. A zero length is a
//! valid empty frame. Negative lengths are rejected.
//!
//! Reads block until the whole prefix and payload have arrived. EOF
//! before the first prefix byte is a clean close; EOF anywhere after
//! that is a truncated frame.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::TransportError;

/// Size of the length prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// Limits applied by the framing layer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest payload accepted or sent, in bytes. Default: 64 KiB.
    pub max_frame_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_len: 64 * 1024,
        }
    }
}

/// Fills `buf` from `reader`, returning how many bytes arrived before EOF.
///
/// Unlike `read_exact`, a short read is reported as a count rather than an
/// error so callers can tell "nothing at all" from "part of it".
pub async fn read_full<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<usize, TransportError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader
            .read(&mut buf[filled..])
            .await
            .map_err(TransportError::ReceiveFailed)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Reads a single length-prefixed frame from the stream.
///
/// # Errors
/// - [`TransportError::ConnectionClosed`] on EOF before any prefix byte
/// - [`TransportError::Truncated`] on EOF inside the prefix or payload
/// - [`TransportError::InvalidLength`] for a negative prefix
/// - [`TransportError::FrameTooLarge`] above `config.max_frame_len`
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    config: &FrameConfig,
) -> Result<Vec<u8>, TransportError> {
    let mut prefix = [0u8; PREFIX_LEN];
    match read_full(reader, &mut prefix).await? {
        0 => return Err(TransportError::ConnectionClosed),
        PREFIX_LEN => {}
        received => {
            return Err(TransportError::Truncated {
                expected: PREFIX_LEN,
                received,
            });
        }
    }

    let declared = i32::from_be_bytes(prefix);
    let len = usize::try_from(declared)
        .map_err(|_| TransportError::InvalidLength(declared))?;
    if len > config.max_frame_len {
        return Err(TransportError::FrameTooLarge {
            size: len,
            max: config.max_frame_len,
        });
    }

    let mut payload = vec![0u8; len];
    let received = read_full(reader, &mut payload).await?;
    if received != len {
        return Err(TransportError::Truncated {
            expected: len,
            received,
        });
    }

    Ok(payload)
}

/// Writes a single length-prefixed frame and flushes the stream.
///
/// Prefix and payload go out in one write so a frame is never split
/// across two syscalls on our side.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
    config: &FrameConfig,
) -> Result<(), TransportError> {
    if payload.len() > config.max_frame_len {
        return Err(TransportError::FrameTooLarge {
            size: payload.len(),
            max: config.max_frame_len,
        });
    }
    let len = i32::try_from(payload.len()).map_err(|_| TransportError::FrameTooLarge {
        size: payload.len(),
        max: i32::MAX as usize,
    })?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(payload);

    writer
        .write_all(&buf)
        .await
        .map_err(TransportError::SendFailed)?;
    writer.flush().await.map_err(TransportError::SendFailed)?;
    Ok(())
}
