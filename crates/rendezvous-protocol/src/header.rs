//! Fixed-size binary header sent after every "token" and "match" frame.
//!
//! ```text
//! byte  0      3    4                                      40
//!       +------+----+---------------------------------------+
//!       | ver  |mode|             client id                 |
//!       | 3 B  |1 B |               36 B                    |
//!       +------+----+---------------------------------------+
//! ```
//!
//! The header is not length-prefixed. Identifiers shorter than 36 bytes
//! are padded with trailing NUL bytes; longer ones are truncated.

use crate::{ClientId, GameMode, ProtocolError, ProtocolVersion};

/// A decoded header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Protocol version the sender speaks.
    pub version: ProtocolVersion,
    /// Game mode the client wants to play.
    pub mode: GameMode,
    /// The identifier the server issued to this client.
    pub client_id: ClientId,
}

impl Header {
    /// Encoded size in bytes.
    pub const LEN: usize = 40;

    const MODE_AT: usize = 3;
    const ID_AT: usize = 4;

    /// Builds a header for the current protocol version.
    pub fn new(mode: GameMode, client_id: ClientId) -> Self {
        Self {
            version: ProtocolVersion::CURRENT,
            mode,
            client_id,
        }
    }

    /// Encodes into the fixed 40-byte layout.
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        buf[..Self::MODE_AT].copy_from_slice(self.version.as_bytes());
        buf[Self::MODE_AT] = self.mode.0;

        let id = self.client_id.as_bytes();
        let n = id.len().min(ClientId::LEN);
        buf[Self::ID_AT..Self::ID_AT + n].copy_from_slice(&id[..n]);
        buf
    }

    /// Decodes the first 40 bytes of `buf`, checking the version.
    ///
    /// # Errors
    /// - [`ProtocolError::TruncatedHeader`] if `buf` is shorter than 40 bytes
    /// - [`ProtocolError::VersionMismatch`] if the version is not `expected`
    /// - [`ProtocolError::InvalidClientId`] if the identifier is not UTF-8
    pub fn decode(buf: &[u8], expected: ProtocolVersion) -> Result<Self, ProtocolError> {
        if buf.len() < Self::LEN {
            return Err(ProtocolError::TruncatedHeader {
                received: buf.len(),
            });
        }

        let version = &buf[..Self::MODE_AT];
        if version != expected.as_bytes() {
            return Err(ProtocolError::VersionMismatch {
                expected: expected.to_string(),
                received: String::from_utf8_lossy(version).into_owned(),
            });
        }

        let raw_id = &buf[Self::ID_AT..Self::LEN];
        let end = raw_id
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        let client_id = std::str::from_utf8(&raw_id[..end])
            .map_err(|_| ProtocolError::InvalidClientId)?;

        Ok(Self {
            version: expected,
            mode: GameMode(buf[Self::MODE_AT]),
            client_id: ClientId::new(client_id),
        })
    }
}
