//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding protocol data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a reply failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserializing a reply failed.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// Fewer than [`Header::LEN`](crate::Header::LEN) bytes were available.
    #[error("truncated header: got {received} of 40 bytes")]
    TruncatedHeader {
        /// How many header bytes arrived.
        received: usize,
    },

    /// The header carries a different protocol version than ours.
    #[error("version mismatch: expected {expected}, received {received}")]
    VersionMismatch {
        /// The version this side speaks.
        expected: String,
        /// What the peer sent, lossily decoded.
        received: String,
    },

    /// A protocol version string that is not exactly 3 ASCII bytes.
    #[error("invalid protocol version {0:?}: must be 3 ASCII bytes")]
    InvalidVersion(String),

    /// The client identifier field is not valid UTF-8.
    #[error("client identifier is not valid UTF-8")]
    InvalidClientId,
}
