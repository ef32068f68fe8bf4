/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer closed the stream on a frame boundary.
    #[error("connection closed")]
    ConnectionClosed,

    /// The stream ended part-way through a length prefix, payload, or
    /// fixed-size read.
    #[error("truncated read: expected {expected} bytes, got {received}")]
    Truncated {
        /// Bytes the reader was waiting for.
        expected: usize,
        /// Bytes that actually arrived before EOF.
        received: usize,
    },

    /// The length prefix was negative.
    #[error("invalid frame length {0}")]
    InvalidLength(i32),

    /// The declared or outgoing frame exceeds the configured maximum.
    #[error("frame of {size} bytes exceeds maximum {max}")]
    FrameTooLarge {
        /// Size of the offending frame.
        size: usize,
        /// The configured maximum.
        max: usize,
    },

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding, connecting, or accepting failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}

impl TransportError {
    /// Returns `true` for errors caused by a malformed byte stream rather
    /// than by the network itself.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. } | Self::InvalidLength(_) | Self::FrameTooLarge { .. }
        )
    }
}
