//! Codec trait and implementations for the structured replies the server
//! sends back (the fixed-size header has its own hand-laid codec in
//! [`header`](crate::header)).

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use rendezvous_protocol::{Codec, JsonCodec, MatchReply};
///
/// let bytes = JsonCodec.encode(&MatchReply::Waiting).unwrap();
/// assert_eq!(bytes, br#"{"status":"Waiting"}"#);
///
/// let decoded: MatchReply = JsonCodec.decode(&bytes).unwrap();
/// assert_eq!(decoded, MatchReply::Waiting);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
