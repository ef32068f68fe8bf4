//! Error types for the registry layer.

use rendezvous_protocol::ClientId;

/// Errors returned by registry mutations.
///
/// A failed mutation leaves the registry exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A record with this identifier already exists.
    #[error("client {0} is already registered")]
    AlreadyRegistered(ClientId),
}
