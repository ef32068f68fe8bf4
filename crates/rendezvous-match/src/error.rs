//! Error types for the matching layer.

use rendezvous_protocol::ClientId;

/// Errors that end a match request.
///
/// Not finding a partner or a server is not an error; see
/// [`MatchOutcome`](crate::MatchOutcome).
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The requester has no registry entry (it never sent a valid "token",
    /// or its record was removed).
    #[error("client {0} has no token")]
    NoToken(ClientId),
}

/// Errors loading a game-server directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// The directory file could not be read.
    #[error("failed to read directory file: {0}")]
    Io(#[from] std::io::Error),

    /// The directory file is not a valid JSON server list.
    #[error("invalid directory JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
