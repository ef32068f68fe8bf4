//! Unified error type for Rendezvous.

use rendezvous_match::{DirectoryError, MatchError};
use rendezvous_protocol::{ClientId, ProtocolError};
use rendezvous_registry::RegistryError;
use rendezvous_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Every variant ends the session it occurs in. Which ones count as a
/// misbehaving client and which as a network failure is answered by
/// [`is_transport`](Self::is_transport) and
/// [`is_protocol_violation`](Self::is_protocol_violation).
#[derive(Debug, thiserror::Error)]
pub enum RendezvousError {
    /// A transport-level error (bind, send, recv, framing).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (header, version, reply codec).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry mutation was rejected.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A match request was rejected.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// The game-server directory could not be loaded.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A known command arrived in a state that does not accept it.
    #[error("unexpected {command:?} while {state}")]
    UnexpectedCommand {
        /// Name of the session state.
        state: &'static str,
        /// The command as received.
        command: String,
    },

    /// A header carried an identifier other than the one issued to this
    /// connection.
    #[error("identity mismatch: issued {expected}, header carried {received}")]
    IdentityMismatch {
        /// The identifier issued on "hello".
        expected: ClientId,
        /// The identifier found in the header.
        received: ClientId,
    },

    /// A second "token" on a connection that already registered.
    #[error("client {0} already has a token")]
    DuplicateToken(ClientId),

    /// No frame arrived within the configured read timeout.
    #[error("read timed out")]
    TimedOut,

    /// A client-side call that needs an identifier ran before "hello".
    #[error("no identifier issued yet")]
    NoIdentity,
}

impl RendezvousError {
    /// Returns `true` for network failures: resets, failed writes,
    /// timeouts.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(e) => !e.is_malformed(),
            Self::TimedOut => true,
            _ => false,
        }
    }

    /// Returns `true` when the peer broke the protocol: malformed frames,
    /// bad headers, wrong identity, out-of-order commands.
    pub fn is_protocol_violation(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_malformed(),
            Self::Protocol(_)
            | Self::Registry(_)
            | Self::Match(_)
            | Self::UnexpectedCommand { .. }
            | Self::IdentityMismatch { .. }
            | Self::DuplicateToken(_) => true,
            Self::Directory(_) | Self::TimedOut | Self::NoIdentity => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: RendezvousError = TransportError::ConnectionClosed.into();
        assert!(matches!(err, RendezvousError::Transport(_)));
        assert!(err.is_transport());
        assert!(!err.is_protocol_violation());
    }

    #[test]
    fn test_malformed_frame_is_protocol_violation() {
        let err: RendezvousError = TransportError::InvalidLength(-5).into();
        assert!(err.is_protocol_violation());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_from_protocol_error() {
        let err: RendezvousError = ProtocolError::TruncatedHeader { received: 3 }.into();
        assert!(matches!(err, RendezvousError::Protocol(_)));
        assert!(err.is_protocol_violation());
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_from_match_error() {
        let err: RendezvousError = MatchError::NoToken(ClientId::new("x")).into();
        assert!(matches!(err, RendezvousError::Match(MatchError::NoToken(_))));
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_from_registry_error() {
        let err: RendezvousError = RegistryError::AlreadyRegistered(ClientId::new("x")).into();
        assert!(matches!(err, RendezvousError::Registry(_)));
    }

    #[test]
    fn test_timed_out_is_transport() {
        assert!(RendezvousError::TimedOut.is_transport());
    }
}
