//! Client identifier issuing.
//!
//! Identifiers are assigned by the server, never chosen by the client.
//! The [`IdentityIssuer`] trait lets tests plug in deterministic ids.

use rendezvous_protocol::ClientId;

/// Hands out a fresh identifier for every new connection.
pub trait IdentityIssuer: Send + Sync + 'static {
    /// Returns an identifier no other live connection holds.
    ///
    /// Issued identifiers are exactly [`ClientId::LEN`] printable bytes.
    fn issue(&self) -> ClientId;
}

/// Issues random (v4) UUIDs in their 36-character hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIssuer;

impl IdentityIssuer for UuidIssuer {
    fn issue(&self) -> ClientId {
        ClientId::new(uuid::Uuid::new_v4().hyphenated().to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_uuid_issuer_issues_36_printable_bytes() {
        let id = UuidIssuer.issue();
        assert_eq!(id.as_str().len(), ClientId::LEN);
        assert!(id.is_well_formed());
    }

    #[test]
    fn test_uuid_issuer_ids_are_unique() {
        let ids: HashSet<ClientId> = (0..1000).map(|_| UuidIssuer.issue()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
