//! The client registry: every client currently registered for a match.
//!
//! # Concurrency
//!
//! All sessions share one registry. [`ClientRegistry`] serializes every
//! operation behind a single mutex. Each method takes the lock, does one
//! map operation or scan, and releases it before returning, so the lock is
//! never held across I/O or an `.await`. Callers that want a different
//! locking strategy implement [`Registry`] themselves; sessions only see
//! the trait.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rendezvous_protocol::{ClientId, GameMode};

use crate::{ClientRecord, RegistryError};

/// Shared store of registered clients.
///
/// Each call is one atomic unit. Nothing spans two calls: a partner seen
/// by [`find_partner`](Self::find_partner) may be gone by the time the
/// caller acts on it, and two callers may see the same partner.
pub trait Registry: Send + Sync + 'static {
    /// Adds a record.
    ///
    /// # Errors
    /// Returns [`RegistryError::AlreadyRegistered`] if `client_id` is
    /// already present. The existing record is left untouched.
    fn register(
        &self,
        client_id: ClientId,
        address: String,
        mode: GameMode,
    ) -> Result<(), RegistryError>;

    /// Removes every record registered from `address`.
    ///
    /// Idempotent: returns the removed records, empty if there were none.
    fn unregister(&self, address: &str) -> Vec<ClientRecord>;

    /// Removes the record for `client_id`, if any.
    fn deregister(&self, client_id: &ClientId) -> Option<ClientRecord>;

    /// Returns `true` if `client_id` has a record.
    fn has(&self, client_id: &ClientId) -> bool;

    /// Returns a copy of the record for `client_id`.
    fn get(&self, client_id: &ClientId) -> Option<ClientRecord>;

    /// Returns the first record with `mode` whose id is not `excluding`.
    ///
    /// Iteration order is unspecified. Nothing is reserved or removed.
    fn find_partner(&self, mode: GameMode, excluding: &ClientId) -> Option<ClientRecord>;

    /// Returns a copy of every record.
    fn snapshot(&self) -> Vec<ClientRecord>;

    /// Returns the number of records.
    fn len(&self) -> usize;

    /// Returns `true` if there are no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A [`Registry`] behind one coarse lock.
///
/// Records are few and every operation is at most a linear scan, so a
/// single lock is enough; correctness only needs mutations serialized.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientId, ClientRecord>>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lock.
    ///
    /// Every mutation is a single `HashMap` call, so a panic elsewhere
    /// cannot leave the map half-updated and a poisoned lock is safe to
    /// keep using.
    fn lock(&self) -> MutexGuard<'_, HashMap<ClientId, ClientRecord>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Registry for ClientRegistry {
    fn register(
        &self,
        client_id: ClientId,
        address: String,
        mode: GameMode,
    ) -> Result<(), RegistryError> {
        let mut clients = self.lock();
        if clients.contains_key(&client_id) {
            return Err(RegistryError::AlreadyRegistered(client_id));
        }
        tracing::info!(%client_id, %address, mode = mode.0, "client registered");
        clients.insert(
            client_id.clone(),
            ClientRecord {
                address,
                client_id,
                mode,
            },
        );
        Ok(())
    }

    fn unregister(&self, address: &str) -> Vec<ClientRecord> {
        let mut clients = self.lock();
        let ids: Vec<ClientId> = clients
            .values()
            .filter(|record| record.address == address)
            .map(|record| record.client_id.clone())
            .collect();
        let removed: Vec<ClientRecord> = ids
            .iter()
            .filter_map(|id| clients.remove(id))
            .collect();
        drop(clients);

        for record in &removed {
            tracing::info!(client_id = %record.client_id, address, "client unregistered");
        }
        removed
    }

    fn deregister(&self, client_id: &ClientId) -> Option<ClientRecord> {
        let removed = self.lock().remove(client_id);
        if removed.is_some() {
            tracing::info!(%client_id, "client deregistered");
        }
        removed
    }

    fn has(&self, client_id: &ClientId) -> bool {
        self.lock().contains_key(client_id)
    }

    fn get(&self, client_id: &ClientId) -> Option<ClientRecord> {
        self.lock().get(client_id).cloned()
    }

    fn find_partner(&self, mode: GameMode, excluding: &ClientId) -> Option<ClientRecord> {
        self.lock()
            .values()
            .find(|record| record.mode == mode && record.client_id != *excluding)
            .cloned()
    }

    fn snapshot(&self) -> Vec<ClientRecord> {
        self.lock().values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

impl<R: Registry> Registry for Arc<R> {
    fn register(
        &self,
        client_id: ClientId,
        address: String,
        mode: GameMode,
    ) -> Result<(), RegistryError> {
        (**self).register(client_id, address, mode)
    }

    fn unregister(&self, address: &str) -> Vec<ClientRecord> {
        (**self).unregister(address)
    }

    fn deregister(&self, client_id: &ClientId) -> Option<ClientRecord> {
        (**self).deregister(client_id)
    }

    fn has(&self, client_id: &ClientId) -> bool {
        (**self).has(client_id)
    }

    fn get(&self, client_id: &ClientId) -> Option<ClientRecord> {
        (**self).get(client_id)
    }

    fn find_partner(&self, mode: GameMode, excluding: &ClientId) -> Option<ClientRecord> {
        (**self).find_partner(mode, excluding)
    }

    fn snapshot(&self) -> Vec<ClientRecord> {
        (**self).snapshot()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `ClientRegistry`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.

    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn cid(n: u8) -> ClientId {
        ClientId::new(format!("{n:0>36}"))
    }

    fn addr(n: u8) -> String {
        format!("127.0.0.1:{}", 4000 + u16::from(n))
    }

    fn registry_with(clients: &[(u8, u8)]) -> ClientRegistry {
        let reg = ClientRegistry::new();
        for &(n, mode) in clients {
            reg.register(cid(n), addr(n), GameMode(mode)).unwrap();
        }
        reg
    }

    // =====================================================================
    // register()
    // =====================================================================

    #[test]
    fn test_register_new_client_is_stored() {
        let reg = ClientRegistry::new();

        reg.register(cid(1), addr(1), GameMode(1)).expect("should succeed");

        let record = reg.get(&cid(1)).expect("record should exist");
        assert_eq!(record.address, addr(1));
        assert_eq!(record.mode, GameMode(1));
        assert_eq!(record.client_id, cid(1));
    }

    #[test]
    fn test_register_duplicate_id_returns_error_and_keeps_original() {
        let reg = registry_with(&[(1, 1)]);

        let result = reg.register(cid(1), addr(9), GameMode(2));

        assert!(
            matches!(result, Err(RegistryError::AlreadyRegistered(ref id)) if *id == cid(1)),
            "should reject duplicate id"
        );
        assert_eq!(reg.len(), 1);
        let record = reg.get(&cid(1)).unwrap();
        assert_eq!(record.address, addr(1), "original record must survive");
        assert_eq!(record.mode, GameMode(1));
    }

    // =====================================================================
    // unregister() / deregister()
    // =====================================================================

    #[test]
    fn test_unregister_removes_by_address() {
        let reg = registry_with(&[(1, 1), (2, 1)]);

        let removed = reg.unregister(&addr(1));

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].client_id, cid(1));
        assert!(!reg.has(&cid(1)));
        assert!(reg.has(&cid(2)));
    }

    #[test]
    fn test_unregister_unknown_address_is_noop() {
        let reg = registry_with(&[(1, 1)]);

        assert!(reg.unregister("10.9.9.9:1").is_empty());
        assert!(reg.unregister("10.9.9.9:1").is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_unregister_twice_is_idempotent() {
        let reg = registry_with(&[(1, 1)]);

        assert_eq!(reg.unregister(&addr(1)).len(), 1);
        assert!(reg.unregister(&addr(1)).is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_deregister_returns_removed_record() {
        let reg = registry_with(&[(1, 3)]);

        let removed = reg.deregister(&cid(1)).expect("should remove");
        assert_eq!(removed.mode, GameMode(3));
        assert!(reg.deregister(&cid(1)).is_none());
    }

    #[test]
    fn test_register_after_unregister_succeeds() {
        let reg = registry_with(&[(1, 1)]);
        reg.unregister(&addr(1));

        reg.register(cid(1), addr(1), GameMode(2)).expect("id is free again");
        assert_eq!(reg.get(&cid(1)).unwrap().mode, GameMode(2));
    }

    // =====================================================================
    // find_partner()
    // =====================================================================

    #[test]
    fn test_find_partner_same_mode_returns_other_client() {
        let reg = registry_with(&[(1, 1), (2, 1)]);

        let partner = reg.find_partner(GameMode(1), &cid(1)).expect("should find");
        assert_eq!(partner.client_id, cid(2));
        assert_eq!(partner.address, addr(2));

        let partner = reg.find_partner(GameMode(1), &cid(2)).expect("should find");
        assert_eq!(partner.client_id, cid(1));
    }

    #[test]
    fn test_find_partner_never_returns_self() {
        let reg = registry_with(&[(1, 1)]);

        assert!(reg.find_partner(GameMode(1), &cid(1)).is_none());
    }

    #[test]
    fn test_find_partner_ignores_other_modes() {
        let reg = registry_with(&[(1, 1), (2, 2)]);

        assert!(reg.find_partner(GameMode(1), &cid(1)).is_none());
        assert!(reg.find_partner(GameMode(2), &cid(2)).is_none());
    }

    #[test]
    fn test_find_partner_does_not_remove() {
        let reg = registry_with(&[(1, 1), (2, 1)]);

        reg.find_partner(GameMode(1), &cid(1)).unwrap();
        reg.find_partner(GameMode(1), &cid(1)).unwrap();

        assert_eq!(reg.len(), 2);
    }

    // =====================================================================
    // snapshot() / len() / Arc
    // =====================================================================

    #[test]
    fn test_snapshot_lists_every_record() {
        let reg = registry_with(&[(1, 1), (2, 2), (3, 1)]);

        let mut ids: Vec<ClientId> = reg.snapshot().into_iter().map(|r| r.client_id).collect();
        ids.sort();

        assert_eq!(ids, vec![cid(1), cid(2), cid(3)]);
    }

    #[test]
    fn test_arc_registry_shares_state() {
        let reg = Arc::new(ClientRegistry::new());
        let other = Arc::clone(&reg);

        reg.register(cid(1), addr(1), GameMode(1)).unwrap();

        assert!(other.has(&cid(1)));
        assert_eq!(Registry::len(&other), 1);
    }
}
