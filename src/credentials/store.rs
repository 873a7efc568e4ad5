//! Process-wide token store keyed by user id.

use super::backend::{CredentialBackend, EphemeralBackend};
use super::CredentialRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, warn};

#[derive(Default)]
struct Inner {
    records: HashMap<String, CredentialRecord>,
    /// First-insertion order of user ids
    order: Vec<String>,
}

impl Inner {
    fn snapshot(&self) -> Vec<CredentialRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect()
    }
}

/// In-memory credential store.
///
/// # Thread Safety
/// - One `RwLock` guards both the map and the ordering, so a concurrent
///   `get` never observes a half-applied `put` or `delete`
/// - Backend `save` runs under the write lock so saves are never reordered
pub struct TokenStore {
    inner: RwLock<Inner>,
    backend: Box<dyn CredentialBackend>,
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore {
    /// Creates an empty, non-durable store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            backend: Box::new(EphemeralBackend),
        }
    }

    /// Creates a store seeded from `backend` that saves back after every write.
    pub fn with_backend(backend: Box<dyn CredentialBackend>) -> anyhow::Result<Self> {
        let mut inner = Inner::default();
        for record in backend.load()? {
            if !inner.records.contains_key(&record.user_id) {
                inner.order.push(record.user_id.clone());
            }
            inner.records.insert(record.user_id.clone(), record);
        }
        debug!(count = inner.order.len(), "Token store loaded from backend");

        Ok(Self {
            inner: RwLock::new(inner),
            backend,
        })
    }

    /// Stores `record`, replacing any prior record for the same user id.
    ///
    /// An overwrite keeps the user's original position in [`list_ids`](Self::list_ids).
    pub fn put(&self, record: CredentialRecord) {
        let mut inner = self.inner.write().expect("TokenStore lock poisoned");
        let user_id = record.user_id.clone();
        if inner.records.insert(user_id.clone(), record).is_none() {
            inner.order.push(user_id);
        }
        self.persist(&inner);
    }

    /// Returns a copy of the record for `user_id`.
    pub fn get(&self, user_id: &str) -> Option<CredentialRecord> {
        let inner = self.inner.read().expect("TokenStore lock poisoned");
        inner.records.get(user_id).cloned()
    }

    /// Removes the record for `user_id`. Removing an absent id is a no-op.
    pub fn delete(&self, user_id: &str) -> Option<CredentialRecord> {
        let mut inner = self.inner.write().expect("TokenStore lock poisoned");
        let removed = inner.records.remove(user_id)?;
        inner.order.retain(|id| id != user_id);
        self.persist(&inner);
        Some(removed)
    }

    /// Removes the record for `user_id` only if it is no longer valid at `now`.
    ///
    /// Validity is re-checked under the write lock, so a fresh record stored
    /// by a concurrent `put` is never evicted.
    pub fn remove_if_invalid(&self, user_id: &str, now: DateTime<Utc>) -> Option<CredentialRecord> {
        let mut inner = self.inner.write().expect("TokenStore lock poisoned");
        if inner.records.get(user_id)?.is_valid(now) {
            return None;
        }
        let removed = inner.records.remove(user_id)?;
        inner.order.retain(|id| id != user_id);
        self.persist(&inner);
        Some(removed)
    }

    /// User ids with a stored record, in insertion order.
    pub fn list_ids(&self) -> Vec<String> {
        let inner = self.inner.read().expect("TokenStore lock poisoned");
        inner.order.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("TokenStore lock poisoned").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, inner: &Inner) {
        if let Err(e) = self.backend.save(&inner.snapshot()) {
            warn!(error = %e, "Failed to save credentials to backend");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::sample_record;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_put_and_get() {
        let store = TokenStore::new();
        store.put(sample_record("1", "gho_one"));

        let record = store.get("1").unwrap();
        assert_eq!(record.access_token, "gho_one");
        assert!(store.get("2").is_none());
    }

    #[test]
    fn test_put_overwrites_same_user() {
        let store = TokenStore::new();
        store.put(sample_record("1", "gho_old"));
        store.put(sample_record("1", "gho_new"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("1").unwrap().access_token, "gho_new");
    }

    #[test]
    fn test_list_ids_insertion_order() {
        let store = TokenStore::new();
        store.put(sample_record("c", "t1"));
        store.put(sample_record("a", "t2"));
        store.put(sample_record("b", "t3"));
        // Overwrite keeps position
        store.put(sample_record("c", "t4"));

        assert_eq!(store.list_ids(), vec!["c", "a", "b"]);

        store.delete("a");
        store.put(sample_record("a", "t5"));
        assert_eq!(store.list_ids(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = TokenStore::new();
        store.put(sample_record("1", "gho_one"));

        assert!(store.delete("1").is_some());
        assert!(store.delete("1").is_none());
        assert!(store.get("1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_if_invalid_keeps_valid_record() {
        let store = TokenStore::new();
        let now = Utc::now();
        let mut expired = sample_record("1", "gho_old");
        expired.expires_at = Some(now - chrono::Duration::seconds(1));
        store.put(expired);

        // A re-login replaces the expired record before eviction runs
        store.put(sample_record("1", "gho_fresh"));
        assert!(store.remove_if_invalid("1", now).is_none());
        assert_eq!(store.get("1").unwrap().access_token, "gho_fresh");

        let mut expired = sample_record("1", "gho_old");
        expired.expires_at = Some(now - chrono::Duration::seconds(1));
        store.put(expired);
        assert!(store.remove_if_invalid("1", now).is_some());
        assert!(store.get("1").is_none());
        assert!(store.remove_if_invalid("1", now).is_none());
    }

    #[test]
    fn test_concurrent_writers() {
        let store = Arc::new(TokenStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let id = format!("user-{}", j % 10);
                        store.put(sample_record(&id, &format!("tok-{}-{}", i, j)));
                        let _ = store.get(&id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 10);
        let ids = store.list_ids();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    /// Records every save call, seeded with a fixed load result.
    struct RecordingBackend {
        seed: Vec<CredentialRecord>,
        saves: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl CredentialBackend for RecordingBackend {
        fn load(&self) -> anyhow::Result<Vec<CredentialRecord>> {
            Ok(self.seed.clone())
        }

        fn save(&self, records: &[CredentialRecord]) -> anyhow::Result<()> {
            let ids = records.iter().map(|r| r.user_id.clone()).collect();
            self.saves.lock().unwrap().push(ids);
            Ok(())
        }
    }

    #[test]
    fn test_backend_load_and_save() {
        let saves = Arc::new(Mutex::new(Vec::new()));
        let backend = RecordingBackend {
            seed: vec![sample_record("seed", "gho_seed")],
            saves: Arc::clone(&saves),
        };

        let store = TokenStore::with_backend(Box::new(backend)).unwrap();
        assert_eq!(store.list_ids(), vec!["seed"]);

        store.put(sample_record("2", "gho_two"));
        store.delete("seed");
        // Deleting an absent user does not trigger a save
        store.delete("missing");

        let saves = saves.lock().unwrap();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0], vec!["seed", "2"]);
        assert_eq!(saves[1], vec!["2"]);
    }

    #[test]
    fn test_failing_backend_does_not_block_writes() {
        struct FailingBackend;
        impl CredentialBackend for FailingBackend {
            fn load(&self) -> anyhow::Result<Vec<CredentialRecord>> {
                Ok(Vec::new())
            }
            fn save(&self, _records: &[CredentialRecord]) -> anyhow::Result<()> {
                Err(anyhow::anyhow!("disk full"))
            }
        }

        let store = TokenStore::with_backend(Box::new(FailingBackend)).unwrap();
        store.put(sample_record("1", "gho_one"));
        assert!(store.get("1").is_some());
    }
}
