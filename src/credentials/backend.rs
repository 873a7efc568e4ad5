//! Persistence seam for the token store.
//!
//! The store is non-durable by default. A durable backend (database, file,
//! key-value service) implements [`CredentialBackend`] and is handed to
//! [`TokenStore::with_backend`](super::TokenStore::with_backend).

use super::CredentialRecord;
use anyhow::Result;

/// Loads and saves the full set of credential records.
pub trait CredentialBackend: Send + Sync {
    /// Records to seed the store with at startup.
    fn load(&self) -> Result<Vec<CredentialRecord>>;

    /// Called after every write with the full, insertion-ordered record set.
    fn save(&self, records: &[CredentialRecord]) -> Result<()>;
}

/// Backend that keeps nothing. Records vanish on process restart.
#[derive(Debug, Default, Clone, Copy)]
pub struct EphemeralBackend;

impl CredentialBackend for EphemeralBackend {
    fn load(&self) -> Result<Vec<CredentialRecord>> {
        Ok(Vec::new())
    }

    fn save(&self, _records: &[CredentialRecord]) -> Result<()> {
        Ok(())
    }
}
