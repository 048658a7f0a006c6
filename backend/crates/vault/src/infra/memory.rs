//! Transient In-Memory Storage
//!
//! The process-scoped equivalent of a browser tab's session storage:
//! contents do not survive process teardown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::repository::CredentialStorage;
use crate::error::VaultResult;

/// In-memory credential storage
#[derive(Clone, Default)]
pub struct TransientStorage {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl TransientStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // Short critical sections only; recover a poisoned lock
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStorage for TransientStorage {
    fn get(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> VaultResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> VaultResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let storage = TransientStorage::new();

        assert_eq!(storage.get("k").unwrap(), None);

        storage.put("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v".to_string()));

        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);

        // Removing an absent key is harmless
        storage.remove("k").unwrap();
    }

    #[test]
    fn test_clones_share_contents() {
        let storage = TransientStorage::new();
        let clone = storage.clone();

        storage.put("k", "v").unwrap();
        assert_eq!(clone.get("k").unwrap(), Some("v".to_string()));
    }
}
