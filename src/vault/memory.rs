//! In-memory secret store for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::RwLock;

use super::SecretStore;
use crate::error::{VaultError, VaultResult};

#[derive(Default)]
pub struct MemorySecretStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl SecretStore for MemorySecretStore {
    fn read(&self, key: &str) -> VaultResult<Option<Vec<u8>>> {
        let entries = self.entries.read().map_err(|_| VaultError::ReadFailed("lock".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> VaultResult<()> {
        let mut entries = self.entries.write().map_err(|_| VaultError::WriteFailed("lock".into()))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> VaultResult<()> {
        let mut entries = self.entries.write().map_err(|_| VaultError::WriteFailed("lock".into()))?;
        entries.remove(key);
        Ok(())
    }
}
