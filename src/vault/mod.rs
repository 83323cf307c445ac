//! Credential vault - typed key/value contract over a platform secret store.
//!
//! ```text
//! CredentialVault
//!     │  BackupInfo          → JSON BackupMaterial (camelCase)
//!     │  SelectedNetwork     → bitcoin | testnet | signet | regtest
//!     │  SelectedEsploraURL  → backend URL
//!     ▼
//! SecretStore (FileSecretStore | MemorySecretStore)
//! ```

pub(crate) mod file;
mod memory;

pub use file::FileSecretStore;
pub use memory::MemorySecretStore;

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::keys::vault as keys;
use crate::core::NetworkSelection;
use crate::error::{VaultError, VaultResult};

/// Platform secret-storage primitive.
pub trait SecretStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    fn read(&self, key: &str) -> VaultResult<Option<Vec<u8>>>;
    fn write(&self, key: &str, value: &[u8]) -> VaultResult<()>;
    /// Removing a missing key succeeds.
    fn remove(&self, key: &str) -> VaultResult<()>;
}

/// Wallet secrets produced once at creation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct BackupMaterial {
    pub mnemonic: String,
    pub descriptor: String,
    pub change_descriptor: String,
}

impl BackupMaterial {
    pub fn new(mnemonic: impl Into<String>, descriptor: impl Into<String>, change_descriptor: impl Into<String>) -> Self {
        Self { mnemonic: mnemonic.into(), descriptor: descriptor.into(), change_descriptor: change_descriptor.into() }
    }

    pub fn words(&self) -> Vec<&str> { self.mnemonic.split_whitespace().collect() }
}

impl std::fmt::Debug for BackupMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupMaterial")
            .field("mnemonic", &"<redacted>")
            .field("descriptor", &"<redacted>")
            .field("change_descriptor", &"<redacted>")
            .finish()
    }
}

pub struct CredentialVault {
    store: Box<dyn SecretStore>,
    writes: Mutex<()>,
}

impl CredentialVault {
    pub fn new(store: impl SecretStore + 'static) -> Self {
        Self { store: Box::new(store), writes: Mutex::new(()) }
    }

    pub fn in_memory() -> Self { Self::new(MemorySecretStore::default()) }

    // Backup

    pub fn save_backup(&self, backup: &BackupMaterial) -> VaultResult<()> {
        let mut json = serde_json::to_vec(backup).map_err(|e| VaultError::WriteFailed(e.to_string()))?;
        let result = self.put(keys::BACKUP_INFO, &json);
        json.zeroize();
        result
    }

    pub fn get_backup(&self) -> VaultResult<BackupMaterial> {
        let mut raw = self.store.read(keys::BACKUP_INFO)?.ok_or(VaultError::NotFound(keys::BACKUP_INFO))?;
        let parsed = serde_json::from_slice(&raw).map_err(|e| VaultError::ReadFailed(format!("{}: {}", keys::BACKUP_INFO, e)));
        raw.zeroize();
        parsed
    }

    pub fn delete_backup(&self) -> VaultResult<()> { self.del(keys::BACKUP_INFO) }

    // Network

    pub fn save_network(&self, network: NetworkSelection) -> VaultResult<()> {
        self.put(keys::SELECTED_NETWORK, network.as_str().as_bytes())
    }

    /// `None` when absent. An unrecognised stored value is logged and treated as absent.
    pub fn get_network(&self) -> VaultResult<Option<NetworkSelection>> {
        let Some(raw) = self.get_string(keys::SELECTED_NETWORK)? else { return Ok(None) };
        let network = NetworkSelection::from_str(&raw);
        if network.is_none() {
            warn!(value = %raw, "Ignoring unknown stored network");
        }
        Ok(network)
    }

    pub fn delete_network(&self) -> VaultResult<()> { self.del(keys::SELECTED_NETWORK) }

    // Backend URL

    pub fn save_backend_url(&self, url: &str) -> VaultResult<()> {
        self.put(keys::SELECTED_ESPLORA_URL, url.as_bytes())
    }

    pub fn get_backend_url(&self) -> VaultResult<Option<String>> { self.get_string(keys::SELECTED_ESPLORA_URL) }

    pub fn delete_backend_url(&self) -> VaultResult<()> { self.del(keys::SELECTED_ESPLORA_URL) }

    fn get_string(&self, key: &'static str) -> VaultResult<Option<String>> {
        match self.store.read(key)? {
            None => Ok(None),
            Some(raw) => String::from_utf8(raw)
                .map(Some)
                .map_err(|e| VaultError::ReadFailed(format!("{}: {}", key, e))),
        }
    }

    fn put(&self, key: &'static str, value: &[u8]) -> VaultResult<()> {
        let _guard = self.writes.lock().map_err(|_| VaultError::WriteFailed("vault lock poisoned".into()))?;
        self.store.write(key, value)?;
        debug!(key, "Vault write");
        Ok(())
    }

    fn del(&self, key: &'static str) -> VaultResult<()> {
        let _guard = self.writes.lock().map_err(|_| VaultError::WriteFailed("vault lock poisoned".into()))?;
        self.store.remove(key)?;
        debug!(key, "Vault delete");
        Ok(())
    }
}
