//! Wallet engine - the capability surface the session drives.
//!
//! The engine owns keys, UTXOs and chain data. Everything here is async at the
//! boundary; blocking engines move their work onto `spawn_blocking`.
//!
//! | Operation | Returns |
//! |-----------|---------|
//! | `create_wallet` | fresh or restored wallet, its backup material |
//! | `load_wallet` | opens a wallet from stored backup material |
//! | `delete_wallet` | drops the wallet and its local chain data |
//! | `address` | next unused receive address |
//! | `balance` / `transactions` | last-known engine state |
//! | `sync` | full scan against the backend |
//! | `build_transaction` | fee quote, nothing broadcast |
//! | `broadcast` | build, sign and publish; txid |

#[cfg(feature = "bdk")]
mod bdk;

#[cfg(feature = "bdk")]
pub use bdk::BdkEngine;

use async_trait::async_trait;

use crate::core::{BalanceSnapshot, BuiltTx, NetworkSelection, TransactionRecord};
use crate::error::EngineResult;
use crate::vault::BackupMaterial;

/// Network and backend the engine should talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub network: NetworkSelection,
    pub backend_url: String,
}

impl EngineSettings {
    pub fn new(network: NetworkSelection, backend_url: impl Into<String>) -> Self {
        Self { network, backend_url: backend_url.into() }
    }
}

#[async_trait]
pub trait WalletEngine: Send + Sync {
    /// `None` generates a fresh mnemonic; `Some(words)` restores from it.
    async fn create_wallet(&self, mnemonic: Option<String>, settings: &EngineSettings) -> EngineResult<BackupMaterial>;
    async fn load_wallet(&self, backup: &BackupMaterial, settings: &EngineSettings) -> EngineResult<()>;
    async fn delete_wallet(&self) -> EngineResult<()>;

    async fn address(&self) -> EngineResult<String>;
    async fn balance(&self) -> EngineResult<BalanceSnapshot>;
    async fn transactions(&self) -> EngineResult<Vec<TransactionRecord>>;
    async fn sync(&self) -> EngineResult<()>;

    async fn build_transaction(&self, address: &str, amount_sats: u64, fee_rate: f32) -> EngineResult<BuiltTx>;
    async fn broadcast(&self, address: &str, amount_sats: u64, fee_rate: f32) -> EngineResult<String>;
}
