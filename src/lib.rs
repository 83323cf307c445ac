//! Beewallet: single-wallet Bitcoin session core. Sync, credentials, send pipeline.
//!
//! # Architecture
//!
//! ```text
//! WalletClient (entry point, built from SessionConfig)
//!   │
//!   ├── OnboardingController ── choose network/URL, create/restore, delete
//!   │
//!   ├── WalletSession ── balance, transactions, price, sync status
//!   │     ├── SyncStateMachine (one sync in flight)
//!   │     └── listens for TransactionSent → full_refresh
//!   │
//!   ├── TransactionBuilder ── amount → address → fee → build → send
//!   │
//!   ├── CredentialVault ── BackupInfo, SelectedNetwork, SelectedEsploraURL
//!   │     └── SecretStore (file | memory)
//!   │
//!   └── WalletEngine (BdkEngine with `bdk`), FeeOracle, PriceOracle
//! ```
//!
//! # Features
//!
//! - `bdk` - BDK 2.x engine with file-store persistence and an Esplora backend
//!
//! # Usage
//!
//! ```ignore
//! use beewallet::{NetworkSelection, SessionConfig, WalletClient};
//!
//! let client = WalletClient::with_bdk(SessionConfig::from_env());
//! if client.onboarding().is_onboarding() {
//!     client.onboarding().choose_network(NetworkSelection::Signet)?;
//!     client.onboarding().create_wallet("").await?;
//! }
//! client.start().await?;
//!
//! let mut send = client.send_pipeline();
//! send.set_amount(100_000)?;
//! send.set_address("tb1p...")?;
//! send.select_fee().await?;
//! send.build().await?;
//! let txid = send.send().await?;
//! ```

pub mod client;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod logging;
pub mod onboarding;
pub mod oracle;
pub mod send;
pub mod session;
pub mod settings;
pub mod vault;

pub use client::WalletClient;
pub use config::SessionConfig;
pub use self::core::{BackendCatalog, BalanceSnapshot, BuiltTx, Confirmation, Direction, NetworkSelection, TransactionRecord, Txid};
pub use engine::{EngineSettings, WalletEngine};
pub use error::{
    EngineError, EngineResult, FeeError, OnboardingError, OracleError, PriceError, SendError, SessionError,
    SessionErrorKind, SettingsError, VaultError, VaultResult,
};
pub use logging::init_logging;
pub use onboarding::OnboardingController;
pub use oracle::{CurrencyCode, FeeMenu, FeeOracle, FeePriority, FeeTier, MempoolFeeClient, MempoolPriceClient, Price, PriceOracle, RecommendedFees};
pub use send::{PendingSend, SendStage, TransactionBuilder};
pub use session::{SyncStateMachine, SyncStatus, TransactionEvents, TransactionSent, WalletSession};
pub use settings::{AppSettings, FileSettings, MemorySettings, SettingsStore};
pub use vault::{BackupMaterial, CredentialVault, FileSecretStore, MemorySecretStore, SecretStore};

#[cfg(feature = "bdk")]
pub use engine::BdkEngine;
