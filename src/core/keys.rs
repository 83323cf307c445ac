//! Key and name constants
//!
//! Centralized registry for vault keys, on-disk names and environment variables.

/// Credential vault keys
pub mod vault {
    pub const BACKUP_INFO: &str = "BackupInfo";
    pub const SELECTED_NETWORK: &str = "SelectedNetwork";
    pub const SELECTED_ESPLORA_URL: &str = "SelectedEsploraURL";

    pub const ALL: &[&str] = &[BACKUP_INFO, SELECTED_NETWORK, SELECTED_ESPLORA_URL];
}

/// Files and directories under the per-app data root
pub mod files {
    pub const VAULT_DIR: &str = "vault";
    pub const SETTINGS: &str = "settings.json";
    pub const WALLET_DB: &str = "wallet.db";
}

/// Environment variables read by `SessionConfig::from_env` and `init_logging`
pub mod env {
    pub const ROOT: &str = "BEEWALLET_ROOT";
    pub const APP: &str = "BEEWALLET_APP";
    pub const DATA_DIR: &str = "BEEWALLET_DATA_DIR";
    pub const FEE_URL: &str = "BEEWALLET_FEE_URL";
    pub const PRICE_URL: &str = "BEEWALLET_PRICE_URL";
    pub const HTTP_TIMEOUT_SECS: &str = "BEEWALLET_HTTP_TIMEOUT_SECS";
    pub const LOG_JSON: &str = "BEEWALLET_LOG_JSON";
}

/// Oracle endpoints (mempool.space REST API)
pub mod oracle {
    pub const FEES_URL: &str = "https://mempool.space/api/v1/fees/recommended";
    pub const PRICES_URL: &str = "https://mempool.space/api/v1/prices";
    pub const HTTP_TIMEOUT_SECS: u64 = 20;
}

/// Session log contexts, used as the prefix of stored error messages
pub mod context {
    pub const SYNC: &str = "Error during sync";
    pub const BALANCE: &str = "Error getting balance";
    pub const TRANSACTIONS: &str = "Error getting transactions";
    pub const PRICE: &str = "Error getting prices";
    pub const ADDRESS: &str = "Error getting address";
    pub const LOAD: &str = "Error loading wallet";
    pub const SEED: &str = "Could not show seed";
}
