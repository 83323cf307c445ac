//! Session configuration - passed from the hosting app or read from the environment

use std::path::PathBuf;
use std::time::Duration;

use crate::core::keys::{env, files, oracle};
use crate::core::BackendCatalog;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub app: String,
    /// Overrides `<data root>/<app>`
    pub data_dir: Option<PathBuf>,
    pub fee_url: String,
    pub price_url: String,
    pub http_timeout: Duration,
    pub catalog: BackendCatalog,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app: "beewallet".into(),
            data_dir: None,
            fee_url: oracle::FEES_URL.into(),
            price_url: oracle::PRICES_URL.into(),
            http_timeout: Duration::from_secs(oracle::HTTP_TIMEOUT_SECS),
            catalog: BackendCatalog::default(),
        }
    }
}

impl SessionConfig {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into(), ..Default::default() }
    }
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self { self.data_dir = Some(path.into()); self }
    pub fn with_fee_url(mut self, url: impl Into<String>) -> Self { self.fee_url = url.into(); self }
    pub fn with_price_url(mut self, url: impl Into<String>) -> Self { self.price_url = url.into(); self }
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self { self.http_timeout = timeout; self }
    pub fn with_catalog(mut self, catalog: BackendCatalog) -> Self { self.catalog = catalog; self }

    /// Defaults overridden by any `BEEWALLET_*` variables that are set.
    pub fn from_env() -> Self {
        let mut config = Self::new(read_env(env::APP).unwrap_or_else(|| "beewallet".into()));
        if let Some(dir) = read_env(env::DATA_DIR) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = read_env(env::FEE_URL) {
            config.fee_url = url;
        }
        if let Some(url) = read_env(env::PRICE_URL) {
            config.price_url = url;
        }
        match read_env(env::HTTP_TIMEOUT_SECS).map(|v| v.parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
            Some(_) => tracing::warn!(var = env::HTTP_TIMEOUT_SECS, "Ignoring invalid HTTP timeout"),
            None => {}
        }
        config
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| data_root().join(&self.app))
    }
    pub fn vault_dir(&self) -> PathBuf { self.data_dir().join(files::VAULT_DIR) }
    pub fn settings_path(&self) -> PathBuf { self.data_dir().join(files::SETTINGS) }
    pub fn wallet_db_path(&self) -> PathBuf { self.data_dir().join(files::WALLET_DB) }
}

/// `BEEWALLET_ROOT`, else the platform local data dir, else the working directory.
pub fn data_root() -> PathBuf {
    std::env::var(env::ROOT)
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")))
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
