//! Wallet client - wires config, vault, settings, oracles, session and onboarding.

use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::engine::WalletEngine;
use crate::error::{SessionError, SettingsError};
use crate::oracle::{FeeOracle, MempoolFeeClient, MempoolPriceClient, PriceOracle};
use crate::onboarding::OnboardingController;
use crate::send::TransactionBuilder;
use crate::session::{SyncStatus, TransactionEvents, WalletSession};
use crate::settings::{AppSettings, FileSettings, SettingsStore};
use crate::vault::{CredentialVault, FileSecretStore};

/// Everything one app instance needs, built from a [`SessionConfig`].
pub struct WalletClient {
    config: SessionConfig,
    engine: Arc<dyn WalletEngine>,
    vault: Arc<CredentialVault>,
    settings: Arc<dyn SettingsStore>,
    fees: Arc<dyn FeeOracle>,
    events: TransactionEvents,
    session: Arc<WalletSession>,
    onboarding: OnboardingController,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl WalletClient {
    /// File-backed vault and settings under the config's data dir, mempool.space oracles.
    pub fn from_config(config: SessionConfig, engine: Arc<dyn WalletEngine>) -> Self {
        let vault = Arc::new(CredentialVault::new(FileSecretStore::new(config.vault_dir())));
        let settings: Arc<dyn SettingsStore> = Arc::new(FileSettings::new(config.settings_path()));
        let fees: Arc<dyn FeeOracle> = Arc::new(MempoolFeeClient::new(config.fee_url.clone(), config.http_timeout));
        let prices: Arc<dyn PriceOracle> = Arc::new(MempoolPriceClient::new(config.price_url.clone(), config.http_timeout));
        Self::from_parts(config, engine, vault, settings, fees, prices)
    }

    /// BDK engine with its database at the config's wallet path.
    #[cfg(feature = "bdk")]
    pub fn with_bdk(config: SessionConfig) -> Self {
        let engine = Arc::new(crate::engine::BdkEngine::new(config.wallet_db_path()));
        Self::from_config(config, engine)
    }

    pub fn from_parts(
        config: SessionConfig,
        engine: Arc<dyn WalletEngine>,
        vault: Arc<CredentialVault>,
        settings: Arc<dyn SettingsStore>,
        fees: Arc<dyn FeeOracle>,
        prices: Arc<dyn PriceOracle>,
    ) -> Self {
        let session = Arc::new(
            WalletSession::new(engine.clone(), prices, vault.clone()).with_catalog(config.catalog.clone()),
        );
        let onboarding = OnboardingController::new(
            vault.clone(),
            engine.clone(),
            settings.clone(),
            session.clone(),
            config.catalog.clone(),
        );
        Self {
            config,
            engine,
            vault,
            settings,
            fees,
            events: TransactionEvents::new(),
            session,
            onboarding,
            listener: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig { &self.config }
    pub fn session(&self) -> &Arc<WalletSession> { &self.session }
    pub fn onboarding(&self) -> &OnboardingController { &self.onboarding }
    pub fn vault(&self) -> &Arc<CredentialVault> { &self.vault }
    pub fn events(&self) -> &TransactionEvents { &self.events }

    /// A fresh send pipeline whose broadcasts reach this client's session.
    pub fn send_pipeline(&self) -> TransactionBuilder {
        TransactionBuilder::new(self.engine.clone(), self.fees.clone(), self.events.clone())
    }

    /// Records the launch and makes sure the transaction listener runs. Once
    /// onboarding is done it also loads the stored wallet and returns the
    /// first-refresh task. Safe to call again on every foregrounding.
    pub async fn start(&self) -> Result<Option<JoinHandle<SyncStatus>>, SessionError> {
        let first_launch = self.settings.mark_launched().unwrap_or_else(|e| {
            warn!(error = %e, "Could not record launch");
            false
        });
        if first_launch {
            info!(app = %self.config.app, "First launch");
        }
        self.ensure_listening();
        if self.onboarding.is_onboarding() {
            return Ok(None);
        }
        self.session.load_wallet().await?;
        let session = self.session.clone();
        Ok(Some(tokio::spawn(async move { session.full_refresh().await })))
    }

    /// Starts the session's transaction listener unless one is already running.
    pub fn ensure_listening(&self) {
        let mut listener = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if listener.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        *listener = Some(self.session.listen(&self.events));
        debug!("Transaction listener started");
    }

    pub fn app_settings(&self) -> Result<AppSettings, SettingsError> { self.settings.load() }

    pub fn set_biometric_enabled(&self, enabled: bool) -> Result<AppSettings, SettingsError> {
        self.settings.update(&mut |s: &mut AppSettings| s.biometric_enabled = enabled)
    }
}
