//! Onboarding - pick a network and backend, then create or restore the wallet.
//!
//! The network and URL are persisted before the wallet is created, so a
//! restart mid-onboarding resumes with the same choice. The selection lock is
//! held across every vault write of a choice, so the stored network and URL
//! always belong together. Choices are refused while a wallet is being
//! created or deleted.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{RwLock, RwLockReadGuard};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::core::{BackendCatalog, NetworkSelection};
use crate::engine::{EngineSettings, WalletEngine};
use crate::error::OnboardingError;
use crate::session::{SyncStatus, WalletSession};
use crate::settings::{AppSettings, SettingsStore};
use crate::vault::CredentialVault;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    network: NetworkSelection,
    url: String,
}

pub struct OnboardingController {
    vault: Arc<CredentialVault>,
    engine: Arc<dyn WalletEngine>,
    settings: Arc<dyn SettingsStore>,
    session: Arc<WalletSession>,
    catalog: BackendCatalog,
    selection: Mutex<Selection>,
    /// Shared by choices, exclusive for wallet create/delete
    lifecycle: RwLock<()>,
    last_error: Mutex<Option<String>>,
}

impl OnboardingController {
    /// Starts from the stored network and URL, else Testnet and its first candidate.
    pub fn new(
        vault: Arc<CredentialVault>,
        engine: Arc<dyn WalletEngine>,
        settings: Arc<dyn SettingsStore>,
        session: Arc<WalletSession>,
        catalog: BackendCatalog,
    ) -> Self {
        let network = vault.get_network().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read stored network");
            None
        }).unwrap_or_default();
        let url = vault.get_backend_url().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read stored backend URL");
            None
        }).filter(|u| !u.trim().is_empty()).unwrap_or_else(|| catalog.default_url(network));

        Self {
            vault,
            engine,
            settings,
            session,
            catalog,
            selection: Mutex::new(Selection { network, url }),
            lifecycle: RwLock::new(()),
            last_error: Mutex::new(None),
        }
    }

    pub fn selected_network(&self) -> NetworkSelection { self.selection().network }
    pub fn selected_url(&self) -> String { self.selection().url.clone() }
    pub fn available_urls(&self) -> Vec<String> { self.catalog.urls(self.selected_network()) }
    pub fn last_error(&self) -> Option<String> { self.last_error.lock().unwrap_or_else(|e| e.into_inner()).clone() }

    pub fn is_onboarding(&self) -> bool {
        match self.settings.load() {
            Ok(s) => !s.onboarding_complete,
            Err(e) => {
                warn!(error = %e, "Could not read app settings, assuming onboarding");
                true
            }
        }
    }

    /// Persists `network` and resets the backend URL to its first candidate.
    /// If the URL cannot be stored the previous network is restored.
    pub fn choose_network(&self, network: NetworkSelection) -> Result<(), OnboardingError> {
        let _idle = self.idle()?;
        let mut selection = self.selection();
        let previous = self.vault.get_network().ok().flatten();
        let url = self.catalog.default_url(network);

        self.vault.save_network(network).map_err(|e| self.record(e.into()))?;
        if let Err(e) = self.vault.save_backend_url(&url) {
            let restored = match previous {
                Some(p) => self.vault.save_network(p),
                None => self.vault.delete_network(),
            };
            if let Err(r) = restored {
                warn!(error = %r, "Could not restore previous network");
            }
            return Err(self.record(e.into()));
        }

        *selection = Selection { network, url: url.clone() };
        info!(%network, %url, "Network selected");
        Ok(())
    }

    pub fn choose_backend_url(&self, url: &str) -> Result<(), OnboardingError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(self.record(OnboardingError::InvalidUrl));
        }
        let _idle = self.idle()?;
        let mut selection = self.selection();
        self.vault.save_backend_url(url).map_err(|e| self.record(e.into()))?;
        selection.url = url.to_string();
        info!(%url, "Backend URL selected");
        Ok(())
    }

    /// Blank `words` creates a fresh wallet; otherwise restores from them.
    /// On success onboarding is complete and the returned task runs the first full refresh.
    pub async fn create_wallet(&self, words: &str) -> Result<JoinHandle<SyncStatus>, OnboardingError> {
        let mnemonic = Some(words.trim()).filter(|w| !w.is_empty()).map(str::to_string);
        let restoring = mnemonic.is_some();
        let _busy = self.lifecycle.write().await;
        let Selection { network, url } = {
            let selection = self.selection();
            self.vault.save_network(selection.network).map_err(|e| self.record(e.into()))?;
            self.vault.save_backend_url(&selection.url).map_err(|e| self.record(e.into()))?;
            selection.clone()
        };

        let settings = EngineSettings::new(network, url);
        let backup = self.engine.create_wallet(mnemonic, &settings).await
            .map_err(|e| self.record(OnboardingError::WalletCreationFailed(e.to_string())))?;

        if let Err(e) = self.vault.save_backup(&backup) {
            self.discard_engine_wallet().await;
            return Err(self.record(OnboardingError::WalletCreationFailed(format!("could not store backup: {e}"))));
        }
        if let Err(e) = self.settings.update(&mut |s: &mut AppSettings| s.onboarding_complete = true) {
            let _ = self.vault.delete_backup();
            self.discard_engine_wallet().await;
            return Err(self.record(OnboardingError::WalletCreationFailed(format!("could not save settings: {e}"))));
        }

        self.clear_error();
        info!(%network, restoring, "Wallet created, onboarding complete");
        let session = self.session.clone();
        Ok(tokio::spawn(async move { session.full_refresh().await }))
    }

    /// Drops the engine wallet and every stored credential, then returns to onboarding.
    pub async fn delete_wallet(&self) -> Result<(), OnboardingError> {
        let _busy = self.lifecycle.write().await;
        self.engine.delete_wallet().await
            .map_err(|e| self.record(OnboardingError::WalletDeletionFailed(e.to_string())))?;
        self.vault.delete_backup().map_err(|e| self.record(e.into()))?;
        self.vault.delete_network().map_err(|e| self.record(e.into()))?;
        self.vault.delete_backend_url().map_err(|e| self.record(e.into()))?;
        self.settings.update(&mut |s: &mut AppSettings| s.onboarding_complete = false).map_err(|e| self.record(e.into()))?;
        self.session.invalidate();

        let network = NetworkSelection::default();
        *self.selection() = Selection { network, url: self.catalog.default_url(network) };
        self.clear_error();
        info!("Wallet deleted");
        Ok(())
    }

    async fn discard_engine_wallet(&self) {
        if let Err(e) = self.engine.delete_wallet().await {
            warn!(error = %e, "Could not discard partially created wallet");
        }
    }

    fn idle(&self) -> Result<RwLockReadGuard<'_, ()>, OnboardingError> {
        self.lifecycle.try_read().map_err(|_| self.record(OnboardingError::Busy))
    }

    fn selection(&self) -> MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, error: OnboardingError) -> OnboardingError {
        warn!(error = %error, "Onboarding failed");
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(error.to_string());
        error
    }

    fn clear_error(&self) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
