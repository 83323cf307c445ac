//! Wallet session - the single owner of balance, history, price and sync status.
//!
//! ```text
//! full_refresh
//!   ├── synchronize ──▶ refresh_balance ┐
//!   │                └▶ refresh_transactions  (after the sync attempt)
//!   └── refresh_price                    (alongside the sync)
//! ```
//!
//! Every write goes through one lock held only for the swap. Each operation
//! captures the session generation when it starts; `invalidate` bumps it, and
//! results from an older generation are dropped.

mod events;
mod sync;

pub use events::{TransactionEvents, TransactionSent};
pub use sync::{SyncStateMachine, SyncStatus};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast::{self, error::{RecvError, TryRecvError}};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::keys::context;
use crate::core::{BackendCatalog, BalanceSnapshot, TransactionRecord};
use crate::engine::{EngineSettings, WalletEngine};
use crate::error::SessionError;
use crate::oracle::{CurrencyCode, Price, PriceOracle};
use crate::vault::{BackupMaterial, CredentialVault};

const SATS_PER_BTC: f64 = 100_000_000.0;

#[derive(Debug, Default)]
struct SessionState {
    balance: Option<BalanceSnapshot>,
    transactions: Vec<TransactionRecord>,
    price: Option<Price>,
    last_error: Option<SessionError>,
    unread_error: bool,
}

pub struct WalletSession {
    engine: Arc<dyn WalletEngine>,
    prices: Arc<dyn PriceOracle>,
    vault: Arc<CredentialVault>,
    catalog: BackendCatalog,
    sync: SyncStateMachine,
    state: RwLock<SessionState>,
    generation: AtomicU64,
}

impl WalletSession {
    pub fn new(engine: Arc<dyn WalletEngine>, prices: Arc<dyn PriceOracle>, vault: Arc<CredentialVault>) -> Self {
        Self {
            engine,
            prices,
            vault,
            catalog: BackendCatalog::default(),
            sync: SyncStateMachine::new(),
            state: RwLock::new(SessionState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_catalog(mut self, catalog: BackendCatalog) -> Self { self.catalog = catalog; self }

    // =========================================================================
    // Sync
    // =========================================================================

    /// Runs one engine sync, or waits for the one already in flight.
    pub async fn synchronize(&self) -> SyncStatus {
        if !self.sync.begin_sync() {
            debug!("Sync already in flight, waiting");
            return self.sync.wait_idle().await;
        }
        let generation = self.generation();
        let result = self.engine.sync().await;
        if let Err(e) = &result {
            self.record_error(generation, SessionError::from_engine(context::SYNC, e));
        }
        self.sync.complete_sync(result);
        if self.generation() != generation {
            self.sync.reset_if_idle();
        }
        self.sync.status()
    }

    pub fn sync_status(&self) -> SyncStatus { self.sync.status() }

    pub fn sync_machine(&self) -> &SyncStateMachine { &self.sync }

    // =========================================================================
    // Refresh
    // =========================================================================

    pub async fn refresh_balance(&self) -> Result<BalanceSnapshot, SessionError> {
        let generation = self.generation();
        match self.engine.balance().await {
            Ok(balance) => {
                self.apply(generation, |s| s.balance = Some(balance));
                Ok(balance)
            }
            Err(e) => Err(self.record_error(generation, SessionError::from_engine(context::BALANCE, &e))),
        }
    }

    pub async fn refresh_transactions(&self) -> Result<usize, SessionError> {
        let generation = self.generation();
        match self.engine.transactions().await {
            Ok(transactions) => {
                let count = transactions.len();
                self.apply(generation, |s| s.transactions = transactions);
                Ok(count)
            }
            Err(e) => Err(self.record_error(generation, SessionError::from_engine(context::TRANSACTIONS, &e))),
        }
    }

    pub async fn refresh_price(&self) -> Result<Price, SessionError> {
        let generation = self.generation();
        match self.prices.fetch_price().await {
            Ok(price) => {
                let snapshot = price.clone();
                self.apply(generation, |s| s.price = Some(snapshot));
                Ok(price)
            }
            Err(e) => Err(self.record_error(generation, SessionError::from_oracle(context::PRICE, &e))),
        }
    }

    /// Sync, then balance and transactions; price alongside. Failures are
    /// recorded in the error slot and never stop the sibling refreshes.
    pub async fn full_refresh(&self) -> SyncStatus {
        let after_sync = async {
            let status = self.synchronize().await;
            let _ = tokio::join!(self.refresh_balance(), self.refresh_transactions());
            status
        };
        let (status, _) = tokio::join!(after_sync, self.refresh_price());
        debug!(%status, "Full refresh done");
        status
    }

    // =========================================================================
    // Wallet lifecycle
    // =========================================================================

    /// Opens the stored wallet: backup, network and backend URL from the vault.
    pub async fn load_wallet(&self) -> Result<(), SessionError> {
        let generation = self.generation();
        let settings = match self.stored_settings() {
            Ok(s) => s,
            Err(e) => return Err(self.record_error(generation, e)),
        };
        let backup = match self.vault.get_backup() {
            Ok(b) => b,
            Err(e) => return Err(self.record_error(generation, SessionError::from_vault(context::LOAD, &e))),
        };
        match self.engine.load_wallet(&backup, &settings).await {
            Ok(()) => {
                info!(network = %settings.network, url = %settings.backend_url, "Session wallet loaded");
                Ok(())
            }
            Err(e) => Err(self.record_error(generation, SessionError::from_engine(context::LOAD, &e))),
        }
    }

    /// Network and backend URL from the vault, defaulting to Testnet and its first candidate.
    pub fn stored_settings(&self) -> Result<EngineSettings, SessionError> {
        let network = self.vault.get_network()
            .map_err(|e| SessionError::from_vault(context::LOAD, &e))?
            .unwrap_or_default();
        let url = self.vault.get_backend_url()
            .map_err(|e| SessionError::from_vault(context::LOAD, &e))?
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.catalog.default_url(network));
        Ok(EngineSettings::new(network, url))
    }

    pub async fn receive_address(&self) -> Result<String, SessionError> {
        let generation = self.generation();
        self.engine.address().await
            .map_err(|e| self.record_error(generation, SessionError::from_engine(context::ADDRESS, &e)))
    }

    /// Transient copy of the backup for display. Never stored in the session.
    pub fn reveal_backup(&self) -> Result<BackupMaterial, SessionError> {
        let generation = self.generation();
        self.vault.get_backup()
            .map_err(|e| self.record_error(generation, SessionError::from_vault(context::SEED, &e)))
    }

    /// Teardown: in-flight results are discarded and snapshots cleared.
    pub fn invalidate(&self) {
        let mut state = self.write_state();
        self.generation.fetch_add(1, Ordering::SeqCst);
        *state = SessionState::default();
        drop(state);
        self.sync.reset_if_idle();
        info!(generation = self.generation(), "Session invalidated");
    }

    pub fn generation(&self) -> u64 { self.generation.load(Ordering::SeqCst) }

    // =========================================================================
    // Snapshots
    // =========================================================================

    pub fn balance(&self) -> Option<BalanceSnapshot> { self.read_state().balance }

    pub fn transactions(&self) -> Vec<TransactionRecord> { self.read_state().transactions.clone() }

    pub fn confirmed_transactions(&self) -> Vec<TransactionRecord> {
        self.read_state().transactions.iter().filter(|t| t.is_confirmed()).cloned().collect()
    }

    pub fn unconfirmed_transactions(&self) -> Vec<TransactionRecord> {
        self.read_state().transactions.iter().filter(|t| !t.is_confirmed()).cloned().collect()
    }

    pub fn price(&self) -> Option<Price> { self.read_state().price.clone() }

    pub fn balance_in(&self, code: CurrencyCode) -> Option<f64> {
        let state = self.read_state();
        let rate = state.price.as_ref()?.rate(code)?;
        Some(state.balance?.total() as f64 / SATS_PER_BTC * rate)
    }

    pub fn balance_in_usd(&self) -> Option<f64> { self.balance_in(CurrencyCode::Usd) }

    pub fn last_error(&self) -> Option<SessionError> { self.read_state().last_error.clone() }

    pub fn has_unread_error(&self) -> bool { self.read_state().unread_error }

    pub fn acknowledge_error(&self) { self.write_state().unread_error = false; }

    // =========================================================================
    // Events
    // =========================================================================

    /// One full refresh per transaction-sent event, started after the event is
    /// seen. Queued duplicates collapse. A sync already in flight began before
    /// the broadcast, so the refresh waits for it and then runs its own.
    pub fn listen(self: &Arc<Self>, events: &TransactionEvents) -> JoinHandle<()> {
        let mut rx = events.subscribe();
        let session = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
                let mut open = drain(&mut rx);
                let Some(session) = session.upgrade() else { break };
                if session.sync.is_syncing() {
                    debug!("Transaction sent during sync, waiting for it to settle");
                    session.sync.wait_idle().await;
                    open &= drain(&mut rx);
                }
                info!("Transaction sent, refreshing");
                session.full_refresh().await;
                if !open {
                    break;
                }
            }
            debug!("Transaction listener stopped");
        })
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Applies `f` only if no teardown happened since `generation` was captured.
    fn apply(&self, generation: u64, f: impl FnOnce(&mut SessionState)) -> bool {
        let mut state = self.write_state();
        if self.generation() != generation {
            debug!(generation, "Discarding stale result");
            return false;
        }
        f(&mut state);
        true
    }

    fn record_error(&self, generation: u64, error: SessionError) -> SessionError {
        warn!(kind = error.kind.as_str(), "{}", error);
        let stored = error.clone();
        self.apply(generation, |s| {
            s.last_error = Some(stored);
            s.unread_error = true;
        });
        error
    }
}

/// Drops queued duplicates. False once the channel is closed.
fn drain(rx: &mut broadcast::Receiver<TransactionSent>) -> bool {
    loop {
        match rx.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Closed) => return false,
        }
    }
}
