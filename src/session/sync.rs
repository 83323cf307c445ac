//! Sync state machine - one sync in flight, wallet-wide status.
//!
//! ```text
//! NotStarted ──begin──▶ Syncing ──complete(ok)──▶ Synced
//!                          ▲    └─complete(err)─▶ Failed
//!                          └──────begin────────────┘
//! ```

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    NotStarted,
    Syncing,
    Synced,
    Failed(String),
}

impl SyncStatus {
    pub fn is_syncing(&self) -> bool { matches!(self, SyncStatus::Syncing) }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::NotStarted => f.write_str("Not Started"),
            SyncStatus::Syncing => f.write_str("Syncing"),
            SyncStatus::Synced => f.write_str("Synced"),
            SyncStatus::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

pub struct SyncStateMachine {
    status: watch::Sender<SyncStatus>,
}

impl Default for SyncStateMachine {
    fn default() -> Self { Self::new() }
}

impl SyncStateMachine {
    pub fn new() -> Self {
        let (status, _) = watch::channel(SyncStatus::NotStarted);
        Self { status }
    }

    /// Grants the sync to exactly one caller; false while another is in flight.
    pub fn begin_sync(&self) -> bool {
        let granted = self.status.send_if_modified(|status| {
            if status.is_syncing() {
                return false;
            }
            *status = SyncStatus::Syncing;
            true
        });
        if granted {
            debug!("Sync started");
        }
        granted
    }

    /// Only the holder of a granted `begin_sync` calls this. Stray calls are ignored.
    pub fn complete_sync(&self, result: Result<(), EngineError>) {
        let applied = self.status.send_if_modified(|status| {
            if !status.is_syncing() {
                return false;
            }
            *status = match &result {
                Ok(()) => SyncStatus::Synced,
                Err(e) => SyncStatus::Failed(e.to_string()),
            };
            true
        });
        match (applied, &result) {
            (false, _) => warn!("complete_sync called with no sync in flight, ignoring"),
            (true, Ok(())) => debug!("Sync complete"),
            (true, Err(e)) => warn!(error = %e, "Sync failed"),
        }
    }

    pub fn status(&self) -> SyncStatus { self.status.borrow().clone() }

    pub fn is_syncing(&self) -> bool { self.status.borrow().is_syncing() }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> { self.status.subscribe() }

    /// Resolves once no sync is in flight and returns the settled status.
    pub async fn wait_idle(&self) -> SyncStatus {
        let mut rx = self.status.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let settled = match rx.wait_for(|s| !s.is_syncing()).await {
            Ok(status) => status.clone(),
            Err(_) => self.status(),
        };
        settled
    }

    /// Back to `NotStarted` unless a sync is in flight.
    pub(crate) fn reset_if_idle(&self) {
        self.status.send_if_modified(|status| {
            if status.is_syncing() || *status == SyncStatus::NotStarted {
                return false;
            }
            *status = SyncStatus::NotStarted;
            true
        });
    }
}
