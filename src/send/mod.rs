//! Send pipeline - amount, address, fee, build, broadcast.
//!
//! ```text
//! Draft ─▶ Amount ─▶ Address ─▶ FeeSelected ─▶ Built ─▶ Sent
//!                                  │   ▲           │
//!                                  ▼   └─rebuild───┘
//!                                Failed (resumes at the stage it failed from)
//! ```
//!
//! Every step acts on the values already staged in [`PendingSend`]. Editing an
//! earlier value rewinds to that step and drops the quote. A failure keeps
//! everything staged so the same step can be retried.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::{BuiltTx, Txid};
use crate::engine::WalletEngine;
use crate::error::{EngineError, SendError};
use crate::oracle::{FeeMenu, FeeOracle};
use crate::session::TransactionEvents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SendStage {
    Draft,
    Amount,
    Address,
    FeeSelected,
    Built,
    Sent,
    Failed,
}

impl SendStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendStage::Draft => "draft",
            SendStage::Amount => "amount",
            SendStage::Address => "address",
            SendStage::FeeSelected => "fee selected",
            SendStage::Built => "built",
            SendStage::Sent => "sent",
            SendStage::Failed => "failed",
        }
    }
}

/// Values staged for one send.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingSend {
    pub amount_sats: u64,
    pub address: String,
    pub fee_rate: f32,
    pub built: Option<BuiltTx>,
}

pub struct TransactionBuilder {
    engine: Arc<dyn WalletEngine>,
    fees: Arc<dyn FeeOracle>,
    events: TransactionEvents,
    pending: PendingSend,
    stage: SendStage,
    /// Stage to resume from while `stage` is `Failed`
    resume: SendStage,
    menu: Option<FeeMenu>,
    fee_changes_since_build: u32,
    last_error: Option<SendError>,
    txid: Option<Txid>,
}

impl TransactionBuilder {
    pub fn new(engine: Arc<dyn WalletEngine>, fees: Arc<dyn FeeOracle>, events: TransactionEvents) -> Self {
        Self {
            engine,
            fees,
            events,
            pending: PendingSend::default(),
            stage: SendStage::Draft,
            resume: SendStage::Draft,
            menu: None,
            fee_changes_since_build: 0,
            last_error: None,
            txid: None,
        }
    }

    pub fn stage(&self) -> SendStage { self.stage }
    pub fn pending(&self) -> &PendingSend { &self.pending }
    pub fn fee_menu(&self) -> Option<&FeeMenu> { self.menu.as_ref() }
    pub fn last_error(&self) -> Option<&SendError> { self.last_error.as_ref() }
    pub fn txid(&self) -> Option<&Txid> { self.txid.as_ref() }

    // =========================================================================
    // Staging
    // =========================================================================

    pub fn set_amount(&mut self, amount_sats: u64) -> Result<(), SendError> {
        self.require("set_amount", SendStage::Draft)?;
        if amount_sats == 0 {
            return Err(SendError::InvalidAmount);
        }
        self.pending.amount_sats = amount_sats;
        self.rewind(SendStage::Amount);
        Ok(())
    }

    pub fn set_address(&mut self, address: &str) -> Result<(), SendError> {
        self.require("set_address", SendStage::Amount)?;
        let address = address.trim();
        if address.is_empty() {
            return Err(SendError::InvalidAddress("address is empty".into()));
        }
        self.pending.address = address.to_string();
        self.rewind(SendStage::Address);
        Ok(())
    }

    /// Fetches recommended fees and stages the lowest tier.
    pub async fn select_fee(&mut self) -> Result<FeeMenu, SendError> {
        self.require("select_fee", SendStage::Address)?;
        let fees = match self.fees.fetch_fees().await {
            Ok(f) => f,
            Err(e) => return Err(self.fail(SendStage::Address, SendError::FeeOracleUnavailable(e))),
        };
        let menu = FeeMenu::from_fees(&fees);
        let rate = menu.selected().sat_per_vb as f32;
        if let Err(e) = check_fee_rate(rate) {
            return Err(self.fail(SendStage::Address, e));
        }
        self.pending.fee_rate = rate;
        self.menu = Some(menu.clone());
        self.rewind(SendStage::FeeSelected);
        Ok(menu)
    }

    pub fn choose_fee(&mut self, index: usize) -> Result<f32, SendError> {
        self.require("choose_fee", SendStage::FeeSelected)?;
        let tier = self.menu.as_mut().and_then(|m| m.select(index)).ok_or(SendError::UnknownFeeTier(index))?;
        let rate = tier.sat_per_vb as f32;
        self.change_fee_rate(rate)?;
        Ok(rate)
    }

    pub fn set_custom_fee_rate(&mut self, sat_per_vb: f32) -> Result<(), SendError> {
        self.require("set_custom_fee_rate", SendStage::FeeSelected)?;
        self.change_fee_rate(sat_per_vb)
    }

    // =========================================================================
    // Build / send
    // =========================================================================

    /// Quotes the staged send. Nothing is broadcast.
    pub async fn build(&mut self) -> Result<BuiltTx, SendError> {
        self.require("build", SendStage::FeeSelected)?;
        let PendingSend { amount_sats, address, fee_rate, .. } = self.pending.clone();
        if amount_sats == 0 {
            return Err(SendError::InvalidAmount);
        }
        let built = match self.engine.build_transaction(&address, amount_sats, fee_rate).await {
            Ok(b) => b,
            Err(e) => return Err(self.fail(SendStage::FeeSelected, e.into())),
        };
        if amount_sats.checked_add(built.fee_sats).is_none() {
            return Err(self.fail(SendStage::FeeSelected, SendError::AmountOverflow));
        }
        debug!(amount_sats, fee_sats = built.fee_sats, fee_rate, "Transaction built");
        self.pending.built = Some(built.clone());
        self.fee_changes_since_build = 0;
        self.enter(SendStage::Built);
        Ok(built)
    }

    /// Broadcasts the staged send. The transaction-sent event fires once on success.
    pub async fn send(&mut self) -> Result<Txid, SendError> {
        self.require("send", SendStage::Built)?;
        if self.fee_changes_since_build > 1 {
            self.pending.built = None;
            self.enter(SendStage::FeeSelected);
            return Err(SendError::StaleQuote);
        }
        let PendingSend { amount_sats, address, fee_rate, .. } = self.pending.clone();
        let raw = match self.engine.broadcast(&address, amount_sats, fee_rate).await {
            Ok(t) => t,
            Err(e) => return Err(self.fail(SendStage::Built, e.into())),
        };
        let Some(txid) = Txid::parse(&raw) else {
            let err = EngineError::Serialization(format!("engine returned malformed txid {raw:?}"));
            return Err(self.fail(SendStage::Built, err.into()));
        };
        self.txid = Some(txid.clone());
        self.enter(SendStage::Sent);
        let listeners = self.events.notify();
        info!(%txid, amount_sats, listeners, "Transaction sent");
        Ok(txid)
    }

    /// Abandons the send and clears everything staged.
    pub fn reset(&mut self) {
        if self.stage != SendStage::Draft {
            debug!(stage = self.stage.as_str(), "Send pipeline reset");
        }
        self.pending = PendingSend::default();
        self.menu = None;
        self.fee_changes_since_build = 0;
        self.last_error = None;
        self.txid = None;
        self.stage = SendStage::Draft;
        self.resume = SendStage::Draft;
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// The stage steps are checked against: the resume point while failed.
    fn effective_stage(&self) -> SendStage {
        if self.stage == SendStage::Failed { self.resume } else { self.stage }
    }

    fn require(&self, operation: &'static str, required: SendStage) -> Result<(), SendError> {
        let current = self.effective_stage();
        if current < required || current == SendStage::Sent {
            return Err(SendError::StageSkipped { operation, required: required.as_str(), current: current.as_str() });
        }
        Ok(())
    }

    fn enter(&mut self, stage: SendStage) {
        self.stage = stage;
        self.resume = stage;
        self.last_error = None;
    }

    /// Moves back to `stage`, dropping anything computed after it.
    fn rewind(&mut self, stage: SendStage) {
        if stage < SendStage::Built {
            self.pending.built = None;
            self.fee_changes_since_build = 0;
        }
        if stage < SendStage::FeeSelected {
            self.menu = None;
        }
        self.enter(stage);
    }

    fn change_fee_rate(&mut self, sat_per_vb: f32) -> Result<(), SendError> {
        check_fee_rate(sat_per_vb)?;
        if (self.pending.fee_rate - sat_per_vb).abs() < f32::EPSILON {
            return Ok(());
        }
        self.pending.fee_rate = sat_per_vb;
        if self.pending.built.is_some() {
            self.fee_changes_since_build += 1;
        }
        Ok(())
    }

    fn fail(&mut self, resume: SendStage, error: SendError) -> SendError {
        warn!(stage = resume.as_str(), error = %error, "Send pipeline step failed");
        if resume < SendStage::Built {
            self.pending.built = None;
        }
        self.stage = SendStage::Failed;
        self.resume = resume;
        self.last_error = Some(error.clone());
        error
    }
}

fn check_fee_rate(sat_per_vb: f32) -> Result<(), SendError> {
    if !sat_per_vb.is_finite() || sat_per_vb <= 0.0 {
        return Err(SendError::InvalidFeeRate(sat_per_vb));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        assert!(SendStage::Draft < SendStage::Amount);
        assert!(SendStage::FeeSelected < SendStage::Built);
        assert!(SendStage::Built < SendStage::Sent);
    }

    #[test]
    fn fee_rates_must_be_positive_and_finite() {
        assert!(check_fee_rate(1.0).is_ok());
        assert!(matches!(check_fee_rate(0.0), Err(SendError::InvalidFeeRate(_))));
        assert!(check_fee_rate(-2.0).is_err());
        assert!(check_fee_rate(f32::INFINITY).is_err());
    }
}
