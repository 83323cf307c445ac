//! Wallet value types shared by the engine, the session and the send pipeline.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Balance in sats. Replaced wholesale; `confirmed <= total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    total: u64,
    confirmed: u64,
}

impl BalanceSnapshot {
    pub fn new(total: u64, confirmed: u64) -> EngineResult<Self> {
        if confirmed > total {
            return Err(EngineError::Serialization(format!("confirmed balance {} exceeds total {}", confirmed, total)));
        }
        Ok(Self { total, confirmed })
    }

    pub fn total(&self) -> u64 { self.total }
    pub fn confirmed(&self) -> u64 { self.confirmed }
    pub fn unconfirmed(&self) -> u64 { self.total - self.confirmed }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub height: u32,
    /// Block time, unix seconds
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction { Incoming, Outgoing }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txid: String,
    pub sent: u64,
    pub received: u64,
    pub fee: Option<u64>,
    pub confirmation: Option<Confirmation>,
}

impl TransactionRecord {
    pub fn is_confirmed(&self) -> bool { self.confirmation.is_some() }

    pub fn direction(&self) -> Direction {
        if self.sent > 0 { Direction::Outgoing } else { Direction::Incoming }
    }

    /// Sats that left (outgoing) or entered (incoming) the wallet.
    pub fn net_amount(&self) -> u64 {
        match self.direction() {
            Direction::Outgoing => self.sent.saturating_sub(self.received),
            Direction::Incoming => self.received.saturating_sub(self.sent),
        }
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        let ts = i64::try_from(self.confirmation?.timestamp).ok()?;
        Utc.timestamp_opt(ts, 0).single()
    }
}

/// An unsigned, unbroadcast transaction quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTx {
    pub fee_sats: u64,
    /// Base64 PSBT
    pub psbt: String,
}

/// Transaction id: 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Txid(String);

impl Txid {
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_ascii_lowercase();
        (v.len() == 64 && v.bytes().all(|b| b.is_ascii_hexdigit())).then_some(Self(v))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for Txid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sent: u64, received: u64, confirmation: Option<Confirmation>) -> TransactionRecord {
        TransactionRecord { txid: "ab".repeat(32), sent, received, fee: Some(141), confirmation }
    }

    #[test]
    fn balance_rejects_confirmed_above_total() {
        assert!(BalanceSnapshot::new(10, 11).is_err());
        let b = BalanceSnapshot::new(10, 4).unwrap();
        assert_eq!((b.total(), b.confirmed(), b.unconfirmed()), (10, 4, 6));
    }

    #[test]
    fn net_amount_follows_direction() {
        let out = record(100_000, 20_000, None);
        assert_eq!(out.direction(), Direction::Outgoing);
        assert_eq!(out.net_amount(), 80_000);
        assert!(!out.is_confirmed());

        let inc = record(0, 5_000, Some(Confirmation { height: 800_000, timestamp: 1_700_000_000 }));
        assert_eq!(inc.direction(), Direction::Incoming);
        assert_eq!(inc.net_amount(), 5_000);
        assert_eq!(inc.confirmed_at().map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn txid_requires_64_hex() {
        assert!(Txid::parse(&"AB".repeat(32)).is_some());
        assert!(Txid::parse("abc").is_none());
        assert!(Txid::parse(&"zz".repeat(32)).is_none());
    }
}
