//! Shared test doubles: a scriptable wallet engine and fixed fee/price oracles.

#![allow(dead_code)]

use async_trait::async_trait;
use beewallet::{
    BackupMaterial, BalanceSnapshot, BuiltTx, Confirmation, EngineError, EngineResult, EngineSettings, FeeError,
    FeeOracle, OracleError, Price, PriceError, PriceOracle, RecommendedFees, TransactionRecord, WalletEngine,
};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
pub const TEST_ADDRESS: &str = "tb1pxg0lakl0x4jee73f38m334qsma7mn2yv764x9an5ylht6tx8ccdsxtktrt";
pub const TEST_TXID: &str = "7d2e1c3b4a5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f9";

/// Deterministic engine. Every call is logged by name; `sync` and `balance`
/// can be held at a gate until the test releases them.
pub struct MockEngine {
    pub calls: Mutex<Vec<&'static str>>,
    pub sync_count: AtomicUsize,
    pub broadcast_count: AtomicUsize,
    pub fail_sync: AtomicBool,
    pub fail_balance: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_broadcast: AtomicBool,
    pub insufficient_funds: AtomicBool,
    sync_gate: Option<Arc<Semaphore>>,
    balance_gate: Option<Arc<Semaphore>>,
    pub loaded: Mutex<Option<(BackupMaterial, EngineSettings)>>,
    pub balance: Mutex<(u64, u64)>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            sync_count: AtomicUsize::new(0),
            broadcast_count: AtomicUsize::new(0),
            fail_sync: AtomicBool::new(false),
            fail_balance: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            fail_broadcast: AtomicBool::new(false),
            insufficient_funds: AtomicBool::new(false),
            sync_gate: None,
            balance_gate: None,
            loaded: Mutex::new(None),
            balance: Mutex::new((150_000, 100_000)),
        }
    }
}

impl MockEngine {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    /// `sync` blocks until a permit is added to the returned semaphore.
    pub fn with_sync_gate() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (Arc::new(Self { sync_gate: Some(gate.clone()), ..Self::default() }), gate)
    }

    /// `balance` blocks until a permit is added to the returned semaphore.
    pub fn with_balance_gate() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (Arc::new(Self { balance_gate: Some(gate.clone()), ..Self::default() }), gate)
    }

    pub fn calls(&self) -> Vec<&'static str> { self.calls.lock().unwrap().clone() }

    pub fn count(&self, name: &str) -> usize { self.calls().iter().filter(|c| **c == name).count() }

    /// Fee for a ~166 vB taproot spend.
    pub fn fee_for(rate: f32) -> u64 { (rate as f64 * 165.88).round() as u64 }

    fn log(&self, name: &'static str) { self.calls.lock().unwrap().push(name); }

    async fn pass(gate: &Option<Arc<Semaphore>>) {
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl WalletEngine for MockEngine {
    async fn create_wallet(&self, mnemonic: Option<String>, settings: &EngineSettings) -> EngineResult<BackupMaterial> {
        self.log("create_wallet");
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(EngineError::Unknown("descriptor error".into()));
        }
        let words = mnemonic.unwrap_or_else(|| "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong".into());
        let backup = BackupMaterial::new(words, "tr(tprv/86'/1'/0'/0/*)", "tr(tprv/86'/1'/0'/1/*)");
        *self.loaded.lock().unwrap() = Some((backup.clone(), settings.clone()));
        Ok(backup)
    }

    async fn load_wallet(&self, backup: &BackupMaterial, settings: &EngineSettings) -> EngineResult<()> {
        self.log("load_wallet");
        *self.loaded.lock().unwrap() = Some((backup.clone(), settings.clone()));
        Ok(())
    }

    async fn delete_wallet(&self) -> EngineResult<()> {
        self.log("delete_wallet");
        *self.loaded.lock().unwrap() = None;
        Ok(())
    }

    async fn address(&self) -> EngineResult<String> {
        self.log("address");
        Ok(TEST_ADDRESS.into())
    }

    async fn balance(&self) -> EngineResult<BalanceSnapshot> {
        self.log("balance");
        Self::pass(&self.balance_gate).await;
        if self.fail_balance.load(Ordering::SeqCst) {
            return Err(EngineError::Unavailable("no wallet loaded".into()));
        }
        let (total, confirmed) = *self.balance.lock().unwrap();
        BalanceSnapshot::new(total, confirmed)
    }

    async fn transactions(&self) -> EngineResult<Vec<TransactionRecord>> {
        self.log("transactions");
        Ok(vec![
            TransactionRecord { txid: TEST_TXID.into(), sent: 0, received: 150_000, fee: Some(141), confirmation: None },
            TransactionRecord {
                txid: "11".repeat(32),
                sent: 0,
                received: 100_000,
                fee: Some(153),
                confirmation: Some(Confirmation { height: 200_123, timestamp: 1_700_000_000 }),
            },
        ])
    }

    async fn sync(&self) -> EngineResult<()> {
        self.log("sync_start");
        self.sync_count.fetch_add(1, Ordering::SeqCst);
        Self::pass(&self.sync_gate).await;
        self.log("sync_end");
        if self.fail_sync.load(Ordering::SeqCst) {
            return Err(EngineError::Unavailable("esplora unreachable".into()));
        }
        Ok(())
    }

    async fn build_transaction(&self, address: &str, amount_sats: u64, fee_rate: f32) -> EngineResult<BuiltTx> {
        self.log("build_transaction");
        if !address.starts_with("tb1") {
            return Err(EngineError::InvalidAddress(address.into()));
        }
        if self.insufficient_funds.load(Ordering::SeqCst) {
            return Err(EngineError::InsufficientFunds(format!("need {} sats", amount_sats)));
        }
        Ok(BuiltTx { fee_sats: Self::fee_for(fee_rate), psbt: "cHNidP8BAH0CAAAAAQ==".into() })
    }

    async fn broadcast(&self, address: &str, _amount_sats: u64, _fee_rate: f32) -> EngineResult<String> {
        self.log("broadcast");
        if !address.starts_with("tb1") {
            return Err(EngineError::InvalidAddress(address.into()));
        }
        if self.fail_broadcast.load(Ordering::SeqCst) {
            return Err(EngineError::Unavailable("broadcast rejected".into()));
        }
        self.broadcast_count.fetch_add(1, Ordering::SeqCst);
        Ok(TEST_TXID.into())
    }
}

pub struct MockFees {
    pub fail: AtomicBool,
    pub minimum_fee: AtomicU32,
}

impl MockFees {
    pub fn new() -> Arc<Self> { Arc::new(Self { fail: AtomicBool::new(false), minimum_fee: AtomicU32::new(2) }) }

    pub fn fees(&self) -> RecommendedFees {
        let minimum_fee = self.minimum_fee.load(Ordering::SeqCst);
        RecommendedFees { fastest_fee: 17, half_hour_fee: 12, hour_fee: 8, economy_fee: 4, minimum_fee }
    }
}

#[async_trait]
impl FeeOracle for MockFees {
    async fn fetch_fees(&self) -> Result<RecommendedFees, FeeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(OracleError::InvalidServerResponse("HTTP 503 Service Unavailable".into()));
        }
        Ok(self.fees())
    }
}

pub struct MockPrice {
    pub fail: AtomicBool,
    pub usd: Mutex<f64>,
}

impl MockPrice {
    pub fn new() -> Arc<Self> { Arc::new(Self { fail: AtomicBool::new(false), usd: Mutex::new(40_000.0) }) }
}

#[async_trait]
impl PriceOracle for MockPrice {
    async fn fetch_price(&self) -> Result<Price, PriceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(OracleError::InvalidServerResponse("connection reset".into()));
        }
        Ok(Price::usd(*self.usd.lock().unwrap()))
    }
}
