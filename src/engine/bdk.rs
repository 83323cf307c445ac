//! BDK engine - bdk_wallet 2.x with file-store persistence and an Esplora backend.
//!
//! Descriptors are BIP86 taproot, derived from a BIP39 mnemonic. All BDK and
//! Esplora calls are blocking and run on `spawn_blocking`.

use async_trait::async_trait;
use bdk_esplora::{esplora_client, EsploraExt};
use bdk_wallet::{
    bitcoin::{bip32::Xpriv, Address, Amount, FeeRate, Network, Transaction},
    error::CreateTxError,
    file_store::Store as FileStore,
    ChangeSet, KeychainKind, PersistedWallet, SignOptions, Wallet,
};
use bip39::{Language, Mnemonic};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::{EngineSettings, WalletEngine};
use crate::core::{BalanceSnapshot, BuiltTx, Confirmation, TransactionRecord};
use crate::error::{EngineError, EngineResult};
use crate::vault::BackupMaterial;

const MAGIC: &[u8] = b"beewallet0";
const STOP_GAP: usize = 20;
const PARALLEL_REQUESTS: usize = 5;

type PW = PersistedWallet<FileStore<ChangeSet>>;

struct Loaded {
    wallet: PW,
    db: FileStore<ChangeSet>,
    client: esplora_client::BlockingClient,
    backend_url: String,
    network: Network,
}

impl Loaded {
    fn persist(&mut self) -> EngineResult<()> {
        self.wallet.persist(&mut self.db).map_err(|e| EngineError::Unknown(format!("Persist: {}", e)))?;
        Ok(())
    }

    fn recipient(&self, to: &str) -> EngineResult<Address> {
        Address::from_str(to.trim())
            .map_err(|e| EngineError::InvalidAddress(format!("{}: {}", to, e)))?
            .require_network(self.network)
            .map_err(|e| EngineError::InvalidAddress(format!("{}: {}", to, e)))
    }

    fn build(&mut self, to: &str, amount_sats: u64, fee_rate: f32) -> EngineResult<bdk_wallet::bitcoin::Psbt> {
        let address = self.recipient(to)?;
        let mut builder = self.wallet.build_tx();
        builder.add_recipient(address.script_pubkey(), Amount::from_sat(amount_sats));
        builder.fee_rate(to_fee_rate(fee_rate)?);
        builder.finish().map_err(|e| match e {
            CreateTxError::CoinSelection(inner) => EngineError::InsufficientFunds(inner.to_string()),
            other => EngineError::Unknown(format!("Build: {}", other)),
        })
    }
}

/// BDK-backed [`WalletEngine`]. The wallet database lives at `db_path`.
pub struct BdkEngine {
    db_path: PathBuf,
    state: Arc<Mutex<Option<Loaded>>>,
}

impl BdkEngine {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into(), state: Arc::new(Mutex::new(None)) }
    }

    async fn with_loaded<T, F>(&self, f: F) -> EngineResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Loaded) -> EngineResult<T> + Send + 'static,
    {
        let state = self.state.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = state.lock().map_err(|_| EngineError::Unknown("lock".into()))?;
            let loaded = guard.as_mut().ok_or_else(|| EngineError::Unavailable("no wallet loaded".into()))?;
            f(loaded)
        })
        .await
        .map_err(|e| EngineError::Unknown(format!("engine task: {}", e)))?
    }

    /// Opens the wallet in `db_path`. With `fresh`, any previous database is removed first.
    async fn open(&self, backup: BackupMaterial, settings: EngineSettings, fresh: bool) -> EngineResult<()> {
        let state = self.state.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            if fresh {
                remove_db(&db_path)?;
            }
            let loaded = open_wallet(&backup, &settings, &db_path)?;
            let mut guard = state.lock().map_err(|_| EngineError::Unknown("lock".into()))?;
            *guard = Some(loaded);
            Ok(())
        })
        .await
        .map_err(|e| EngineError::Unknown(format!("engine task: {}", e)))?
    }
}

#[async_trait]
impl WalletEngine for BdkEngine {
    async fn create_wallet(&self, mnemonic: Option<String>, settings: &EngineSettings) -> EngineResult<BackupMaterial> {
        let mnemonic = match mnemonic {
            Some(words) => Mnemonic::parse_in(Language::English, words.trim())
                .map_err(|e| EngineError::Unknown(format!("Mnemonic: {}", e)))?,
            None => Mnemonic::generate(12).map_err(|e| EngineError::Unknown(format!("Mnemonic: {}", e)))?,
        };
        let backup = backup_from_mnemonic(&mnemonic, settings.network.to_bdk())?;
        // A fresh wallet never inherits chain data from a previous one
        self.open(backup.clone(), settings.clone(), true).await?;
        info!(network = %settings.network, "Wallet created");
        Ok(backup)
    }

    async fn load_wallet(&self, backup: &BackupMaterial, settings: &EngineSettings) -> EngineResult<()> {
        self.open(backup.clone(), settings.clone(), false).await?;
        info!(network = %settings.network, "Wallet loaded");
        Ok(())
    }

    async fn delete_wallet(&self) -> EngineResult<()> {
        let state = self.state.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = state.lock().map_err(|_| EngineError::Unknown("lock".into()))?;
            *guard = None;
            remove_db(&db_path)
        })
        .await
        .map_err(|e| EngineError::Unknown(format!("engine task: {}", e)))?
    }

    async fn address(&self) -> EngineResult<String> {
        self.with_loaded(|l| {
            let address = l.wallet.next_unused_address(KeychainKind::External).address.to_string();
            l.persist()?;
            Ok(address)
        })
        .await
    }

    async fn balance(&self) -> EngineResult<BalanceSnapshot> {
        self.with_loaded(|l| {
            let b = l.wallet.balance();
            BalanceSnapshot::new(b.total().to_sat(), b.confirmed.to_sat())
        })
        .await
    }

    async fn transactions(&self) -> EngineResult<Vec<TransactionRecord>> {
        self.with_loaded(|l| {
            let wallet = &l.wallet;
            let mut records: Vec<TransactionRecord> = wallet
                .transactions()
                .map(|tx| {
                    let confirmation = match tx.chain_position {
                        bdk_wallet::chain::ChainPosition::Confirmed { anchor, .. } => Some(Confirmation {
                            height: anchor.block_id.height,
                            timestamp: anchor.confirmation_time,
                        }),
                        bdk_wallet::chain::ChainPosition::Unconfirmed { .. } => None,
                    };
                    let (sent, received) = wallet.sent_and_received(&tx.tx_node.tx);
                    TransactionRecord {
                        txid: tx.tx_node.txid.to_string(),
                        sent: sent.to_sat(),
                        received: received.to_sat(),
                        fee: wallet.calculate_fee(&tx.tx_node.tx).ok().map(|f| f.to_sat()),
                        confirmation,
                    }
                })
                .collect();
            // Unconfirmed first, then newest block first
            records.sort_by_key(|r| std::cmp::Reverse(r.confirmation.map(|c| c.height).unwrap_or(u32::MAX)));
            Ok(records)
        })
        .await
    }

    async fn sync(&self) -> EngineResult<()> {
        // Scan without holding the wallet lock so balance reads stay responsive
        let (request, client) = self
            .with_loaded(|l| {
                let client = esplora_client::Builder::new(&l.backend_url).build_blocking();
                Ok((l.wallet.start_full_scan().build(), client))
            })
            .await?;
        let update = tokio::task::spawn_blocking(move || client.full_scan(request, STOP_GAP, PARALLEL_REQUESTS))
            .await
            .map_err(|e| EngineError::Unknown(format!("engine task: {}", e)))?
            .map_err(|e| EngineError::Unavailable(format!("Sync: {}", e)))?;
        self.with_loaded(move |l| {
            l.wallet.apply_update(update).map_err(|e| EngineError::Unknown(format!("Apply: {}", e)))?;
            l.persist()
        })
        .await?;
        debug!("Full scan applied");
        Ok(())
    }

    async fn build_transaction(&self, address: &str, amount_sats: u64, fee_rate: f32) -> EngineResult<BuiltTx> {
        let to = address.to_string();
        self.with_loaded(move |l| {
            let psbt = l.build(&to, amount_sats, fee_rate)?;
            // A quote must not consume change addresses
            l.wallet.cancel_tx(&psbt.unsigned_tx);
            let fee = psbt.fee().map_err(|e| EngineError::Unknown(format!("Fee: {}", e)))?;
            Ok(BuiltTx { fee_sats: fee.to_sat(), psbt: psbt.to_string() })
        })
        .await
    }

    async fn broadcast(&self, address: &str, amount_sats: u64, fee_rate: f32) -> EngineResult<String> {
        let to = address.to_string();
        self.with_loaded(move |l| {
            let mut psbt = l.build(&to, amount_sats, fee_rate)?;
            #[allow(deprecated)]
            let finalized = l.wallet.sign(&mut psbt, SignOptions::default())
                .map_err(|e| EngineError::Unknown(format!("Sign: {}", e)))?;
            if !finalized {
                l.wallet.cancel_tx(&psbt.unsigned_tx);
                return Err(EngineError::Unknown("Sign: transaction not finalized".into()));
            }
            let tx: Transaction = psbt.extract_tx().map_err(|e| EngineError::Unknown(format!("Extract: {}", e)))?;
            if let Err(e) = l.client.broadcast(&tx) {
                l.wallet.cancel_tx(&tx);
                return Err(EngineError::Unavailable(format!("Broadcast: {}", e)));
            }
            l.persist()?;
            let txid = tx.compute_txid().to_string();
            info!(%txid, amount_sats, "Transaction broadcast");
            Ok(txid)
        })
        .await
    }
}

fn to_fee_rate(sat_per_vb: f32) -> EngineResult<FeeRate> {
    if !sat_per_vb.is_finite() || sat_per_vb <= 0.0 {
        return Err(EngineError::Unknown(format!("Invalid fee rate: {}", sat_per_vb)));
    }
    // 1 sat/vB = 250 sat/kwu
    Ok(FeeRate::from_sat_per_kwu((sat_per_vb as f64 * 250.0).round() as u64))
}

fn backup_from_mnemonic(mnemonic: &Mnemonic, network: Network) -> EngineResult<BackupMaterial> {
    let seed = mnemonic.to_seed("");
    let xprv = Xpriv::new_master(network, &seed).map_err(|e| EngineError::Unknown(format!("Key derivation: {}", e)))?;
    let coin = if network == Network::Bitcoin { 0 } else { 1 };
    Ok(BackupMaterial::new(
        mnemonic.to_string(),
        format!("tr({}/86'/{}'/0'/0/*)", xprv, coin),
        format!("tr({}/86'/{}'/0'/1/*)", xprv, coin),
    ))
}

fn remove_db(db_path: &std::path::Path) -> EngineResult<()> {
    match std::fs::remove_file(db_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EngineError::Unknown(format!("Remove wallet db: {}", e))),
    }
}

fn open_wallet(backup: &BackupMaterial, settings: &EngineSettings, db_path: &std::path::Path) -> EngineResult<Loaded> {
    let network = settings.network.to_bdk();
    let external = backup.descriptor.clone();
    let internal = backup.change_descriptor.clone();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| EngineError::Unknown(format!("FileStore: {}", e)))?;
    }
    let mut db: FileStore<ChangeSet> = FileStore::load_or_create(MAGIC, db_path)
        .map_err(|e| EngineError::Serialization(format!("FileStore: {}", e)))?
        .0;

    let existing = Wallet::load()
        .descriptor(KeychainKind::External, Some(external.clone()))
        .descriptor(KeychainKind::Internal, Some(internal.clone()))
        .extract_keys()
        .check_network(network)
        .load_wallet(&mut db)
        .map_err(|e| EngineError::Serialization(format!("Load wallet: {}", e)))?;

    let wallet = match existing {
        Some(w) => w,
        None => Wallet::create(external, internal)
            .network(network)
            .create_wallet(&mut db)
            .map_err(|e| EngineError::Unknown(format!("Create wallet: {}", e)))?,
    };

    let backend_url = settings.backend_url.trim().to_string();
    let client = esplora_client::Builder::new(&backend_url).build_blocking();
    Ok(Loaded { wallet, db, client, backend_url, network })
}
