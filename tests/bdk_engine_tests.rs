//! BDK engine tests - descriptor derivation and persistence, no network access.
//!
//! These verify:
//! 1. Restored wallets derive the BIP86 test-vector address
//! 2. The file store survives a reopen through the vault's backup material
//! 3. Quotes fail cleanly on an empty wallet and never touch the backend

#![cfg(feature = "bdk")]

use beewallet::{BdkEngine, EngineError, EngineSettings, NetworkSelection, WalletEngine};
use tempfile::TempDir;

const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

// BIP86 vector for the mnemonic above, m/86'/0'/0'/0/0
const EXPECTED_MAINNET_ADDR_0: &str = "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr";

fn settings(network: NetworkSelection) -> EngineSettings {
    EngineSettings::new(network, "http://127.0.0.1:3002")
}

#[tokio::test]
async fn restored_wallet_matches_bip86_vector() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = BdkEngine::new(tmp.path().join("wallet.db"));
    let backup = engine
        .create_wallet(Some(TEST_MNEMONIC.into()), &settings(NetworkSelection::Bitcoin))
        .await
        .expect("restore");
    assert!(backup.descriptor.contains("/86'/0'/0'/0/*"));
    assert_eq!(engine.address().await.expect("address"), EXPECTED_MAINNET_ADDR_0);
}

#[tokio::test]
async fn fresh_wallet_yields_twelve_words() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = BdkEngine::new(tmp.path().join("wallet.db"));
    let backup = engine.create_wallet(None, &settings(NetworkSelection::Signet)).await.expect("create");
    assert_eq!(backup.words().len(), 12);
    assert!(engine.address().await.expect("address").starts_with("tb1p"));
}

#[tokio::test]
async fn reload_from_backup_keeps_revealed_addresses() {
    let tmp = TempDir::new().expect("tempdir");
    let db = tmp.path().join("wallet.db");
    let engine = BdkEngine::new(&db);
    let backup = engine.create_wallet(None, &settings(NetworkSelection::Regtest)).await.expect("create");
    let first = engine.address().await.expect("address");
    drop(engine);

    let reopened = BdkEngine::new(&db);
    reopened.load_wallet(&backup, &settings(NetworkSelection::Regtest)).await.expect("load");
    assert_eq!(reopened.address().await.expect("address"), first);
    assert!(reopened.transactions().await.expect("txs").is_empty());
}

#[tokio::test]
async fn empty_wallet_quote_reports_insufficient_funds() {
    let tmp = TempDir::new().expect("tempdir");
    let engine = BdkEngine::new(tmp.path().join("wallet.db"));
    engine.create_wallet(Some(TEST_MNEMONIC.into()), &settings(NetworkSelection::Regtest)).await.expect("create");
    let to = engine.address().await.expect("address");

    let err = engine.build_transaction(&to, 10_000, 2.0).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)), "got {err:?}");

    let err = engine.build_transaction("not-an-address", 10_000, 2.0).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAddress(_)));
}

#[tokio::test]
async fn delete_removes_database() {
    let tmp = TempDir::new().expect("tempdir");
    let db = tmp.path().join("wallet.db");
    let engine = BdkEngine::new(&db);
    engine.create_wallet(None, &settings(NetworkSelection::Testnet)).await.expect("create");
    assert!(db.exists());
    engine.delete_wallet().await.expect("delete");
    assert!(!db.exists());
    assert!(matches!(engine.balance().await, Err(EngineError::Unavailable(_))));
}
