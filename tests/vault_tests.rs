//! Vault tests - file-backed secret store and config paths on disk

use beewallet::{BackupMaterial, CredentialVault, FileSecretStore, NetworkSelection, SessionConfig, VaultError};
use once_cell::sync::Lazy;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn backup() -> BackupMaterial {
    BackupMaterial::new(
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
        "tr(tprv8ZgxMBicQKsPe5YMU9gHen4Ez3ApihUfykaqUorj9t6FDqy3nP6eoXiAo2ssvpAjoLroQxHqr3R5nE3a5dU3DHTjTgJDd7zrbniJr6nrCzd/86'/1'/0'/0/*)",
        "tr(tprv8ZgxMBicQKsPe5YMU9gHen4Ez3ApihUfykaqUorj9t6FDqy3nP6eoXiAo2ssvpAjoLroQxHqr3R5nE3a5dU3DHTjTgJDd7zrbniJr6nrCzd/86'/1'/0'/1/*)",
    )
}

#[test]
fn backup_survives_reopen_and_is_gone_after_delete() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("vault");

    let vault = CredentialVault::new(FileSecretStore::new(&dir));
    vault.save_backup(&backup()).unwrap();
    vault.save_network(NetworkSelection::Signet).unwrap();
    vault.save_backend_url("https://mutinynet.com/api").unwrap();
    drop(vault);

    let reopened = CredentialVault::new(FileSecretStore::new(&dir));
    assert_eq!(reopened.get_backup().unwrap(), backup());
    assert_eq!(reopened.get_network().unwrap(), Some(NetworkSelection::Signet));
    assert_eq!(reopened.get_backend_url().unwrap().as_deref(), Some("https://mutinynet.com/api"));

    reopened.delete_backup().unwrap();
    reopened.delete_backup().unwrap();
    assert_eq!(reopened.get_backup(), Err(VaultError::NotFound("BackupInfo")));
    assert_eq!(reopened.get_network().unwrap(), Some(NetworkSelection::Signet));
}

#[test]
fn stored_backup_is_camel_case_json() {
    let tmp = TempDir::new().unwrap();
    let vault = CredentialVault::new(FileSecretStore::new(tmp.path()));
    vault.save_backup(&backup()).unwrap();

    let raw = std::fs::read_to_string(tmp.path().join("BackupInfo")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(json.get("changeDescriptor").is_some());
    assert!(json.get("change_descriptor").is_none());
    assert!(!tmp.path().join(".BackupInfo.tmp").exists());
}

#[test]
fn corrupt_backup_is_a_read_failure() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("BackupInfo"), b"{not json").unwrap();
    let vault = CredentialVault::new(FileSecretStore::new(tmp.path()));
    assert!(matches!(vault.get_backup(), Err(VaultError::ReadFailed(_))));
}

#[cfg(unix)]
#[test]
fn secrets_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;
    let tmp = TempDir::new().unwrap();
    let vault = CredentialVault::new(FileSecretStore::new(tmp.path()));
    vault.save_backup(&backup()).unwrap();
    let mode = std::fs::metadata(tmp.path().join("BackupInfo")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn config_paths_follow_root_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    let tmp = TempDir::new().unwrap();
    std::env::set_var("BEEWALLET_ROOT", tmp.path());
    std::env::set_var("BEEWALLET_APP", "beewallet-test");
    std::env::set_var("BEEWALLET_HTTP_TIMEOUT_SECS", "7");
    std::env::remove_var("BEEWALLET_DATA_DIR");

    let config = SessionConfig::from_env();
    assert_eq!(config.app, "beewallet-test");
    assert_eq!(config.vault_dir(), tmp.path().join("beewallet-test").join("vault"));
    assert_eq!(config.wallet_db_path(), tmp.path().join("beewallet-test").join("wallet.db"));
    assert_eq!(config.http_timeout, Duration::from_secs(7));

    std::env::set_var("BEEWALLET_HTTP_TIMEOUT_SECS", "soon");
    assert_eq!(SessionConfig::from_env().http_timeout, Duration::from_secs(20));

    std::env::remove_var("BEEWALLET_ROOT");
    std::env::remove_var("BEEWALLET_APP");
    std::env::remove_var("BEEWALLET_HTTP_TIMEOUT_SECS");
}
