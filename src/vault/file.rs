//! File-backed secret store: one file per key, replaced atomically.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::SecretStore;
use crate::error::{VaultError, VaultResult};

#[derive(Debug, Clone)]
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn dir(&self) -> &Path { &self.dir }

    fn path(&self, key: &str) -> PathBuf { self.dir.join(key) }
}

impl SecretStore for FileSecretStore {
    fn read(&self, key: &str) -> VaultResult<Option<Vec<u8>>> {
        match std::fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::ReadFailed(format!("{key}: {e}"))),
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> VaultResult<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| VaultError::WriteFailed(format!("vault mkdir: {e}")))?;
        write_atomic(&self.path(key), value).map_err(|e| VaultError::WriteFailed(format!("{key}: {e}")))
    }

    fn remove(&self, key: &str) -> VaultResult<()> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VaultError::WriteFailed(format!("{key}: {e}"))),
        }
    }
}

/// Writes `bytes` to a hidden sibling, syncs it, then renames it over `path`.
/// Readers see either the old or the new file, never a partial write.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let tmp = path.with_file_name(format!(".{name}.tmp"));
    let written = open_private(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    std::fs::rename(&tmp, path)
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)
}
