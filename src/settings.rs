//! App settings - the non-secret booleans that survive restarts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::SettingsError;
use crate::vault::file::write_atomic;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub onboarding_complete: bool,
    pub biometric_enabled: bool,
    pub has_launched_before: bool,
}

pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<AppSettings, SettingsError>;
    fn save(&self, settings: &AppSettings) -> Result<(), SettingsError>;

    fn update(&self, f: &mut dyn FnMut(&mut AppSettings)) -> Result<AppSettings, SettingsError> {
        let mut settings = self.load()?;
        f(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }

    /// Records a launch. Returns true on the very first one.
    fn mark_launched(&self) -> Result<bool, SettingsError> {
        let first = !self.load()?.has_launched_before;
        if first {
            self.update(&mut |s: &mut AppSettings| s.has_launched_before = true)?;
        }
        Ok(first)
    }
}

/// JSON file; a missing file reads as defaults.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
    pub fn path(&self) -> &Path { &self.path }
}

impl SettingsStore for FileSettings {
    fn load(&self) -> Result<AppSettings, SettingsError> {
        if !self.path.exists() {
            return Ok(AppSettings::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_atomic(&self.path, serde_json::to_string_pretty(settings)?.as_bytes())?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySettings {
    inner: RwLock<AppSettings>,
}

impl MemorySettings {
    pub fn with(settings: AppSettings) -> Self { Self { inner: RwLock::new(settings) } }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> Result<AppSettings, SettingsError> {
        Ok(*self.inner.read().unwrap_or_else(|e| e.into_inner()))
    }

    fn save(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = *settings;
        Ok(())
    }
}
