//! [`SettingsStore`] implementations.

use crate::config::DockConfig;
use crate::platform::SettingsStore;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Key of the persisted touchpad flag (1 enabled, 0 disabled).
pub const TOUCHPAD_STATUS: &str = "touchpad_status";

/// Default directory of [`DirSettings`].
pub const DEFAULT_SETTINGS_DIR: &str = "/var/lib/asusdec";

/// Settings kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, i32>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get_int(&self, key: &str) -> Option<i32> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).copied()
    }

    fn put_int(&self, key: &str, value: i32) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings stored as one file per key inside a directory.
///
/// Each file holds the decimal value. Missing or unparsable files read as
/// absent.
#[derive(Debug, Clone)]
pub struct DirSettings {
    dir: PathBuf,
}

impl DirSettings {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Use the settings directory from `config`.
    pub fn from_config(config: &DockConfig) -> Self {
        Self::new(&config.settings_dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SettingsStore for DirSettings {
    fn get_int(&self, key: &str) -> Option<i32> {
        let path = self.dir.join(key);
        let text = std::fs::read_to_string(&path).ok()?;
        match text.trim().parse() {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring malformed setting {:?}: {}", path, e);
                None
            }
        }
    }

    fn put_int(&self, key: &str, value: i32) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create settings dir {:?}", self.dir))?;
        let path = self.dir.join(key);
        std::fs::write(&path, format!("{}\n", value))
            .with_context(|| format!("Failed to write setting {:?}", path))
    }
}
