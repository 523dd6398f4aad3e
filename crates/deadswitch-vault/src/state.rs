//! Persistent vault snapshots
//!
//! A vault is saved as pretty-printed JSON so hosts can reload it across
//! restarts. Writes go to a sibling temp file first and are renamed into
//! place, so a crash never leaves a half-written snapshot.

use crate::vault::Vault;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from state operations
#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File-backed store for one vault snapshot
#[derive(Debug, Clone)]
pub struct VaultStore {
    path: PathBuf,
}

impl VaultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or `None` if none has been saved yet
    pub fn load(&self) -> Result<Option<Vault>, StateError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let vault: Vault = serde_json::from_str(&contents)?;
        Ok(Some(vault))
    }

    /// Save the snapshot, replacing any previous one
    pub fn save(&self, vault: &Vault) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(vault)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
