//! Server configuration, parsed from TOML file + environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use deadswitch_vault::{Address, HeartbeatConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// General server settings
    #[serde(default)]
    pub server: ServerSection,

    /// The vault to keep under watch
    pub vault: VaultSection,

    /// Check-in thresholds
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

/// General server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Data directory (vault snapshot, status journal)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Check interval in seconds (default: 1 hour)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            check_interval_secs: default_check_interval(),
            log_level: default_log_level(),
        }
    }
}

/// Immutable vault parameters, fixed when the vault is first created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSection {
    /// Owner identity (0x-prefixed hex)
    pub owner: Address,

    /// Beneficiary identity (0x-prefixed hex)
    pub beneficiary: Address,

    /// Heartbeat period in seconds
    pub heartbeat_period_secs: u64,

    /// Human-readable label used in logs and the journal
    #[serde(default = "default_vault_label")]
    pub label: String,
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data")
}

fn default_check_interval() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_vault_label() -> String {
    "vault".to_string()
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ServerConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `DEADSWITCH_DATA_DIR`
    /// - `DEADSWITCH_CHECK_INTERVAL`
    /// - `DEADSWITCH_LOG_LEVEL`
    /// - `DEADSWITCH_OWNER`
    /// - `DEADSWITCH_BENEFICIARY`
    /// - `DEADSWITCH_HEARTBEAT_PERIOD`
    ///
    /// Overrides that fail to parse are an error rather than ignored.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("DEADSWITCH_DATA_DIR") {
            self.server.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DEADSWITCH_CHECK_INTERVAL") {
            self.server.check_interval_secs = v
                .parse()
                .with_context(|| format!("DEADSWITCH_CHECK_INTERVAL is not a number: {}", v))?;
        }
        if let Ok(v) = std::env::var("DEADSWITCH_LOG_LEVEL") {
            self.server.log_level = v;
        }
        if let Ok(v) = std::env::var("DEADSWITCH_OWNER") {
            self.vault.owner = v
                .parse()
                .with_context(|| format!("DEADSWITCH_OWNER is not an address: {}", v))?;
        }
        if let Ok(v) = std::env::var("DEADSWITCH_BENEFICIARY") {
            self.vault.beneficiary = v
                .parse()
                .with_context(|| format!("DEADSWITCH_BENEFICIARY is not an address: {}", v))?;
        }
        if let Ok(v) = std::env::var("DEADSWITCH_HEARTBEAT_PERIOD") {
            self.vault.heartbeat_period_secs = v
                .parse()
                .with_context(|| format!("DEADSWITCH_HEARTBEAT_PERIOD is not a number: {}", v))?;
        }
        Ok(())
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.vault.heartbeat_period_secs > 0,
            "vault.heartbeat_period_secs must be > 0"
        );

        anyhow::ensure!(
            self.vault.owner != self.vault.beneficiary,
            "vault.owner and vault.beneficiary must differ"
        );

        anyhow::ensure!(!self.vault.label.is_empty(), "vault.label must not be empty");

        // Check interval must be at least 60 seconds
        anyhow::ensure!(
            self.server.check_interval_secs >= 60,
            "server.check_interval_secs must be >= 60"
        );

        self.heartbeat
            .validate()
            .context("Invalid [heartbeat] section")?;

        Ok(())
    }

    /// Path of the persisted vault snapshot.
    pub fn vault_state_path(&self) -> PathBuf {
        self.server.data_dir.join("vault_state.json")
    }

    /// Path of the SQLite status journal.
    pub fn journal_path(&self) -> PathBuf {
        self.server.data_dir.join("deadswitch.db")
    }
}

// ============================================================================
// Tests
// ============================================================================
