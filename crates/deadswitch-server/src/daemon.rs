//! The daemon loop: periodically evaluates vault liveness and journals it.

use crate::config::ServerConfig;
use crate::journal::{self, StatusCheckRow};
use anyhow::{Context, Result};
use deadswitch_vault::{
    evaluate_heartbeat, Clock, HeartbeatAction, HeartbeatStatus, SystemClock, Timestamp, Vault,
    VaultStore,
};
use std::time::Duration;

/// Outcome of one check cycle.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub status: HeartbeatStatus,
    /// Action recorded by the previous cycle, if any
    pub previous_action: Option<HeartbeatAction>,
    /// Whether the vault snapshot was created during this cycle
    pub created: bool,
}

impl CheckReport {
    pub fn changed(&self) -> bool {
        self.previous_action
            .is_some_and(|previous| previous != self.status.action)
    }
}

/// Run the daemon loop. Blocks forever (until shutdown signal).
pub async fn run(config: ServerConfig) -> Result<()> {
    log::info!("Deadswitch server starting…");
    log::info!("  Vault:      {}", config.vault.label);
    log::info!("  Owner:      {}", config.vault.owner);
    log::info!("  Heir:       {}", config.vault.beneficiary);
    log::info!(
        "  Period:     {} seconds ({:.1} days)",
        config.vault.heartbeat_period_secs,
        config.vault.heartbeat_period_secs as f64 / 86_400.0
    );
    log::info!(
        "  Interval:   {} seconds ({:.1} hours)",
        config.server.check_interval_secs,
        config.server.check_interval_secs as f64 / 3600.0
    );
    log::info!("  Data dir:   {}", config.server.data_dir.display());

    let interval = Duration::from_secs(config.server.check_interval_secs);

    // Run first check immediately, then loop
    let mut first = true;
    loop {
        if !first {
            log::info!(
                "Sleeping {} seconds until next check…",
                config.server.check_interval_secs
            );
            tokio::time::sleep(interval).await;
        }
        first = false;

        match run_check_cycle(&config, &SystemClock) {
            Ok(_) => log::info!("Check cycle completed successfully."),
            Err(e) => log::error!("Check cycle failed: {:#}", e),
        }
    }
}

/// Execute a single check cycle: load the vault, evaluate, journal, report.
pub fn run_check_cycle(config: &ServerConfig, clock: &impl Clock) -> Result<CheckReport> {
    log::info!("Starting check cycle…");
    let now = clock.now();

    std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
        format!(
            "Failed to create data dir: {}",
            config.server.data_dir.display()
        )
    })?;

    let store = VaultStore::new(config.vault_state_path());
    let (vault, created) = load_or_create(config, &store, now)?;

    let status = evaluate_heartbeat(&vault, now, &config.heartbeat);
    log::info!(
        "[{}] {} | deadline {} | {} remaining | {:.0}% of period elapsed",
        config.vault.label,
        status.state,
        format_timestamp(status.deadline),
        format_duration(status.secs_remaining),
        status.elapsed_fraction * 100.0
    );

    let conn = journal::open_db(&config.journal_path()).with_context(|| {
        format!(
            "Failed to open journal: {}",
            config.journal_path().display()
        )
    })?;
    let previous_action = journal::last_check(&conn, &config.vault.label)
        .context("Failed to read status journal")?
        .map(|row| row.action);
    journal::record_check(
        &conn,
        &StatusCheckRow::from_status(&config.vault.label, now, vault.last_heartbeat(), &status),
    )
    .context("Failed to write status journal")?;

    let report = CheckReport {
        status,
        previous_action,
        created,
    };
    report_action(config, &report);
    Ok(report)
}

/// Load the persisted vault, or create it from config on first run.
///
/// Owner, beneficiary and period are fixed at creation; a snapshot that
/// disagrees with the config is refused rather than silently rewritten.
fn load_or_create(
    config: &ServerConfig,
    store: &VaultStore,
    now: Timestamp,
) -> Result<(Vault, bool)> {
    let existing = store
        .load()
        .with_context(|| format!("Failed to load vault from {}", store.path().display()))?;

    if let Some(vault) = existing {
        anyhow::ensure!(
            vault.owner() == config.vault.owner,
            "vault owner {} does not match configured owner {}",
            vault.owner(),
            config.vault.owner
        );
        anyhow::ensure!(
            vault.beneficiary() == config.vault.beneficiary,
            "vault beneficiary {} does not match configured beneficiary {}",
            vault.beneficiary(),
            config.vault.beneficiary
        );
        anyhow::ensure!(
            vault.heartbeat_period() == config.vault.heartbeat_period_secs,
            "vault period {}s differs from configured {}s (fixed at creation)",
            vault.heartbeat_period(),
            config.vault.heartbeat_period_secs
        );
        return Ok((vault, false));
    }

    let vault = Vault::new(
        config.vault.owner,
        config.vault.beneficiary,
        config.vault.heartbeat_period_secs,
        now,
    )
    .context("Failed to create vault")?;
    store
        .save(&vault)
        .with_context(|| format!("Failed to save vault to {}", store.path().display()))?;
    log::info!(
        "Created vault '{}' at {}; first deadline {}",
        config.vault.label,
        format_timestamp(now),
        format_timestamp(vault.deadline())
    );
    Ok((vault, true))
}

fn report_action(config: &ServerConfig, report: &CheckReport) {
    let label = &config.vault.label;
    let status = &report.status;

    if report.changed() {
        if let Some(previous) = report.previous_action {
            log::warn!(
                "[{}] Status changed: {} → {}",
                label,
                previous.as_str(),
                status.action.as_str()
            );
        }
    }

    match status.action {
        HeartbeatAction::Healthy => {
            log::info!("[{}] Healthy, no heartbeat needed yet.", label);
        }
        HeartbeatAction::CheckinRecommended => {
            log::warn!(
                "[{}] Heartbeat recommended: {} left before the beneficiary takes over.",
                label,
                format_duration(status.secs_remaining)
            );
        }
        HeartbeatAction::CheckinRequired => {
            log::warn!(
                "[{}] Heartbeat REQUIRED: only {} left before the beneficiary takes over.",
                label,
                format_duration(status.secs_remaining)
            );
        }
        HeartbeatAction::Expired => {
            if report.changed() || report.previous_action.is_none() {
                log::error!(
                    "[{}] Deadline {} passed; beneficiary {} now controls withdrawals.",
                    label,
                    format_timestamp(status.deadline),
                    config.vault.beneficiary
                );
            } else {
                log::warn!("[{}] Still expired; beneficiary controls withdrawals.", label);
            }
        }
    }
}

/// RFC 3339 rendering of a unix timestamp.
pub fn format_timestamp(ts: Timestamp) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| format!("@{}", ts))
}

/// Coarse human duration: days, hours or minutes.
pub fn format_duration(secs: u64) -> String {
    if secs >= 86_400 {
        format!("{:.1} days", secs as f64 / 86_400.0)
    } else if secs >= 3600 {
        format!("{:.1} hours", secs as f64 / 3600.0)
    } else {
        format!("{} minutes", secs / 60)
    }
}
