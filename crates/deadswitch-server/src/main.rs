//! Deadswitch Server: headless daemon for 24/7 vault liveness monitoring
//!
//! Keeps the persisted vault snapshot under watch, warns as the heartbeat
//! deadline approaches and journals every evaluation to SQLite.
//!
//! # Usage
//!
//! ```bash
//! deadswitch-server --config /path/to/deadswitch-server.toml
//! deadswitch-server --check     # Run one check cycle and exit
//! deadswitch-server --validate  # Validate config and exit
//! ```

mod config;
mod daemon;
mod journal;

use anyhow::{Context, Result};
use deadswitch_vault::SystemClock;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Parse CLI args (minimal, no clap dependency)
    let args: Vec<String> = std::env::args().collect();

    let mut config_path = PathBuf::from("/config/deadswitch-server.toml");
    let mut one_shot = false;
    let mut validate_only = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = PathBuf::from(&args[i]);
                } else {
                    anyhow::bail!("--config requires a path argument");
                }
            }
            "--check" | "--once" => {
                one_shot = true;
            }
            "--validate" => {
                validate_only = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--version" | "-V" => {
                println!("deadswitch-server {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            other => {
                anyhow::bail!("Unknown argument: {}", other);
            }
        }
        i += 1;
    }

    // Load config
    let mut server_config = config::ServerConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Apply env overrides
    server_config
        .apply_env_overrides()
        .context("Invalid environment override")?;

    // Validate
    server_config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger
    std::env::set_var("RUST_LOG", &server_config.server.log_level);
    env_logger::init();

    if validate_only {
        println!("✅ Configuration is valid.");
        println!("  Vault:          {}", server_config.vault.label);
        println!("  Owner:          {}", server_config.vault.owner);
        println!("  Beneficiary:    {}", server_config.vault.beneficiary);
        println!(
            "  Period:         {} secs",
            server_config.vault.heartbeat_period_secs
        );
        println!(
            "  Check interval: {} secs",
            server_config.server.check_interval_secs
        );
        println!(
            "  Thresholds:     {:.0}% / {:.0}%",
            server_config.heartbeat.checkin_threshold * 100.0,
            server_config.heartbeat.critical_threshold * 100.0
        );
        println!(
            "  Data dir:       {}",
            server_config.server.data_dir.display()
        );
        return Ok(());
    }

    if one_shot {
        log::info!("Running single check cycle…");
        let report = daemon::run_check_cycle(&server_config, &SystemClock)?;
        println!(
            "{}{}: {} (deadline {}, {} remaining)",
            server_config.vault.label,
            if report.created { " [new]" } else { "" },
            report.status.action.as_str(),
            daemon::format_timestamp(report.status.deadline),
            daemon::format_duration(report.status.secs_remaining)
        );
        log::info!("Done.");
        return Ok(());
    }

    // Build tokio runtime
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    // Install Ctrl-C handler for graceful shutdown
    let shutdown = rt.block_on(async {
        tokio::select! {
            result = daemon::run(server_config) => result,
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received shutdown signal. Exiting…");
                Ok(())
            }
        }
    });

    if let Err(e) = shutdown {
        log::error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"Deadswitch Server: headless vault liveness monitoring daemon

USAGE:
    deadswitch-server [OPTIONS]

OPTIONS:
    -c, --config <PATH>   Config file path (default: /config/deadswitch-server.toml)
    --check, --once       Run a single check cycle and exit
    --validate            Validate config file and exit
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES (override config file):
    DEADSWITCH_DATA_DIR          Data directory path
    DEADSWITCH_CHECK_INTERVAL    Check interval in seconds
    DEADSWITCH_LOG_LEVEL         Log level (error/warn/info/debug/trace)
    DEADSWITCH_OWNER             Owner identity (0x-prefixed hex)
    DEADSWITCH_BENEFICIARY       Beneficiary identity (0x-prefixed hex)
    DEADSWITCH_HEARTBEAT_PERIOD  Heartbeat period in seconds

EXAMPLES:
    # Run as daemon with config file
    deadswitch-server --config /path/to/config.toml

    # Single check (useful for cron jobs)
    deadswitch-server --config config.toml --check

    # Validate configuration
    deadswitch-server --config config.toml --validate
"#
    );
}
