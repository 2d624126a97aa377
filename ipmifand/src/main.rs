//! ipmifand
//!
//! Temperature-driven fan governor for IPMI servers.
//!
//! Every polling cycle the daemon reads the CPU temperature of each configured
//! host, maps it to one of three fan speed bands and pins the fans at that
//! speed through `ipmitool`. Above the highest threshold, fan control is handed
//! back to the board. On SIGTERM or Ctrl+C every host is returned to automatic
//! fan control before exiting.
//!
//! # Dry-run
//!
//! With `--debug` (or `general.debug: true`) commands are only logged, never
//! executed, and each evaluation logs a compact `T:.. M:.. S:..` status line.

mod config;
mod control;
mod governor;
mod shutdown;

#[cfg(test)]
mod test_utils;

use anyhow::Result;
use clap::Parser;
use config::RuntimeConfig;
use control::{DecisionEngine, FanControl};
use governor::Governor;
use ipmifan_core::default_config_path;
use ipmifan_hardware::{IpmiDispatcher, IpmiTool, SystemSensors};
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// IPMI fan governor
#[derive(Parser, Debug)]
#[command(name = "ipmifand")]
#[command(version, about = "Temperature-driven IPMI fan governor", long_about = None)]
struct Args {
    /// Path to configuration file (YAML, or TOML with a .toml extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dry-run: log IPMI commands instead of executing them
    #[arg(short, long)]
    debug: bool,

    /// Seconds between two polling cycles (overrides the config file)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.verbose);

    info!("ipmifand starting...");

    // Determine config path: CLI flag > env var > default
    let config_path = args.config.unwrap_or_else(|| {
        std::env::var("IPMIFAN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    });

    let mut runtime_config = match RuntimeConfig::load(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime_config.apply_overrides(args.debug, args.interval) {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let dry_run = runtime_config.dry_run();
    let interval = runtime_config.interval();
    info!(
        "Managing {} host(s) from {}",
        runtime_config.hosts().len(),
        runtime_config.path().display()
    );

    let dispatcher = IpmiDispatcher::<IpmiTool>::new(dry_run);
    if dispatcher.is_dry_run() {
        info!("Dry-run mode: IPMI commands are logged, not executed");
    }
    let engine = DecisionEngine::new(FanControl::new(dispatcher, dry_run));
    let mut governor = Governor::new(
        runtime_config.into_hosts(),
        engine,
        SystemSensors::default(),
        interval,
    );
    governor.announce();

    // The signal listener publishes through a watch channel polled by the loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    governor.run(shutdown_rx).await;
    governor.shutdown().await;

    info!("ipmifand shutdown complete");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["ipmifand"]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.debug);
        assert!(args.interval.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_short_flags() {
        let args =
            Args::try_parse_from(["ipmifand", "-d", "-c", "/tmp/fans.toml", "-i", "30", "-v"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/fans.toml")));
        assert!(args.debug);
        assert_eq!(args.interval, Some(30));
        assert!(args.verbose);
    }

    #[test]
    fn test_args_reject_zero_interval() {
        assert!(Args::try_parse_from(["ipmifand", "--interval", "0"]).is_err());
        assert!(Args::try_parse_from(["ipmifand", "--unknown"]).is_err());
    }
}
