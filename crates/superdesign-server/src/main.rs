//! Superdesign Live
//!
//! Standalone live gallery: serves a workspace's design iterations and
//! pushes file changes to open viewers until interrupted.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use superdesign_core::WatchConfig;
use superdesign_server::LiveSync;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Superdesign Live v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    info!(
        "Config loaded: workspace={}, port={}",
        config.workspace.display(),
        config.port
    );

    let live = LiveSync::new(config.watch);
    let url = live
        .start(&config.workspace, config.port)
        .await
        .context("Failed to start live gallery")?;
    println!("Live gallery: {}", url);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down");
    live.stop(&config.workspace);
    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    workspace: PathBuf,
    port: u16,
    watch: WatchConfig,
}

fn load_config() -> Result<Config> {
    let workspace = match std::env::var("SUPERDESIGN_WORKSPACE") {
        Ok(path) => PathBuf::from(path),
        Err(_) => std::env::current_dir().context("Failed to resolve current directory")?,
    };

    let port = match std::env::var("SUPERDESIGN_PORT") {
        Ok(value) => value
            .parse()
            .with_context(|| format!("Invalid SUPERDESIGN_PORT: {}", value))?,
        Err(_) => 3000,
    };

    let mut watch = WatchConfig::default();
    if let Ok(value) = std::env::var("SUPERDESIGN_POLL_MS") {
        match value.parse::<u64>() {
            Ok(ms) if ms > 0 => watch.discovery_interval = Duration::from_millis(ms),
            _ => warn!("Ignoring invalid SUPERDESIGN_POLL_MS: {}", value),
        }
    }

    Ok(Config {
        workspace,
        port,
        watch,
    })
}
