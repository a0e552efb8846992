//! Serve command - run the live gallery in the foreground

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use superdesign_core::WatchConfig;
use superdesign_server::LiveSync;

pub async fn run(base: &Path, port: u16) -> Result<()> {
    let live = LiveSync::new(WatchConfig::default());
    let url = live
        .start(base, port)
        .await
        .context("Failed to start live gallery")?;

    println!("{}", "🚀 Live gallery running".green().bold());
    println!("  {}", url.cyan());
    println!("{}", "👀 Watching for changes... (Ctrl+C to stop)".dimmed());

    tokio::signal::ctrl_c().await?;
    live.stop(base);
    println!();
    println!("{}", "👋 Stopped".yellow());
    Ok(())
}
