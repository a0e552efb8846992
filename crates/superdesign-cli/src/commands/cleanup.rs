//! Cleanup commands - retention runs and persisted settings

use anyhow::{Context, Result};
use colored::Colorize;
use superdesign_core::{CleanupRequest, SettingsUpdate, Workspace};

pub async fn run(workspace: &Workspace, request: CleanupRequest) -> Result<()> {
    let settings = workspace.cleanup_settings().await;
    let max_age_days = request.max_age_days.unwrap_or(settings.max_age_days);
    let max_count = request.max_count.unwrap_or(settings.max_count);

    if request.dry_run {
        println!("{}", "🔍 Cleanup dry run".cyan().bold());
    } else {
        println!("{}", "🧹 Cleaning up designs...".cyan().bold());
    }
    println!(
        "  {}",
        format!(
            "Keeping at most {} designs, none older than {} days",
            max_count, max_age_days
        )
        .dimmed()
    );

    let report = workspace.cleanup(request).await;

    let verb = if request.dry_run {
        "Would delete"
    } else {
        "Deleted"
    };
    for name in &report.deleted {
        println!("  {} {}", format!("{}:", verb).red(), name);
    }
    for message in &report.errors {
        println!("  {} {}", "❌".red(), message);
    }

    println!();
    println!(
        "{}",
        format!(
            "✅ {} {}, kept {}",
            verb,
            report.deleted.len(),
            report.kept.len()
        )
        .green()
    );
    if !report.errors.is_empty() {
        println!(
            "{}",
            format!("⚠️  {} files could not be deleted", report.errors.len()).yellow()
        );
    }
    Ok(())
}

pub async fn settings(workspace: &Workspace, update: SettingsUpdate) -> Result<()> {
    let settings = if update.is_empty() {
        workspace.cleanup_settings().await
    } else {
        let saved = workspace
            .update_cleanup_settings(update)
            .await
            .context("Failed to save cleanup settings")?;
        println!("{}", "✅ Cleanup settings updated".green());
        saved
    };

    println!("{}", "⚙️  Cleanup settings:".yellow());
    println!("  max age days: {}", settings.max_age_days.to_string().cyan());
    println!("  max count:    {}", settings.max_count.to_string().cyan());
    println!("  enabled:      {}", settings.enabled.to_string().cyan());
    Ok(())
}
