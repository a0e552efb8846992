//! Asset commands - list, record and delete design files

use anyhow::Result;
use colored::Colorize;
use superdesign_core::{AssetRecord, Workspace};

pub async fn list(workspace: &Workspace) -> Result<()> {
    let records = workspace.list_assets().await;
    let systems = workspace.list_design_systems().await;

    println!(
        "{}",
        format!("🎨 Designs in {}", workspace.layout().iterations_dir().display())
            .cyan()
            .bold()
    );
    if records.is_empty() {
        println!("  {}", "No recorded designs".dimmed());
    }
    for record in &records {
        println!("  {}", describe(record));
        if !record.prompt.is_empty() {
            println!("      {}", record.prompt.dimmed());
        }
    }

    println!();
    println!("{}", "📐 Design systems:".yellow());
    if systems.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for name in &systems {
        println!("  • {}", name);
    }
    Ok(())
}

pub async fn record(
    workspace: &Workspace,
    file: &str,
    design_type: &str,
    prompt: &str,
    framework: Option<&str>,
) -> Result<()> {
    match workspace
        .upsert_asset(file, design_type, prompt, framework)
        .await?
    {
        Some(record) => println!("{} {}", "✅ Recorded".green(), describe(&record)),
        None => println!(
            "{}",
            format!("⚠️  {} is not in design_iterations, nothing recorded", file).yellow()
        ),
    }
    Ok(())
}

pub async fn delete(workspace: &Workspace, file: &str) -> Result<()> {
    workspace.delete_asset(file).await?;
    println!("{}", format!("✅ Deleted {}", file).green());
    Ok(())
}

/// One-line summary: name, type, framework, size and creation time
fn describe(record: &AssetRecord) -> String {
    let mut line = format!("{} [{}", record.file_name.bold(), record.design_type);
    if let Some(framework) = &record.framework {
        line.push_str(&format!(", {}", framework));
    }
    line.push(']');
    line.push_str(&format!(" {}", format_size(record.file_size)));
    if let Some(created) = record.created_at {
        line.push_str(&format!(" {}", created.format("%Y-%m-%d %H:%M")));
    }
    line
}

pub(crate) fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
