//! Superdesign CLI
//!
//! Inspect and maintain the design files generated into a workspace, and
//! run the live gallery.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use superdesign_core::Workspace;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "superdesign")]
#[command(author, version, about = "Superdesign - manage generated design iterations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace directory (defaults to the current directory)
    #[arg(short, long, global = true, env = "SUPERDESIGN_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List design files and design systems
    List,

    /// Record provenance for a generated design file
    Record {
        /// File name inside design_iterations
        file: String,

        /// Kind of design (ui, component, wireframe, logo, icon, ...)
        #[arg(short, long)]
        design_type: String,

        /// Prompt that produced the design
        #[arg(short, long)]
        prompt: String,

        /// Target framework
        #[arg(short, long)]
        framework: Option<String>,
    },

    /// Delete a design file and its record
    Delete {
        /// File name inside design_iterations
        file: String,
    },

    /// Remove old designs
    Cleanup {
        /// Delete designs older than this many days
        #[arg(long)]
        max_age_days: Option<u32>,

        /// Keep at most this many designs
        #[arg(long)]
        max_count: Option<usize>,

        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },

    /// Show or update the persisted cleanup settings
    Settings {
        #[arg(long)]
        max_age_days: Option<u32>,

        #[arg(long)]
        max_count: Option<usize>,

        #[arg(long)]
        enabled: Option<bool>,
    },

    /// Compare design_iterations with a manifest JSON file
    Diff {
        /// Path to a JSON array of {name, size, modified}
        manifest: PathBuf,
    },

    /// Run the live gallery until interrupted
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "SUPERDESIGN_PORT", default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "superdesign_cli=debug,superdesign_core=debug,superdesign_server=debug"
        } else {
            "superdesign_cli=warn,superdesign_server=info"
        })
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    info!("Starting Superdesign CLI");

    let result = run(cli).await;

    if let Err(ref e) = result {
        error!("Command failed: {:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    let base = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    let workspace = Workspace::open(Some(&base))
        .with_context(|| format!("Failed to open workspace at {}", base.display()))?;

    match cli.command {
        Commands::List => commands::assets::list(&workspace).await,
        Commands::Record {
            file,
            design_type,
            prompt,
            framework,
        } => {
            commands::assets::record(&workspace, &file, &design_type, &prompt, framework.as_deref())
                .await
        }
        Commands::Delete { file } => commands::assets::delete(&workspace, &file).await,
        Commands::Cleanup {
            max_age_days,
            max_count,
            dry_run,
        } => {
            commands::cleanup::run(
                &workspace,
                superdesign_core::CleanupRequest {
                    max_age_days,
                    max_count,
                    dry_run,
                },
            )
            .await
        }
        Commands::Settings {
            max_age_days,
            max_count,
            enabled,
        } => {
            commands::cleanup::settings(
                &workspace,
                superdesign_core::SettingsUpdate {
                    max_age_days,
                    max_count,
                    enabled,
                },
            )
            .await
        }
        Commands::Diff { manifest } => commands::diff::run(&workspace, &manifest).await,
        Commands::Serve { port } => commands::serve::run(&base, port).await,
    }
}
