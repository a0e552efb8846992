//! Diff command - compare design_iterations with a saved manifest

use anyhow::{Context, Result};
use std::path::Path;
use superdesign_core::{ManifestEntry, Workspace};

pub async fn run(workspace: &Workspace, manifest_path: &Path) -> Result<()> {
    let manifest = load_manifest(manifest_path).await?;
    let result = workspace.diff_manifest(&manifest).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))
}
