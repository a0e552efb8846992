//! Manifest diffing against the live asset directory

use crate::types::{ChangeType, DiffResult, FileChange, LiveFile, ManifestEntry};
use crate::utils::is_asset_file;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// List asset files directly inside `dir`, sorted by name.
/// A missing or unreadable directory scans as empty.
pub async fn scan_assets(dir: &Path) -> Vec<LiveFile> {
    let mut files = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot scan {}: {}", dir.display(), e);
            return files;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if !is_asset_file(&path) {
            continue;
        }
        // The agent may delete files between listing and stat
        let Ok(metadata) = tokio::fs::metadata(&path).await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        if let Some(file) = LiveFile::from_metadata(path, &metadata) {
            files.push(file);
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

/// Compare live files with a previously observed manifest.
///
/// Live files are classified against the manifest (`added` / `modified`) and
/// manifest entries against the live files (`deleted`), so a name never gets
/// two classifications.
pub fn diff(live: &[LiveFile], manifest: &[ManifestEntry]) -> DiffResult {
    let mut by_name: HashMap<&str, &ManifestEntry> = HashMap::with_capacity(manifest.len());
    for entry in manifest {
        by_name.entry(entry.name.as_str()).or_insert(entry);
    }

    let mut changes = Vec::new();
    for file in live {
        match by_name.get(file.name.as_str()) {
            None => changes.push(FileChange::new(&file.name, ChangeType::Added)),
            Some(entry) if entry.size != file.size || entry.modified != file.modified => {
                changes.push(FileChange::new(&file.name, ChangeType::Modified))
            }
            Some(_) => {}
        }
    }

    let live_names: HashSet<&str> = live.iter().map(|f| f.name.as_str()).collect();
    let mut reported = HashSet::new();
    for entry in manifest {
        let name = entry.name.as_str();
        if !live_names.contains(name) && reported.insert(name) {
            changes.push(FileChange::new(name, ChangeType::Deleted));
        }
    }

    DiffResult::from_changes(changes)
}
