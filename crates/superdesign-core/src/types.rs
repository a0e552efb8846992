//! Core type definitions for Superdesign

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// Metadata kept for one generated design file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub file_name: String,
    #[serde(default)]
    pub file_path: PathBuf,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub design_type: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

impl AssetRecord {
    /// Creation time used for ordering; records without one sort as oldest.
    pub fn created(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Retention policy persisted per workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CleanupSettings {
    pub max_age_days: u32,
    pub max_count: usize,
    pub enabled: bool,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            max_age_days: 30,
            max_count: 50,
            enabled: true,
        }
    }
}

/// Caller-supplied snapshot of a previously observed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch
    pub modified: i64,
}

/// An asset file as currently found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: i64,
}

impl LiveFile {
    pub fn from_metadata(path: PathBuf, metadata: &std::fs::Metadata) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        Some(Self {
            name,
            size: metadata.len(),
            modified: metadata.modified().map(millis_since_epoch).unwrap_or(0),
            path,
        })
    }

    pub fn fingerprint(&self) -> (u64, i64) {
        (self.size, self.modified)
    }
}

pub fn millis_since_epoch(time: SystemTime) -> i64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Kind of change observed for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Modified => "modified",
            ChangeType::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub file: String,
    #[serde(rename = "type")]
    pub kind: ChangeType,
}

impl FileChange {
    pub fn new(file: impl Into<String>, kind: ChangeType) -> Self {
        Self {
            file: file.into(),
            kind,
        }
    }
}

/// Result of comparing a manifest with the asset directory
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub has_changes: bool,
    pub changes: Vec<FileChange>,
}

impl DiffResult {
    pub fn from_changes(changes: Vec<FileChange>) -> Self {
        Self {
            has_changes: !changes.is_empty(),
            changes,
        }
    }

    pub fn of_kind(&self, kind: ChangeType) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .filter(move |c| c.kind == kind)
            .map(|c| c.file.as_str())
    }
}

/// Outcome of a cleanup run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
    pub errors: Vec<String>,
}

/// Outcome of a best-effort write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    Failed(String),
}

impl WriteStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteStatus::Written)
    }
}

/// Body of one frame on the live-sync push channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMessage {
    pub event: String,
    pub data: serde_json::Value,
}

impl SyncMessage {
    pub const CONNECTED: &'static str = "connected";
    pub const FILE_CHANGED: &'static str = "file_changed";

    pub fn connected() -> Self {
        Self {
            event: Self::CONNECTED.to_string(),
            data: serde_json::json!({}),
        }
    }

    pub fn file_changed(change: &FileChange) -> Self {
        Self {
            event: Self::FILE_CHANGED.to_string(),
            data: serde_json::json!({ "file": change.file, "type": change.kind }),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"event":"{}","data":{{}}}}"#, self.event)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_uses_camel_case_on_disk() {
        let record = AssetRecord {
            file_name: "landing_1.html".to_string(),
            file_path: PathBuf::from("/tmp/landing_1.html"),
            created_at: None,
            file_size: 42,
            design_type: "ui".to_string(),
            prompt: "landing page".to_string(),
            framework: Some("html".to_string()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fileName"], "landing_1.html");
        assert_eq!(json["fileSize"], 42);
        assert_eq!(json["designType"], "ui");
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: CleanupSettings = serde_json::from_str(r#"{"maxCount": 5}"#).unwrap();
        assert_eq!(settings.max_count, 5);
        assert_eq!(settings.max_age_days, 30);
        assert!(settings.enabled);
    }

    #[test]
    fn test_file_changed_message_shape() {
        let msg = SyncMessage::file_changed(&FileChange::new("a.svg", ChangeType::Deleted));
        let value: serde_json::Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(value["event"], "file_changed");
        assert_eq!(value["data"]["file"], "a.svg");
        assert_eq!(value["data"]["type"], "deleted");
    }
}
