//! Workspace layout and persisted settings for Superdesign

use crate::error::Result;
use crate::types::{CleanupSettings, WriteStatus};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Directory created under the workspace base path
pub const WORKSPACE_DIR_NAME: &str = "superdesign";
/// Generated design files live here
pub const ITERATIONS_DIR_NAME: &str = "design_iterations";
/// Extracted design systems live here
pub const DESIGN_SYSTEM_DIR_NAME: &str = "design_system";
pub const METADATA_FILE_NAME: &str = "metadata.json";
pub const SETTINGS_FILE_NAME: &str = "cleanup-settings.json";

/// Resolved directory tree of one Superdesign workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    /// Resolve the layout under `base` without touching the filesystem
    pub fn at(base: &Path) -> Self {
        Self {
            root: base.join(WORKSPACE_DIR_NAME),
        }
    }

    /// Resolve the layout (defaulting to the current directory) and create
    /// any missing directories. Safe to call repeatedly.
    pub fn ensure(base: Option<&Path>) -> Result<Self> {
        let base = match base {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?,
        };
        let layout = Self::at(&base);
        for dir in [
            layout.root.clone(),
            layout.iterations_dir(),
            layout.design_system_dir(),
        ] {
            if !dir.exists() {
                debug!("Creating workspace directory {}", dir.display());
                std::fs::create_dir_all(&dir)?;
            }
        }
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn iterations_dir(&self) -> PathBuf {
        self.root.join(ITERATIONS_DIR_NAME)
    }

    pub fn design_system_dir(&self) -> PathBuf {
        self.root.join(DESIGN_SYSTEM_DIR_NAME)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE_NAME)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE_NAME)
    }

    pub fn asset_path(&self, file_name: &str) -> PathBuf {
        self.iterations_dir().join(file_name)
    }

    /// List `*.json` design systems, sorted by name
    pub async fn list_design_systems(&self) -> Vec<String> {
        let mut names = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(self.design_system_dir()).await else {
            return names;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        names
    }
}

/// Persisted cleanup settings for one workspace
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(layout: &WorkspaceLayout) -> Self {
        Self {
            path: layout.settings_path(),
        }
    }

    /// Load settings, writing the defaults on first access. Unreadable or
    /// malformed files fall back to the defaults.
    pub async fn load(&self) -> CleanupSettings {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str::<CleanupSettings>(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("Error loading cleanup settings from {:?}: {}", self.path, e);
                    CleanupSettings::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let defaults = CleanupSettings::default();
                let _ = self.save(&defaults).await;
                defaults
            }
            Err(e) => {
                warn!("Error reading cleanup settings from {:?}: {}", self.path, e);
                CleanupSettings::default()
            }
        }
    }

    /// Overwrite the settings file
    pub async fn save(&self, settings: &CleanupSettings) -> WriteStatus {
        match self.try_save(settings).await {
            Ok(()) => WriteStatus::Written,
            Err(e) => {
                warn!("Error saving cleanup settings to {:?}: {}", self.path, e);
                WriteStatus::Failed(e.to_string())
            }
        }
    }

    pub async fn try_save(&self, settings: &CleanupSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

/// Timing knobs for watch sessions
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Interval between directory discovery passes
    pub discovery_interval: Duration,
    /// Stat polling interval of each per-file modification watch
    pub file_poll_interval: Duration,
    /// Wake discovery early on native filesystem notifications
    pub native_events: bool,
    /// Debounce window applied to native notifications
    pub debounce: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            discovery_interval: Duration::from_millis(2000),
            file_poll_interval: Duration::from_millis(1000),
            native_events: true,
            debounce: Duration::from_millis(200),
        }
    }
}

impl WatchConfig {
    /// Polling only, with the given intervals
    pub fn polling(discovery_interval: Duration, file_poll_interval: Duration) -> Self {
        Self {
            discovery_interval,
            file_poll_interval,
            native_events: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_creates_layout_idempotently() {
        let temp = TempDir::new().unwrap();
        let first = WorkspaceLayout::ensure(Some(temp.path())).unwrap();
        let second = WorkspaceLayout::ensure(Some(temp.path())).unwrap();
        assert_eq!(first, second);
        assert!(first.iterations_dir().is_dir());
        assert!(first.design_system_dir().is_dir());
        assert_eq!(first.metadata_path(), temp.path().join("superdesign/metadata.json"));
    }

    #[tokio::test]
    async fn test_settings_defaults_written_on_first_access() {
        let temp = TempDir::new().unwrap();
        let layout = WorkspaceLayout::ensure(Some(temp.path())).unwrap();
        let store = SettingsStore::new(&layout);

        let settings = store.load().await;
        assert_eq!(settings, CleanupSettings::default());
        assert!(layout.settings_path().exists());
    }

    #[tokio::test]
    async fn test_malformed_settings_fall_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let layout = WorkspaceLayout::ensure(Some(temp.path())).unwrap();
        std::fs::write(layout.settings_path(), "{not json").unwrap();

        let settings = SettingsStore::new(&layout).load().await;
        assert_eq!(settings, CleanupSettings::default());
    }

    #[tokio::test]
    async fn test_settings_round_trip_through_disk() {
        let temp = TempDir::new().unwrap();
        let layout = WorkspaceLayout::ensure(Some(temp.path())).unwrap();
        let store = SettingsStore::new(&layout);
        let custom = CleanupSettings {
            max_age_days: 7,
            max_count: 10,
            enabled: false,
        };

        assert!(store.save(&custom).await.is_written());
        assert_eq!(store.load().await, custom);
    }

    #[tokio::test]
    async fn test_list_design_systems_only_json() {
        let temp = TempDir::new().unwrap();
        let layout = WorkspaceLayout::ensure(Some(temp.path())).unwrap();
        std::fs::write(layout.design_system_dir().join("brand.json"), "{}").unwrap();
        std::fs::write(layout.design_system_dir().join("notes.txt"), "").unwrap();

        assert_eq!(layout.list_design_systems().await, vec!["brand.json".to_string()]);
    }
}
