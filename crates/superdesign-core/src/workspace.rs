//! Entry point used by tool handlers, the CLI and the live sync server

use crate::cleanup::{CleanupEngine, CleanupRequest};
use crate::config::{SettingsStore, WorkspaceLayout};
use crate::error::{DesignError, Result};
use crate::manifest::{diff, scan_assets};
use crate::metadata::MetadataStore;
use crate::types::{AssetRecord, CleanupReport, CleanupSettings, DiffResult, ManifestEntry};
use crate::utils::validate_file_name;
use std::path::Path;
use tracing::info;

/// Partial update of the persisted cleanup settings
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsUpdate {
    pub max_age_days: Option<u32>,
    pub max_count: Option<usize>,
    pub enabled: Option<bool>,
}

impl SettingsUpdate {
    pub fn apply(&self, settings: &mut CleanupSettings) {
        if let Some(days) = self.max_age_days {
            settings.max_age_days = days;
        }
        if let Some(count) = self.max_count {
            settings.max_count = count;
        }
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max_age_days.is_none() && self.max_count.is_none() && self.enabled.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Workspace {
    layout: WorkspaceLayout,
    metadata: MetadataStore,
    settings: SettingsStore,
}

impl Workspace {
    /// Resolve the workspace under `base` (or the current directory) and
    /// create its directories if needed.
    pub fn open(base: Option<&Path>) -> Result<Self> {
        let layout = WorkspaceLayout::ensure(base)?;
        Ok(Self::with_layout(layout))
    }

    pub fn with_layout(layout: WorkspaceLayout) -> Self {
        Self {
            metadata: MetadataStore::new(layout.clone()),
            settings: SettingsStore::new(&layout),
            layout,
        }
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub async fn upsert_asset(
        &self,
        file_name: &str,
        design_type: &str,
        prompt: &str,
        framework: Option<&str>,
    ) -> Result<Option<AssetRecord>> {
        self.metadata
            .upsert(file_name, design_type, prompt, framework)
            .await
    }

    pub async fn reconcile_assets(&self) -> Vec<AssetRecord> {
        self.metadata.reconcile().await
    }

    pub async fn list_assets(&self) -> Vec<AssetRecord> {
        self.metadata.list().await
    }

    pub async fn list_design_systems(&self) -> Vec<String> {
        self.layout.list_design_systems().await
    }

    /// Remove a design file and its record
    pub async fn delete_asset(&self, file_name: &str) -> Result<()> {
        validate_file_name(file_name)?;
        let path = self.layout.asset_path(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // A dangling record still goes away
                self.metadata.remove(file_name).await;
                return Err(DesignError::asset_not_found(file_name));
            }
            Err(e) => return Err(e.into()),
        }
        self.metadata.remove(file_name).await;
        info!("Deleted design {}", file_name);
        Ok(())
    }

    pub async fn cleanup(&self, request: CleanupRequest) -> CleanupReport {
        CleanupEngine::new(self.metadata.clone(), self.settings.clone())
            .run(request)
            .await
    }

    pub async fn cleanup_settings(&self) -> CleanupSettings {
        self.settings.load().await
    }

    /// Merge `update` into the persisted settings and return the result
    pub async fn update_cleanup_settings(&self, update: SettingsUpdate) -> Result<CleanupSettings> {
        let mut settings = self.settings.load().await;
        update.apply(&mut settings);
        self.settings.try_save(&settings).await?;
        Ok(settings)
    }

    /// Diff the iterations directory against a manifest a caller saw earlier
    pub async fn diff_manifest(&self, manifest: &[ManifestEntry]) -> DiffResult {
        let live = scan_assets(&self.layout.iterations_dir()).await;
        diff(&live, manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangeType;
    use tempfile::TempDir;

    fn open() -> (TempDir, Workspace) {
        let temp = TempDir::new().unwrap();
        let workspace = Workspace::open(Some(temp.path())).unwrap();
        (temp, workspace)
    }

    #[tokio::test]
    async fn test_open_creates_layout() {
        let (temp, workspace) = open();
        assert!(temp.path().join("superdesign/design_iterations").is_dir());
        assert!(temp.path().join("superdesign/design_system").is_dir());
        assert_eq!(workspace.layout().root(), temp.path().join("superdesign"));
    }

    #[tokio::test]
    async fn test_delete_asset() {
        let (_temp, workspace) = open();
        std::fs::write(workspace.layout().asset_path("card.html"), "<html/>").unwrap();
        workspace.upsert_asset("card.html", "ui", "a card", None).await.unwrap();

        workspace.delete_asset("card.html").await.unwrap();
        assert!(!workspace.layout().asset_path("card.html").exists());
        assert!(workspace.list_assets().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_asset_is_not_found() {
        let (_temp, workspace) = open();
        let err = workspace.delete_asset("nope.html").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Design file nope.html does not exist");
    }

    #[tokio::test]
    async fn test_delete_rejects_traversal() {
        let (_temp, workspace) = open();
        let err = workspace.delete_asset("../metadata.json").await.unwrap_err();
        assert!(matches!(err, DesignError::InvalidFileName(_)));
        assert!(workspace.layout().root().exists());
    }

    #[tokio::test]
    async fn test_settings_partial_update() {
        let (_temp, workspace) = open();
        assert_eq!(workspace.cleanup_settings().await, CleanupSettings::default());

        let updated = workspace
            .update_cleanup_settings(SettingsUpdate {
                max_count: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.max_count, 5);
        assert_eq!(updated.max_age_days, 30);
        assert_eq!(workspace.cleanup_settings().await, updated);
    }

    #[tokio::test]
    async fn test_diff_manifest_against_iterations() {
        let (_temp, workspace) = open();
        std::fs::write(workspace.layout().asset_path("new.svg"), "<svg/>").unwrap();
        let manifest = vec![ManifestEntry {
            name: "old.html".to_string(),
            size: 10,
            modified: 0,
        }];

        let result = workspace.diff_manifest(&manifest).await;
        assert!(result.has_changes);
        assert_eq!(result.of_kind(ChangeType::Added).collect::<Vec<_>>(), ["new.svg"]);
        assert_eq!(result.of_kind(ChangeType::Deleted).collect::<Vec<_>>(), ["old.html"]);
    }

    #[tokio::test]
    async fn test_list_design_systems() {
        let (_temp, workspace) = open();
        std::fs::write(workspace.layout().design_system_dir().join("tokens.json"), "{}").unwrap();
        assert_eq!(workspace.list_design_systems().await, vec!["tokens.json".to_string()]);
    }
}
