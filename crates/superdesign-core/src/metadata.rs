//! Durable per-asset metadata
//!
//! The whole record set lives in one JSON file that is rewritten on every
//! save. Reads go through [`MetadataStore::reconcile`], which checks each
//! record against the asset directory so the store stays correct even when
//! files were added or removed while nothing was watching.

use crate::config::WorkspaceLayout;
use crate::error::Result;
use crate::types::{AssetRecord, WriteStatus};
use crate::utils::validate_file_name;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct MetadataStore {
    layout: WorkspaceLayout,
}

impl MetadataStore {
    pub fn new(layout: WorkspaceLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    /// Load persisted records. A missing or malformed file yields an empty set.
    pub async fn load(&self) -> Vec<AssetRecord> {
        let path = self.layout.metadata_path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Error reading metadata from {:?}: {}", path, e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!("Error loading metadata from {:?}: {}", path, e);
                Vec::new()
            }
        }
    }

    /// Overwrite the metadata file. Failures are logged and reported, never raised.
    pub async fn save(&self, records: &[AssetRecord]) -> WriteStatus {
        match self.try_save(records).await {
            Ok(()) => WriteStatus::Written,
            Err(e) => {
                warn!("Error saving metadata: {}", e);
                WriteStatus::Failed(e.to_string())
            }
        }
    }

    /// Strict variant of [`save`](Self::save)
    pub async fn try_save(&self, records: &[AssetRecord]) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;
        tokio::fs::write(self.layout.metadata_path(), content).await?;
        Ok(())
    }

    /// Record provenance for a freshly generated file, replacing any previous
    /// record with the same name. Does nothing when the file is not on disk.
    pub async fn upsert(
        &self,
        file_name: &str,
        design_type: &str,
        prompt: &str,
        framework: Option<&str>,
    ) -> Result<Option<AssetRecord>> {
        validate_file_name(file_name)?;
        let file_path = self.layout.asset_path(file_name);
        let stats = match tokio::fs::metadata(&file_path).await {
            Ok(stats) if stats.is_file() => stats,
            _ => {
                debug!("Skipping metadata for missing file {}", file_name);
                return Ok(None);
            }
        };

        let record = AssetRecord {
            file_name: file_name.to_string(),
            file_path,
            created_at: Some(birth_time(&stats)),
            file_size: stats.len(),
            design_type: design_type.to_string(),
            prompt: prompt.to_string(),
            framework: framework.map(str::to_string),
        };

        let mut records = self.load().await;
        records.retain(|r| r.file_name != file_name);
        records.push(record.clone());
        self.save(&records).await;

        info!("Recorded metadata for {}", file_name);
        Ok(Some(record))
    }

    /// Refresh every record from the filesystem, dropping records whose file
    /// is gone, persist the result and return it.
    pub async fn reconcile(&self) -> Vec<AssetRecord> {
        let records = self.load().await;
        let mut refreshed = Vec::with_capacity(records.len());

        for mut record in records {
            if validate_file_name(&record.file_name).is_err() {
                warn!("Dropping metadata entry with invalid name {:?}", record.file_name);
                continue;
            }
            let file_path = self.layout.asset_path(&record.file_name);
            match tokio::fs::metadata(&file_path).await {
                Ok(stats) if stats.is_file() => {
                    record.file_size = stats.len();
                    if record.created_at.is_none() {
                        record.created_at = Some(birth_time(&stats));
                    }
                    record.file_path = file_path;
                    refreshed.push(record);
                }
                _ => debug!("Pruning metadata for deleted file {}", record.file_name),
            }
        }

        self.save(&refreshed).await;
        refreshed
    }

    /// Same as [`reconcile`](Self::reconcile); the listing used by callers
    pub async fn list(&self) -> Vec<AssetRecord> {
        self.reconcile().await
    }

    /// Drop the record for `file_name`. Returns whether one existed.
    pub async fn remove(&self, file_name: &str) -> bool {
        let mut records = self.load().await;
        let before = records.len();
        records.retain(|r| r.file_name != file_name);
        if records.len() == before {
            return false;
        }
        self.save(&records).await;
        true
    }
}

/// Filesystem birth time, falling back to mtime and then to now
pub(crate) fn birth_time(stats: &std::fs::Metadata) -> DateTime<Utc> {
    stats
        .created()
        .or_else(|_| stats.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}
