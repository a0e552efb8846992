//! Retention policy for generated designs
//!
//! Records are ranked newest first. A record is removed when its rank is at
//! or beyond `max_count`, or when it is older than `max_age_days`; either
//! limit alone is enough.

use crate::config::SettingsStore;
use crate::metadata::MetadataStore;
use crate::types::{AssetRecord, CleanupReport};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::{info, warn};

/// Parameters of one cleanup run; unset limits come from the persisted settings
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupRequest {
    pub max_age_days: Option<u32>,
    pub max_count: Option<usize>,
    pub dry_run: bool,
}

pub struct CleanupEngine {
    store: MetadataStore,
    settings: SettingsStore,
}

impl CleanupEngine {
    pub fn new(store: MetadataStore, settings: SettingsStore) -> Self {
        Self { store, settings }
    }

    pub async fn run(&self, request: CleanupRequest) -> CleanupReport {
        self.run_at(request, Utc::now()).await
    }

    /// Run with an explicit clock
    pub async fn run_at(&self, request: CleanupRequest, now: DateTime<Utc>) -> CleanupReport {
        let settings = self.settings.load().await;
        let max_age_days = request.max_age_days.unwrap_or(settings.max_age_days);
        let max_count = request.max_count.unwrap_or(settings.max_count);

        let records = self.store.reconcile().await;
        let (doomed, kept) = partition(&records, max_count, age_cutoff(now, max_age_days));

        let mut report = CleanupReport {
            kept: kept.iter().map(|r| r.file_name.clone()).collect(),
            ..Default::default()
        };

        if request.dry_run {
            report.deleted = doomed.iter().map(|r| r.file_name.clone()).collect();
            info!(
                "Cleanup dry run: {} would be deleted, {} kept",
                report.deleted.len(),
                report.kept.len()
            );
            return report;
        }

        let (deleted, errors) = self.delete_batch(&records, &doomed).await;
        report.deleted = deleted;
        report.errors = errors;

        info!(
            "Cleanup finished: {} deleted, {} kept, {} errors",
            report.deleted.len(),
            report.kept.len(),
            report.errors.len()
        );
        report
    }

    /// Delete the files of `doomed` and persist `records` minus the ones
    /// actually removed. Returns (deleted names, error messages); a failure
    /// keeps its record and does not stop the batch.
    async fn delete_batch(
        &self,
        records: &[AssetRecord],
        doomed: &[&AssetRecord],
    ) -> (Vec<String>, Vec<String>) {
        let mut deleted = Vec::new();
        let mut errors = Vec::new();
        for record in doomed {
            let path = self.store.layout().asset_path(&record.file_name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to delete {}: {}", record.file_name, e);
                    errors.push(format!("Failed to delete {}: {}", record.file_name, e));
                    continue;
                }
            }
            deleted.push(record.file_name.clone());
        }

        if !deleted.is_empty() {
            let removed: HashSet<&str> = deleted.iter().map(String::as_str).collect();
            let remaining: Vec<AssetRecord> = records
                .iter()
                .filter(|r| !removed.contains(r.file_name.as_str()))
                .cloned()
                .collect();
            self.store.save(&remaining).await;
        }
        (deleted, errors)
    }
}

/// Oldest creation time that survives the age limit. A limit too large to
/// represent means no age cutoff.
fn age_cutoff(now: DateTime<Utc>, max_age_days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(max_age_days))
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Split records into (delete, keep), both in newest-first order
fn partition(
    records: &[AssetRecord],
    max_count: usize,
    cutoff: DateTime<Utc>,
) -> (Vec<&AssetRecord>, Vec<&AssetRecord>) {
    let mut sorted: Vec<&AssetRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.created().cmp(&a.created()));

    let mut doomed = Vec::new();
    let mut kept = Vec::new();
    for (index, record) in sorted.into_iter().enumerate() {
        if index >= max_count || record.created() < cutoff {
            doomed.push(record);
        } else {
            kept.push(record);
        }
    }
    (doomed, kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkspaceLayout;
    use crate::types::CleanupSettings;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        layout: WorkspaceLayout,
        engine: CleanupEngine,
        store: MetadataStore,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let layout = WorkspaceLayout::ensure(Some(temp.path())).unwrap();
        let store = MetadataStore::new(layout.clone());
        let engine = CleanupEngine::new(store.clone(), SettingsStore::new(&layout));
        Fixture {
            _temp: temp,
            layout,
            engine,
            store,
        }
    }

    /// Write `count` assets, asset `i` created `i + offset_hours` hours before `now`
    async fn seed(fx: &Fixture, count: usize, offset_hours: i64, now: DateTime<Utc>) {
        let mut records = Vec::new();
        for i in 0..count {
            let name = format!("design_{:02}.html", i);
            std::fs::write(fx.layout.asset_path(&name), "<html/>").unwrap();
            records.push(AssetRecord {
                file_name: name.clone(),
                file_path: fx.layout.asset_path(&name),
                created_at: Some(now - Duration::hours(i as i64 + offset_hours)),
                file_size: 7,
                design_type: "ui".to_string(),
                prompt: "seed".to_string(),
                framework: None,
            });
        }
        fx.store.try_save(&records).await.unwrap();
    }

    #[tokio::test]
    async fn test_count_limit_removes_oldest() {
        let fx = fixture();
        let now = Utc::now();
        seed(&fx, 60, 0, now).await;

        let report = fx
            .engine
            .run_at(
                CleanupRequest {
                    max_count: Some(50),
                    ..Default::default()
                },
                now,
            )
            .await;

        assert_eq!(report.deleted.len(), 10);
        assert_eq!(report.kept.len(), 50);
        assert!(report.errors.is_empty());
        let expected: Vec<String> = (50..60).map(|i| format!("design_{:02}.html", i)).collect();
        assert_eq!(report.deleted, expected);
        for name in &expected {
            assert!(!fx.layout.asset_path(name).exists());
        }
        assert_eq!(fx.store.load().await.len(), 50);
    }

    #[tokio::test]
    async fn test_age_limit_removes_everything_stale() {
        let fx = fixture();
        let now = Utc::now();
        seed(&fx, 5, 24 * 40, now).await;

        let report = fx.engine.run_at(CleanupRequest::default(), now).await;

        assert_eq!(report.deleted.len(), 5);
        assert!(report.kept.is_empty());
        assert!(fx.store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_matches_real_run_without_side_effects() {
        let fx = fixture();
        let now = Utc::now();
        seed(&fx, 8, 0, now).await;
        let request = CleanupRequest {
            max_count: Some(3),
            ..Default::default()
        };

        let before = fx.store.load().await;
        let dry = fx
            .engine
            .run_at(CleanupRequest { dry_run: true, ..request }, now)
            .await;
        assert_eq!(fx.store.load().await, before);
        for record in &before {
            assert!(fx.layout.asset_path(&record.file_name).exists());
        }

        let real = fx.engine.run_at(request, now).await;
        assert_eq!(dry.deleted, real.deleted);
        assert_eq!(dry.kept, real.kept);
    }

    #[tokio::test]
    async fn test_persisted_settings_apply_when_unset() {
        let fx = fixture();
        let now = Utc::now();
        seed(&fx, 4, 0, now).await;
        SettingsStore::new(&fx.layout)
            .try_save(&CleanupSettings {
                max_age_days: 30,
                max_count: 1,
                enabled: true,
            })
            .await
            .unwrap();

        let report = fx
            .engine
            .run_at(
                CleanupRequest {
                    dry_run: true,
                    ..Default::default()
                },
                now,
            )
            .await;
        assert_eq!(report.kept, vec!["design_00.html".to_string()]);
        assert_eq!(report.deleted.len(), 3);
    }

    #[tokio::test]
    async fn test_file_removed_externally_is_not_reported() {
        let fx = fixture();
        let now = Utc::now();
        seed(&fx, 2, 24 * 40, now).await;
        // Reconcile prunes the record before the policy runs
        std::fs::remove_file(fx.layout.asset_path("design_01.html")).unwrap();

        let report = fx.engine.run_at(CleanupRequest::default(), now).await;
        assert_eq!(report.deleted, vec!["design_00.html".to_string()]);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_huge_age_limit_means_no_cutoff() {
        let fx = fixture();
        let now = Utc::now();
        seed(&fx, 3, 24 * 400, now).await;

        let report = fx
            .engine
            .run_at(
                CleanupRequest {
                    max_age_days: Some(u32::MAX),
                    dry_run: true,
                    ..Default::default()
                },
                now,
            )
            .await;
        assert!(report.deleted.is_empty());
        assert_eq!(report.kept.len(), 3);
        assert_eq!(age_cutoff(now, u32::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(age_cutoff(now, 1), now - Duration::days(1));
    }

    #[tokio::test]
    async fn test_failed_delete_is_collected_and_batch_continues() {
        let fx = fixture();
        let now = Utc::now();
        seed(&fx, 3, 0, now).await;
        let records = fx.store.load().await;
        // A non-empty directory in place of the file cannot be removed with remove_file
        let blocked = fx.layout.asset_path("design_01.html");
        std::fs::remove_file(&blocked).unwrap();
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("inner.txt"), "x").unwrap();

        let doomed: Vec<&AssetRecord> = records.iter().collect();
        let (deleted, errors) = fx.engine.delete_batch(&records, &doomed).await;

        assert_eq!(deleted, vec!["design_00.html".to_string(), "design_02.html".to_string()]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to delete design_01.html: "));
        assert!(!fx.layout.asset_path("design_00.html").exists());
        assert!(!fx.layout.asset_path("design_02.html").exists());

        let stored: Vec<String> = fx.store.load().await.into_iter().map(|r| r.file_name).collect();
        assert_eq!(stored, vec!["design_01.html".to_string()]);
    }

    #[test]
    fn test_partition_prefers_newest() {
        let now = Utc::now();
        let record = |name: &str, hours: i64| AssetRecord {
            file_name: name.to_string(),
            file_path: Default::default(),
            created_at: Some(now - Duration::hours(hours)),
            file_size: 0,
            design_type: String::new(),
            prompt: String::new(),
            framework: None,
        };
        let records = vec![record("old", 10), record("new", 1), record("mid", 5)];
        let (doomed, kept) = partition(&records, 2, now - Duration::days(30));
        assert_eq!(doomed.iter().map(|r| r.file_name.as_str()).collect::<Vec<_>>(), ["old"]);
        assert_eq!(
            kept.iter().map(|r| r.file_name.as_str()).collect::<Vec<_>>(),
            ["new", "mid"]
        );
    }
}
