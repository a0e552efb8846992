//! Directory watch sessions for live sync
//!
//! A [`WatchSession`] polls one asset directory. Each discovery pass lists
//! the asset files, cancels the per-file watches of files that disappeared
//! (emitting `deleted`), then arms watches for new files (emitting `added`).
//! Per-file watches poll `(size, mtime)` and emit `modified`. When native
//! notifications are enabled a debounced `notify` watcher only triggers an
//! early pass; ordering is always decided by the pass itself.
//!
//! All session state sits behind one mutex that is never held across an
//! await. Every emission happens under it and checks the session is still
//! active, so once [`WatchSession::stop`] returns nothing more is delivered.

use crate::config::WatchConfig;
use crate::error::{DesignError, Result};
use crate::hub::{NotificationHub, SubscriberId, SubscriberReceiver};
use crate::manifest::scan_assets;
use crate::types::{ChangeType, FileChange, LiveFile, SyncMessage};
use crate::utils::is_asset_file;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, Debouncer};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of a watch session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
    Stopped,
}

struct SessionInner {
    state: SessionState,
    /// Watched file path -> token of its per-file watch
    watched: HashMap<PathBuf, CancellationToken>,
    hub: NotificationHub,
    armed: bool,
    native: Option<Debouncer<RecommendedWatcher>>,
}

/// Live watch over one asset directory
pub struct WatchSession {
    directory: PathBuf,
    config: WatchConfig,
    cancel: CancellationToken,
    inner: Mutex<SessionInner>,
}

impl WatchSession {
    fn new(directory: PathBuf, config: WatchConfig) -> Arc<Self> {
        Arc::new(Self {
            directory,
            config,
            cancel: CancellationToken::new(),
            inner: Mutex::new(SessionInner {
                state: SessionState::Uninitialized,
                watched: HashMap::new(),
                hub: NotificationHub::new(),
                armed: false,
                native: None,
            }),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Whether the periodic discovery task has been started
    pub fn is_armed(&self) -> bool {
        self.inner.lock().armed
    }

    /// Currently watched files, sorted
    pub fn watched_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.inner.lock().watched.keys().cloned().collect();
        files.sort();
        files
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().hub.len()
    }

    /// Add a subscriber. The session keeps running when the last one leaves.
    pub fn subscribe(&self) -> Result<(SubscriberId, SubscriberReceiver)> {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Stopped {
            return Err(DesignError::Watch(format!(
                "watch session for {} is stopped",
                self.directory.display()
            )));
        }
        Ok(inner.hub.subscribe())
    }

    pub fn unsubscribe(&self, id: &SubscriberId) -> bool {
        self.inner.lock().hub.unsubscribe(id)
    }

    /// Send `message` to every subscriber of an active session
    pub fn broadcast(&self, message: &SyncMessage) -> usize {
        let mut inner = self.inner.lock();
        if inner.state != SessionState::Active {
            return 0;
        }
        inner.hub.broadcast(message)
    }

    fn activate(&self) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Uninitialized {
            inner.state = SessionState::Active;
        }
    }

    /// Run one discovery pass and broadcast its changes, deletions first.
    /// Returns the emitted batch. Passes must not overlap: only `acquire`
    /// (before arming) and the periodic task call this.
    pub(crate) async fn discover(self: &Arc<Self>) -> Vec<FileChange> {
        self.pass(true).await
    }

    /// Initial pass: fill the watched set without notifying anyone, so files
    /// already on disk never reach a viewer as `added`.
    async fn seed(self: &Arc<Self>) -> usize {
        self.pass(false).await.len()
    }

    async fn pass(self: &Arc<Self>, emit: bool) -> Vec<FileChange> {
        let files = scan_assets(&self.directory).await;

        let mut inner = self.inner.lock();
        if inner.state != SessionState::Active {
            return Vec::new();
        }

        let present: HashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        let mut gone: Vec<PathBuf> = inner
            .watched
            .keys()
            .filter(|path| !present.contains(path.as_path()))
            .cloned()
            .collect();
        gone.sort();

        let mut changes = Vec::new();
        for path in gone {
            if let Some(token) = inner.watched.remove(&path) {
                token.cancel();
            }
            changes.push(FileChange::new(file_name_of(&path), ChangeType::Deleted));
        }

        for file in &files {
            if inner.watched.contains_key(&file.path) {
                continue;
            }
            let token = self.cancel.child_token();
            self.spawn_file_watch(file, token.clone());
            inner.watched.insert(file.path.clone(), token);
            changes.push(FileChange::new(&file.name, ChangeType::Added));
        }

        if emit {
            for change in &changes {
                debug!("{} {}", change.kind, change.file);
                inner.hub.broadcast(&SyncMessage::file_changed(change));
            }
        }
        changes
    }

    fn spawn_file_watch(self: &Arc<Self>, file: &LiveFile, token: CancellationToken) {
        let session = Arc::downgrade(self);
        let path = file.path.clone();
        let name = file.name.clone();
        let period = self.config.file_poll_interval;
        let mut last = file.fingerprint();

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                // Deletion is reported by the discovery pass
                let Ok(metadata) = tokio::fs::metadata(&path).await else {
                    continue;
                };
                let Some(current) = LiveFile::from_metadata(path.clone(), &metadata) else {
                    continue;
                };
                if current.fingerprint() == last {
                    continue;
                }
                last = current.fingerprint();
                match session.upgrade() {
                    Some(session) => session.emit_modified(&token, &name),
                    None => break,
                }
            }
        });
    }

    fn emit_modified(&self, token: &CancellationToken, name: &str) {
        let mut inner = self.inner.lock();
        if inner.state != SessionState::Active || token.is_cancelled() {
            return;
        }
        debug!("modified {}", name);
        inner
            .hub
            .broadcast(&SyncMessage::file_changed(&FileChange::new(name, ChangeType::Modified)));
    }

    /// Start the periodic discovery task (and the native wake-up watcher).
    /// Only the first call on an active session has any effect.
    fn arm(self: &Arc<Self>) {
        let (wake_tx, mut wake_rx) = mpsc::unbounded_channel::<()>();
        {
            let mut inner = self.inner.lock();
            if inner.armed || inner.state != SessionState::Active {
                return;
            }
            inner.armed = true;
            if self.config.native_events {
                match self.start_native_watcher(wake_tx) {
                    Ok(debouncer) => inner.native = Some(debouncer),
                    Err(e) => warn!(
                        "Native watching unavailable for {}, polling only: {}",
                        self.directory.display(),
                        e
                    ),
                }
            }
        }

        let session = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        let period = self.config.discovery_interval;
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                    Some(()) = wake_rx.recv() => {
                        // Coalesce a burst into one pass
                        while wake_rx.try_recv().is_ok() {}
                    }
                }
                let Some(session) = session.upgrade() else {
                    break;
                };
                session.discover().await;
            }
        });
    }

    fn start_native_watcher(
        &self,
        wake_tx: mpsc::UnboundedSender<()>,
    ) -> Result<Debouncer<RecommendedWatcher>> {
        let mut debouncer = new_debouncer(
            self.config.debounce,
            move |res: std::result::Result<Vec<DebouncedEvent>, notify::Error>| match res {
                Ok(events) => {
                    if events.iter().any(|event| is_asset_file(&event.path)) {
                        let _ = wake_tx.send(());
                    }
                }
                Err(e) => warn!("Native watch error: {}", e),
            },
        )
        .map_err(|e| DesignError::Watch(e.to_string()))?;

        debouncer
            .watcher()
            .watch(&self.directory, RecursiveMode::NonRecursive)
            .map_err(|e| DesignError::Watch(e.to_string()))?;

        Ok(debouncer)
    }

    /// Cancel every timer and per-file watch and drop all subscribers.
    /// A stopped session cannot be restarted.
    pub fn stop(&self) {
        let native = {
            let mut inner = self.inner.lock();
            if inner.state == SessionState::Stopped {
                return;
            }
            inner.state = SessionState::Stopped;
            self.cancel.cancel();
            inner.watched.clear();
            inner.hub.clear();
            inner.native.take()
        };
        drop(native);
        info!("Stopped watching {}", self.directory.display());
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn normalize(directory: &Path) -> PathBuf {
    std::fs::canonicalize(directory).unwrap_or_else(|_| directory.to_path_buf())
}

/// Owned map of directory -> watch session; at most one session per directory
pub struct WatchRegistry {
    config: WatchConfig,
    sessions: Mutex<HashMap<PathBuf, Arc<WatchSession>>>,
}

impl Default for WatchRegistry {
    fn default() -> Self {
        Self::new(WatchConfig::default())
    }
}

impl WatchRegistry {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Return the session for `directory`, creating, scanning and arming it
    /// on first use.
    pub async fn acquire(&self, directory: &Path) -> Arc<WatchSession> {
        let key = normalize(directory);
        let session = {
            let mut sessions = self.sessions.lock();
            if let Some(existing) = sessions.get(&key) {
                return existing.clone();
            }
            let session = WatchSession::new(key.clone(), self.config.clone());
            sessions.insert(key, session.clone());
            session
        };

        session.activate();
        let seeded = session.seed().await;
        session.arm();
        info!(
            "Watching {} ({} files)",
            session.directory().display(),
            seeded
        );
        session
    }

    pub fn get(&self, directory: &Path) -> Option<Arc<WatchSession>> {
        self.sessions.lock().get(&normalize(directory)).cloned()
    }

    /// Stop and forget the session for `directory`. Returns whether one existed.
    pub fn stop(&self, directory: &Path) -> bool {
        let removed = self.sessions.lock().remove(&normalize(directory));
        match removed {
            Some(session) => {
                session.stop();
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        let sessions: Vec<_> = self.sessions.lock().drain().map(|(_, s)| s).collect();
        for session in sessions {
            session.stop();
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

impl Drop for WatchRegistry {
    fn drop(&mut self) {
        self.stop_all();
    }
}
