//! Start and stop live gallery servers per workspace

use crate::{router, AppState};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use superdesign_core::{DesignError, Result, WatchConfig, WatchRegistry, Workspace, WorkspaceLayout};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

struct RunningServer {
    url: String,
    asset_dir: PathBuf,
    shutdown: CancellationToken,
}

/// Live gallery servers keyed by workspace, sharing one watch registry
pub struct LiveSync {
    registry: Arc<WatchRegistry>,
    servers: Mutex<HashMap<PathBuf, RunningServer>>,
}

impl Default for LiveSync {
    fn default() -> Self {
        Self::new(WatchConfig::default())
    }
}

impl LiveSync {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            registry: Arc::new(WatchRegistry::new(config)),
            servers: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<WatchRegistry> {
        &self.registry
    }

    /// URL of the running server for `directory`, if any
    pub fn url(&self, directory: &Path) -> Option<String> {
        self.servers
            .lock()
            .get(&server_key(directory))
            .map(|s| s.url.clone())
    }

    /// Serve the gallery for the workspace at `directory` on `port`
    /// (`0` picks a free port). Returns the URL viewers should open.
    pub async fn start(&self, directory: &Path, port: u16) -> Result<String> {
        let key = server_key(directory);
        if let Some(url) = self.url(directory) {
            return Ok(url);
        }

        let workspace = Workspace::open(Some(directory))?;
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| DesignError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let bound = listener.local_addr()?;
        let url = format!("http://localhost:{}", bound.port());

        let state = AppState::new(workspace, self.registry.clone());
        let asset_dir = state.asset_dir();

        let shutdown = CancellationToken::new();
        {
            let mut servers = self.servers.lock();
            if let Some(existing) = servers.get(&key) {
                // Lost a race with a concurrent start; the listener is dropped
                return Ok(existing.url.clone());
            }
            servers.insert(
                key,
                RunningServer {
                    url: url.clone(),
                    asset_dir,
                    shutdown: shutdown.clone(),
                },
            );
        }

        let app = router(state);
        tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            match result {
                Ok(()) => info!("Live gallery on {} shut down", bound),
                Err(e) => error!("Live gallery on {} failed: {}", bound, e),
            }
        });

        info!("Live gallery for {} at {}", directory.display(), url);
        Ok(url)
    }

    /// Stop the watch session and the server for `directory`.
    /// Returns whether a server was running.
    pub fn stop(&self, directory: &Path) -> bool {
        let Some(server) = self.servers.lock().remove(&server_key(directory)) else {
            return false;
        };
        // Ends open event streams so the graceful shutdown can finish
        self.registry.stop(&server.asset_dir);
        server.shutdown.cancel();
        info!("Stopped live gallery at {}", server.url);
        true
    }

    pub fn stop_all(&self) {
        let servers: Vec<_> = self.servers.lock().drain().map(|(_, s)| s).collect();
        for server in servers {
            self.registry.stop(&server.asset_dir);
            server.shutdown.cancel();
        }
    }
}

impl Drop for LiveSync {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn server_key(directory: &Path) -> PathBuf {
    WorkspaceLayout::at(directory).root().to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn live() -> LiveSync {
        LiveSync::new(WatchConfig::polling(
            Duration::from_millis(50),
            Duration::from_millis(50),
        ))
    }

    #[tokio::test]
    async fn test_start_twice_returns_same_url() {
        let temp = TempDir::new().unwrap();
        let sync = live();

        let url = sync.start(temp.path(), 0).await.unwrap();
        assert!(url.starts_with("http://localhost:"));
        assert_ne!(url, "http://localhost:0");
        assert_eq!(sync.start(temp.path(), 0).await.unwrap(), url);

        assert!(sync.stop(temp.path()));
        assert!(!sync.stop(temp.path()));
        assert!(sync.url(temp.path()).is_none());
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = live().start(temp.path(), port).await.unwrap_err();
        assert!(matches!(err, DesignError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_serves_health_over_tcp() {
        let temp = TempDir::new().unwrap();
        let sync = live();
        let url = sync.start(temp.path(), 0).await.unwrap();
        let port = url.rsplit(':').next().unwrap();

        let mut stream = tokio::net::TcpStream::connect(format!("127.0.0.1:{}", port))
            .await
            .unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"status\":\"ok\""));
        sync.stop(temp.path());
    }

    #[tokio::test]
    async fn test_stop_ends_watch_session() {
        let temp = TempDir::new().unwrap();
        let sync = live();
        sync.start(temp.path(), 0).await.unwrap();
        let asset_dir = WorkspaceLayout::at(temp.path()).iterations_dir();
        let session = sync.registry().acquire(&asset_dir).await;
        let (_id, mut rx) = session.subscribe().unwrap();

        sync.stop(temp.path());
        std::fs::write(asset_dir.join("late.html"), "<html/>").unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(rx.recv().await.is_none());
        assert!(sync.registry().is_empty());
    }
}
