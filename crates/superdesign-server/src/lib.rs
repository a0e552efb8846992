//! Superdesign Live Server
//!
//! HTTP gallery over a workspace's design iterations, with a server-sent
//! event stream that tells open viewers when a design file is added,
//! modified or deleted.

pub mod handlers;
pub mod live;

use axum::{routing::get, Router};
use std::path::PathBuf;
use std::sync::Arc;
use superdesign_core::{WatchRegistry, Workspace};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use live::LiveSync;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub workspace: Workspace,
    pub registry: Arc<WatchRegistry>,
}

impl AppState {
    pub fn new(workspace: Workspace, registry: Arc<WatchRegistry>) -> Self {
        Self {
            workspace,
            registry,
        }
    }

    /// Directory whose changes are pushed to viewers
    pub fn asset_dir(&self) -> PathBuf {
        self.workspace.layout().iterations_dir()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::gallery::index))
        .route("/events", get(handlers::events::subscribe))
        .route("/design_iterations/:name", get(handlers::assets::serve))
        .route("/api/assets", get(handlers::assets::list))
        .route("/health", get(handlers::health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
