//! Superdesign - Core Library
//!
//! Asset metadata, retention cleanup, manifest diffing and live directory
//! watching for the design files an agent generates in a workspace.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod hub;
pub mod manifest;
pub mod metadata;
pub mod types;
pub mod utils;
pub mod watcher;
pub mod workspace;

pub use cleanup::{CleanupEngine, CleanupRequest};
pub use config::*;
pub use error::*;
pub use hub::{NotificationHub, SubscriberId, SubscriberReceiver};
pub use manifest::{diff, scan_assets};
pub use metadata::MetadataStore;
pub use types::*;
pub use watcher::{SessionState, WatchRegistry, WatchSession};
pub use workspace::{SettingsUpdate, Workspace};
