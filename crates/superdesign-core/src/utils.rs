//! Core utilities for Superdesign

use crate::error::{DesignError, Result};
use std::path::Path;

/// Extensions recognised as design assets
pub const ASSET_EXTENSIONS: &[&str] = &["html", "svg"];

fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Filter for generated design files
pub fn is_asset_file(path: &Path) -> bool {
    extension_lowercase(path)
        .map(|ext| ASSET_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Content type served for an asset, inferred from its extension
pub fn content_type_for(file_name: &str) -> &'static str {
    match extension_lowercase(Path::new(file_name)).as_deref() {
        Some("html") => "text/html",
        Some("svg") => "image/svg+xml",
        _ => "text/plain",
    }
}

/// Reject anything that is not a plain basename inside the asset directory
pub fn validate_file_name(file_name: &str) -> Result<&str> {
    let invalid = file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains('\0');
    if invalid {
        return Err(DesignError::InvalidFileName(file_name.to_string()));
    }
    Ok(file_name)
}
