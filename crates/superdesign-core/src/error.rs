//! Error types for Superdesign

use thiserror::Error;

/// Main error type for Superdesign
#[derive(Error, Debug)]
pub enum DesignError {
    #[error("{0}")]
    NotFound(String),

    #[error("Invalid design file name: {0:?}")]
    InvalidFileName(String),

    #[error("Failed to bind live sync server to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl DesignError {
    pub fn asset_not_found(file_name: &str) -> Self {
        DesignError::NotFound(format!("Design file {} does not exist", file_name))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DesignError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, DesignError>;
