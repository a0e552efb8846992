//! Design file handlers

use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use superdesign_core::utils::{content_type_for, validate_file_name};
use superdesign_core::AssetRecord;
use tracing::{debug, error};

/// Serve one file from the iterations directory
pub async fn serve(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    if validate_file_name(&name).is_err() {
        debug!("Rejected asset request for {:?}", name);
        return Err(StatusCode::NOT_FOUND);
    }

    let path = state.workspace.layout().asset_path(&name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type_for(&name))], bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<AssetRecord>> {
    Json(state.workspace.list_assets().await)
}
