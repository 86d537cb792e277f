use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::config_update::update_file;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConfigUpdateRequest {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ConfigUpdateResponse {
    pub success: bool,
    pub message: String,
}

/// Persist one dot-path setting. Takes effect on the next start.
pub async fn update_config(
    State(state): State<Arc<AppState>>, Json(req): Json<ConfigUpdateRequest>,
) -> Result<Json<ConfigUpdateResponse>, ApiError> {
    let _guard = state.config_lock().lock().await;

    let path = state.config_path().to_path_buf();
    let key = req.key.clone();
    tokio::task::spawn_blocking(move || update_file(&path, &key, req.value)).await??;

    Ok(Json(ConfigUpdateResponse { success: true, message: format!("{} updated, restart to apply", req.key) }))
}
