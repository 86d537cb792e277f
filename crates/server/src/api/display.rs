//! Artwork updates and display status.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use coverframe_client::FetchSource;
use coverframe_core::{DisplayStatus, Error, Publisher, TrackMetadata};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub message: String,
    pub metadata: TrackMetadata,
    pub source: FetchSource,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub status: DisplayStatus,
}

#[derive(Debug, Serialize)]
pub struct CurrentResponse {
    pub success: bool,
    pub metadata: TrackMetadata,
}

async fn write_status(publisher: &Publisher, status: DisplayStatus) -> Result<(), ApiError> {
    let publisher = publisher.clone();
    tokio::task::spawn_blocking(move || publisher.publish_status(status)).await??;
    Ok(())
}

/// Fetch artwork for a search term and make it current.
pub async fn update(
    State(state): State<Arc<AppState>>, Json(req): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let term = req.search.trim();
    if term.is_empty() {
        return Err(ApiError::BadRequest("search term is required".into()));
    }

    let outcome = state.pipeline().fetch(term).await?;
    write_status(state.publisher(), DisplayStatus::Running).await?;

    Ok(Json(UpdateResponse {
        success: true,
        message: format!("Now showing {} by {}", outcome.metadata.title, outcome.metadata.artist),
        metadata: outcome.metadata,
        source: outcome.source,
    }))
}

async fn set_status(state: &AppState, status: DisplayStatus) -> Result<Json<StatusResponse>, ApiError> {
    write_status(state.publisher(), status).await?;
    Ok(Json(StatusResponse { success: true, status }))
}

pub async fn pause(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    set_status(&state, DisplayStatus::Paused).await
}

pub async fn resume(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    set_status(&state, DisplayStatus::Running).await
}

pub async fn stop(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    set_status(&state, DisplayStatus::Stopped).await
}

pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, ApiError> {
    let publisher = state.publisher().clone();
    let status = tokio::task::spawn_blocking(move || publisher.read_status()).await?;
    Ok(Json(StatusResponse { success: true, status }))
}

/// Metadata of the artwork currently on screen.
pub async fn current(State(state): State<Arc<AppState>>) -> Result<Json<CurrentResponse>, ApiError> {
    let publisher = state.publisher().clone();
    match tokio::task::spawn_blocking(move || publisher.read_metadata()).await?? {
        Some(metadata) => Ok(Json(CurrentResponse { success: true, metadata })),
        None => Err(Error::NotFound("nothing has been displayed yet".into()).into()),
    }
}
