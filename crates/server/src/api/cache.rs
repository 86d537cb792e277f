//! Artwork cache inspection and maintenance.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use coverframe_core::{CacheEntry, CacheStats};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub stats: CacheStats,
    pub search_cache_entries: u64,
}

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub success: bool,
    pub entries: Vec<CacheEntry>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub removed: usize,
    pub search_removed: u64,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.cache().stats().await?;
    let search_cache_entries = state.cache().db().search_cache_len().await?;
    Ok(Json(StatsResponse { success: true, stats, search_cache_entries }))
}

/// All entries, most recently used first.
pub async fn entries(State(state): State<Arc<AppState>>) -> Result<Json<EntriesResponse>, ApiError> {
    let entries = state.cache().list_all().await?;
    Ok(Json(EntriesResponse { success: true, entries }))
}

/// Drop every cached image and every remembered provider answer.
pub async fn clear(State(state): State<Arc<AppState>>) -> Result<Json<ClearResponse>, ApiError> {
    let removed = state.cache().clear().await?;
    let search_removed = state.cache().db().clear_search_cache().await?;
    tracing::info!(removed, search_removed, "cache cleared");
    Ok(Json(ClearResponse { success: true, removed, search_removed }))
}
