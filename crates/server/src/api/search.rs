//! Indexer search handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use streamrelay_core::searcher::rank_results;
use streamrelay_core::{MediaType, TorrentResult};

use super::error::{search_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub media_type: MediaType,
}

#[derive(Debug, Deserialize)]
pub struct HashSearchParams {
    #[serde(default)]
    pub media_type: MediaType,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub media_type: MediaType,
    pub results: Vec<TorrentResult>,
    pub duration_ms: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/search?q=&media_type=
///
/// Fan the query out to every active indexer. Results are ranked best-first.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let mut results = state
        .aggregator()
        .search_by_query(&params.q, params.media_type)
        .await
        .map_err(search_error)?;
    rank_results(&mut results);

    Ok(Json(SearchResponse {
        query: params.q,
        media_type: params.media_type,
        results,
        duration_ms: start.elapsed().as_millis() as u64,
    }))
}

/// GET /api/v1/search/hash/{hash}?media_type=
pub async fn search_by_hash(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
    Query(params): Query<HashSearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let mut results = state
        .aggregator()
        .search_by_hash(&hash, params.media_type)
        .await
        .map_err(search_error)?;
    rank_results(&mut results);

    Ok(Json(SearchResponse {
        query: hash,
        media_type: params.media_type,
        results,
        duration_ms: start.elapsed().as_millis() as u64,
    }))
}
