//! Debrid cache check and stream resolution handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use streamrelay_core::debrid::{AccountInfo, UsenetResult};
use streamrelay_core::infohash::normalize_infohash;
use streamrelay_core::{CacheStatus, DebridServiceType, StreamInfo};
use tracing::info;

use super::error::{api_error, debrid_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CacheRequest {
    pub hashes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CacheResponse {
    pub service: DebridServiceType,
    pub statuses: HashMap<String, CacheStatus>,
}

#[derive(Debug, Serialize)]
pub struct CacheAllResponse {
    pub services: HashMap<DebridServiceType, HashMap<String, CacheStatus>>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub hash: String,
    #[serde(default)]
    pub preferred_service: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveSearchResultRequest {
    pub stream_id: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub service: DebridServiceType,
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct UsenetSearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct UsenetSearchResponse {
    pub results: Vec<UsenetResult>,
}

fn parse_service(name: &str) -> Result<DebridServiceType, ApiError> {
    DebridServiceType::parse(name).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Unknown debrid service: {}", name),
        )
    })
}

fn parse_hashes(hashes: &[String]) -> Result<Vec<String>, ApiError> {
    hashes
        .iter()
        .map(|h| {
            normalize_infohash(h).ok_or_else(|| {
                api_error(StatusCode::BAD_REQUEST, format!("Invalid infohash: {}", h))
            })
        })
        .collect()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/debrid/{service}/cache
pub async fn check_cache(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
    Json(body): Json<CacheRequest>,
) -> Result<Json<CacheResponse>, ApiError> {
    let service = parse_service(&service)?;
    let hashes = parse_hashes(&body.hashes)?;

    let statuses = state
        .debrid()
        .check_cache(service, &hashes)
        .await
        .map_err(debrid_error)?;

    Ok(Json(CacheResponse { service, statuses }))
}

/// POST /api/v1/debrid/cache
///
/// Check every active service. Services that fail are left out.
pub async fn check_cache_all(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CacheRequest>,
) -> Result<Json<CacheAllResponse>, ApiError> {
    let hashes = parse_hashes(&body.hashes)?;
    let services = state
        .debrid()
        .check_cache_all(&hashes)
        .await
        .map_err(debrid_error)?;
    Ok(Json(CacheAllResponse { services }))
}

/// GET /api/v1/debrid/{service}/account
pub async fn account_info(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<Json<AccountInfo>, ApiError> {
    let service = parse_service(&service)?;
    let account = state
        .debrid()
        .account_info(service)
        .await
        .map_err(debrid_error)?;
    Ok(Json(account))
}

/// GET /api/v1/debrid/{service}/validate
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let service = parse_service(&service)?;
    let valid = state
        .debrid()
        .validate(service)
        .await
        .map_err(debrid_error)?;
    Ok(Json(ValidateResponse { service, valid }))
}

/// GET /api/v1/debrid/search?q=
pub async fn search_usenet(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UsenetSearchParams>,
) -> Result<Json<UsenetSearchResponse>, ApiError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Query is empty"));
    }
    let results = state
        .debrid()
        .search_usenet(query)
        .await
        .map_err(debrid_error)?;
    Ok(Json(UsenetSearchResponse { results }))
}

/// POST /api/v1/debrid/{service}/streams
///
/// Resolve a stream id returned by the provider search.
pub async fn resolve_search_result(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
    Json(body): Json<ResolveSearchResultRequest>,
) -> Result<Json<StreamInfo>, ApiError> {
    let service = parse_service(&service)?;
    let stream = state
        .debrid()
        .resolve_search_result(service, &body.stream_id)
        .await
        .map_err(debrid_error)?;
    Ok(Json(stream))
}

/// POST /api/v1/resolve
///
/// Resolve an infohash to a playable stream. Without `preferred_service`,
/// services are tried in priority order.
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResolveRequest>,
) -> Result<Json<StreamInfo>, ApiError> {
    let preferred = body
        .preferred_service
        .as_deref()
        .map(parse_service)
        .transpose()?;

    let stream = state
        .debrid()
        .resolve_stream(&body.hash, preferred)
        .await
        .map_err(debrid_error)?;

    info!(
        service = %stream.debrid_service,
        file = %stream.file_name,
        "Stream resolved"
    );
    Ok(Json(stream))
}
