use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{debrid, handlers, middleware::metrics_middleware, search};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Indexer search
        .route("/search", get(search::search))
        .route("/search/hash/{hash}", get(search::search_by_hash))
        // Debrid
        .route("/debrid/cache", post(debrid::check_cache_all))
        .route("/debrid/search", get(debrid::search_usenet))
        .route("/debrid/{service}/cache", post(debrid::check_cache))
        .route("/debrid/{service}/account", get(debrid::account_info))
        .route("/debrid/{service}/validate", get(debrid::validate))
        .route("/debrid/{service}/streams", post(debrid::resolve_search_result))
        .route("/resolve", post(debrid::resolve))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
