//! Torrent search across independent indexers.
//!
//! Each indexer protocol is an `IndexerBackend`. The `IndexerAggregator`
//! fans a query out to every active indexer concurrently, classifies the
//! merged results and only fails when no indexer succeeded.

mod aggregator;
mod apibay;
mod eztv;
mod factory;
mod prowlarr;
mod torznab;
mod types;
mod yts;

pub use aggregator::IndexerAggregator;
pub use apibay::ApibayIndexer;
pub use eztv::EztvIndexer;
pub use factory::{HttpIndexerFactory, IndexerFactory};
pub use prowlarr::ProwlarrIndexer;
pub use torznab::TorznabIndexer;
pub use types::*;
pub use yts::YtsIndexer;

use serde::de::DeserializeOwned;

use crate::http::HttpResponse;

/// Turn a non-2xx response into an API error carrying a body excerpt.
pub(crate) fn ensure_success(response: &HttpResponse) -> Result<(), SearchError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(SearchError::ApiError(format!(
            "HTTP {}: {}",
            response.status,
            response.body_snippet(200)
        )))
    }
}

pub(crate) fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, SearchError> {
    ensure_success(response)?;
    response
        .json()
        .map_err(|e| SearchError::Parse(format!("Failed to parse response: {}", e)))
}
