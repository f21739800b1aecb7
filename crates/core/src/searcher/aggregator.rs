//! Concurrent fan-out search across all active indexers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::{
    IndexerFactory, MediaType, RawTorrentResult, SearchError, TorrentResult,
};
use crate::config::IndexerConfig;
use crate::infohash::normalize_infohash;
use crate::metrics;
use crate::store::{ConfigStore, SecretStore};

const DEFAULT_INDEXER_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
enum SearchTarget {
    Query(String),
    Hash(String),
}

/// Searches every active indexer concurrently and merges the results.
///
/// Indexer configs are read from the store on every call. Each indexer runs
/// under its own timeout; a failure is recorded for that indexer only. The
/// call fails with `AllIndexersFailed` only when no indexer succeeded.
/// Dropping the returned future cancels every in-flight indexer request.
pub struct IndexerAggregator {
    store: Arc<dyn ConfigStore>,
    secrets: Arc<dyn SecretStore>,
    factory: Arc<dyn IndexerFactory>,
    timeout: Duration,
}

impl IndexerAggregator {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        secrets: Arc<dyn SecretStore>,
        factory: Arc<dyn IndexerFactory>,
    ) -> Self {
        Self {
            store,
            secrets,
            factory,
            timeout: DEFAULT_INDEXER_TIMEOUT,
        }
    }

    /// Override the per-indexer timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn search_by_query(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<TorrentResult>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery("query is empty".to_string()));
        }
        self.run(SearchTarget::Query(query.to_string()), media_type)
            .await
    }

    pub async fn search_by_hash(
        &self,
        hash: &str,
        media_type: MediaType,
    ) -> Result<Vec<TorrentResult>, SearchError> {
        let hash = normalize_infohash(hash)
            .ok_or_else(|| SearchError::InvalidQuery(format!("not an infohash: {}", hash)))?;
        self.run(SearchTarget::Hash(hash), media_type).await
    }

    async fn run(
        &self,
        target: SearchTarget,
        media_type: MediaType,
    ) -> Result<Vec<TorrentResult>, SearchError> {
        let configs = self
            .store
            .active_indexer_configs()
            .await
            .map_err(|e| SearchError::AllIndexersFailed {
                detail: e.to_string(),
                errors: Vec::new(),
            })?;

        if configs.is_empty() {
            return Err(SearchError::AllIndexersFailed {
                detail: "no active indexers".to_string(),
                errors: Vec::new(),
            });
        }

        debug!(
            indexers = configs.len(),
            target = ?target,
            media_type = media_type.as_str(),
            "Starting parallel search"
        );

        let searches = configs.iter().map(|config| {
            let target = &target;
            async move {
                let result = self.search_one(config, target, media_type).await;
                (config.name.clone(), result)
            }
        });
        let outcomes = join_all(searches).await;

        let mut results = Vec::new();
        let mut errors: Vec<(String, String)> = Vec::new();
        let mut succeeded = 0usize;

        for (indexer, outcome) in outcomes {
            match outcome {
                Ok(raw) => {
                    succeeded += 1;
                    results.extend(raw.into_iter().map(|r| TorrentResult::from_raw(r, &indexer)));
                }
                Err(e) => {
                    warn!(indexer = %indexer, error = %e, "Indexer search failed");
                    errors.push((indexer, e.to_string()));
                }
            }
        }

        if succeeded == 0 {
            let detail = match errors.last() {
                Some((name, msg)) => {
                    format!("{} indexer(s) failed, last: {}: {}", errors.len(), name, msg)
                }
                None => "no indexer responded".to_string(),
            };
            return Err(SearchError::AllIndexersFailed { detail, errors });
        }

        metrics::SEARCH_RESULTS
            .with_label_values(&[])
            .observe(results.len() as f64);
        info!(
            results = results.len(),
            succeeded,
            failed = errors.len(),
            "Search complete"
        );

        Ok(results)
    }

    async fn search_one(
        &self,
        config: &IndexerConfig,
        target: &SearchTarget,
        media_type: MediaType,
    ) -> Result<Vec<RawTorrentResult>, SearchError> {
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, async {
            let api_key = match &config.api_key_ref {
                Some(reference) => Some(
                    self.secrets
                        .resolve(reference)
                        .await
                        .map_err(|e| SearchError::Misconfigured(e.to_string()))?,
                ),
                None => None,
            };
            let backend = self.factory.create(config, api_key)?;
            match target {
                SearchTarget::Query(query) => backend.search(query, media_type).await,
                SearchTarget::Hash(hash) => backend.search_by_hash(hash, media_type).await,
            }
        })
        .await
        .unwrap_or(Err(SearchError::Timeout));

        let label = match &outcome {
            Ok(_) => "success",
            Err(SearchError::Timeout) => "timeout",
            Err(_) => "failure",
        };
        metrics::INDEXER_SEARCHES
            .with_label_values(&[config.name.as_str(), label])
            .inc();
        metrics::INDEXER_SEARCH_DURATION
            .with_label_values(&[config.name.as_str()])
            .observe(start.elapsed().as_secs_f64());

        outcome
    }
}
