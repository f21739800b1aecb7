//! Batched cache availability lookups.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use futures::future::join_all;
use tracing::{debug, warn};

use super::{CacheStatus, DebridError};
use crate::config::DebridServiceType;
use crate::metrics;

/// Check `hashes` in chunks of at most `limit`, running chunks concurrently.
///
/// Hashes are lowercased and deduplicated; an empty input returns an empty
/// map without calling `fetch`. Hashes absent from a chunk's response are
/// `NotCached`. A failed chunk marks its hashes `Unknown`; when every chunk
/// fails the last error is returned.
pub async fn check_in_batches<F, Fut>(
    service: DebridServiceType,
    hashes: &[String],
    limit: usize,
    fetch: F,
) -> Result<HashMap<String, CacheStatus>, DebridError>
where
    F: Fn(Vec<String>) -> Fut,
    Fut: Future<Output = Result<HashMap<String, CacheStatus>, DebridError>>,
{
    let mut seen = HashSet::new();
    let unique: Vec<String> = hashes
        .iter()
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty() && seen.insert(h.clone()))
        .collect();

    if unique.is_empty() {
        return Ok(HashMap::new());
    }

    let chunks: Vec<Vec<String>> = unique.chunks(limit.max(1)).map(<[String]>::to_vec).collect();
    debug!(
        service = %service,
        hashes = unique.len(),
        batches = chunks.len(),
        "Checking cache availability"
    );

    let outcomes = join_all(chunks.iter().map(|chunk| fetch(chunk.clone()))).await;

    let mut merged: HashMap<String, CacheStatus> = HashMap::with_capacity(unique.len());
    let mut failures = 0usize;
    let mut last_error = None;

    for (chunk, outcome) in chunks.iter().zip(outcomes) {
        match outcome {
            Ok(statuses) => {
                let requested: HashSet<&str> = chunk.iter().map(String::as_str).collect();
                for (hash, status) in statuses {
                    let hash = hash.to_lowercase();
                    if requested.contains(hash.as_str()) {
                        merged.insert(hash, status);
                    }
                }
                for hash in chunk {
                    merged
                        .entry(hash.clone())
                        .or_insert(CacheStatus::NotCached);
                }
            }
            Err(e) => {
                warn!(service = %service, error = %e, batch = chunk.len(), "Cache check batch failed");
                failures += 1;
                for hash in chunk {
                    merged.entry(hash.clone()).or_insert(CacheStatus::Unknown);
                }
                last_error = Some(e);
            }
        }
    }

    if failures == chunks.len() {
        metrics::DEBRID_CACHE_CHECKS
            .with_label_values(&[service.as_str(), "failure"])
            .inc();
        if let Some(e) = last_error {
            return Err(e);
        }
    }

    metrics::DEBRID_CACHE_CHECKS
        .with_label_values(&[service.as_str(), "success"])
        .inc();
    Ok(merged)
}
