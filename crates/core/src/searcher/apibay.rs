//! apibay.org JSON API (raw array response).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{parse_json, IndexerBackend, MediaType, RawTorrentResult, SearchError};
use crate::http::{HttpRequest, HttpTransport};
use crate::infohash::normalize_infohash;
use crate::wire::{lenient_u32, lenient_u64};

pub const DEFAULT_APIBAY_URL: &str = "https://apibay.org";

/// Hash of the placeholder row returned when nothing matched.
const NO_RESULTS_HASH: &str = "0000000000000000000000000000000000000000";

pub struct ApibayIndexer {
    name: String,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl ApibayIndexer {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            timeout,
        }
    }
}

#[async_trait]
impl IndexerBackend for ApibayIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<RawTorrentResult>, SearchError> {
        // 201 movies, 205 tv
        let category = match media_type {
            MediaType::Movie => "201",
            MediaType::Tv => "205",
        };
        let request = HttpRequest::get(format!("{}/q.php", self.base_url))
            .query("q", query)
            .query("cat", category)
            .timeout(self.timeout);
        let response = self.transport.execute(request).await?;
        let rows: Vec<ApibayRow> = parse_json(&response)?;

        let results: Vec<_> = rows.into_iter().filter_map(ApibayRow::into_raw).collect();
        debug!(indexer = %self.name, results = results.len(), "apibay search complete");
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct ApibayRow {
    name: String,
    info_hash: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: u64,
    #[serde(default, deserialize_with = "lenient_u32")]
    seeders: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    leechers: u32,
    #[serde(default, deserialize_with = "lenient_u64")]
    added: u64,
}

impl ApibayRow {
    fn into_raw(self) -> Option<RawTorrentResult> {
        let info_hash = normalize_infohash(&self.info_hash)?;
        if info_hash == NO_RESULTS_HASH {
            return None;
        }
        Some(RawTorrentResult {
            title: self.name,
            info_hash,
            size_bytes: self.size,
            seeders: self.seeders,
            leechers: self.leechers,
            published_at: (self.added > 0)
                .then(|| DateTime::<Utc>::from_timestamp(self.added as i64, 0))
                .flatten(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::testing::{fixtures, MockTransport};

    fn indexer(transport: Arc<MockTransport>) -> ApibayIndexer {
        ApibayIndexer::new("tpb", DEFAULT_APIBAY_URL, transport, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_parses_string_fields_and_lowercases_hash() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with("q.php", HttpResponse::new(200, fixtures::APIBAY_RESULTS));

        let results = indexer(transport.clone())
            .search("Dune Part Two", MediaType::Movie)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].info_hash, fixtures::HASH_A);
        assert_eq!(results[0].size_bytes, 8_589_934_592);
        assert_eq!(results[0].seeders, 1500);
        assert!(results[0].published_at.is_some());

        let url = transport.requests()[0].full_url();
        assert!(url.contains("q=Dune%20Part%20Two"));
        assert!(url.contains("cat=201"));
    }

    #[tokio::test]
    async fn test_no_results_sentinel_dropped() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with("q.php", HttpResponse::new(200, fixtures::APIBAY_NO_RESULTS));

        let results = indexer(transport).search("zzzz", MediaType::Movie).await.unwrap();
        assert!(results.is_empty());
    }
}
