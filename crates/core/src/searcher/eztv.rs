//! EZTV API. TV only.
//!
//! EZTV has no free-text search: an IMDb id (`tt0386676`) is looked up
//! directly, anything else is matched against the latest listing by title.

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

pub const DEFAULT_EZTV_URL: &str = "https://eztvx.to/api";

const PAGE_LIMIT: &str = "100";

pub struct EztvIndexer {
    name: String,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl EztvIndexer {
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

    async fn fetch(&self, imdb_id: Option<&str>) -> Result<Vec<RawTorrentResult>, SearchError> {
        let mut request = HttpRequest::get(format!("{}/get-torrents", self.base_url))
            .query("limit", PAGE_LIMIT)
            .timeout(self.timeout);
        if let Some(id) = imdb_id {
            request = request.query("imdb_id", id);
        }
        let response = self.transport.execute(request).await?;
        let body: EztvResponse = parse_json(&response)?;
        Ok(body
            .torrents
            .unwrap_or_default()
            .into_iter()
            .filter_map(EztvTorrent::into_raw)
            .collect())
    }
}

/// Numeric part of an IMDb id, if `query` is one.
fn imdb_numeric_id(query: &str) -> Option<&str> {
    let digits = query.trim().strip_prefix("tt")?;
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

fn title_matches(title: &str, query: &str) -> bool {
    let title = title.to_lowercase();
    query
        .to_lowercase()
        .split_whitespace()
        .all(|word| title.contains(word))
}

#[async_trait]
impl IndexerBackend for EztvIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<RawTorrentResult>, SearchError> {
        if media_type == MediaType::Movie {
            return Ok(Vec::new());
        }

        let results = match imdb_numeric_id(query) {
            Some(id) => self.fetch(Some(id)).await?,
            None => self
                .fetch(None)
                .await?
                .into_iter()
                .filter(|r| title_matches(&r.title, query))
                .collect(),
        };

        debug!(indexer = %self.name, results = results.len(), "EZTV search complete");
        Ok(results)
    }

    async fn search_by_hash(
        &self,
        hash: &str,
        media_type: MediaType,
    ) -> Result<Vec<RawTorrentResult>, SearchError> {
        if media_type == MediaType::Movie {
            return Ok(Vec::new());
        }
        let hash = hash.to_lowercase();
        Ok(self
            .fetch(None)
            .await?
            .into_iter()
            .filter(|r| r.info_hash == hash)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct EztvResponse {
    #[serde(default)]
    torrents: Option<Vec<EztvTorrent>>,
}

#[derive(Debug, Deserialize)]
struct EztvTorrent {
    title: String,
    hash: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    size_bytes: u64,
    #[serde(default, deserialize_with = "lenient_u32")]
    seeds: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    peers: u32,
    #[serde(default)]
    date_released_unix: Option<i64>,
}

impl EztvTorrent {
    fn into_raw(self) -> Option<RawTorrentResult> {
        Some(RawTorrentResult {
            info_hash: normalize_infohash(&self.hash)?,
            title: self.title,
            size_bytes: self.size_bytes,
            seeders: self.seeds,
            leechers: self.peers,
            published_at: self
                .date_released_unix
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::testing::{fixtures, MockTransport};

    fn indexer(transport: Arc<MockTransport>) -> EztvIndexer {
        EztvIndexer::new("eztv", DEFAULT_EZTV_URL, transport, Duration::from_secs(5))
    }

    #[test]
    fn test_imdb_numeric_id() {
        assert_eq!(imdb_numeric_id("tt0386676"), Some("0386676"));
        assert_eq!(imdb_numeric_id("the office"), None);
        assert_eq!(imdb_numeric_id("tt"), None);
        assert_eq!(imdb_numeric_id("ttabc"), None);
    }

    #[tokio::test]
    async fn test_imdb_lookup() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with("get-torrents", HttpResponse::new(200, fixtures::EZTV_RESPONSE));

        let results = indexer(transport.clone())
            .search("tt0386676", MediaType::Tv)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].size_bytes, 367_001_600);
        assert!(transport.requests()[0].full_url().contains("imdb_id=0386676"));
    }

    #[tokio::test]
    async fn test_title_query_filters_listing() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with("get-torrents", HttpResponse::new(200, fixtures::EZTV_RESPONSE));

        let results = indexer(transport.clone())
            .search("office s09e01", MediaType::Tv)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(!transport.requests()[0].full_url().contains("imdb_id"));
    }

    #[tokio::test]
    async fn test_movie_search_makes_no_request() {
        let transport = Arc::new(MockTransport::new());
        let results = indexer(transport.clone())
            .search("Dune", MediaType::Movie)
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(transport.call_count(), 0);
    }
}
