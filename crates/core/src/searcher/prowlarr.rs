//! Prowlarr aggregated search (REST + JSON array).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{parse_json, IndexerBackend, MediaType, RawTorrentResult, SearchError};
use crate::http::{Credentials, HttpRequest, HttpTransport};
use crate::infohash::{extract_btih, normalize_infohash};
use crate::wire::{lenient_u32, lenient_u64};

pub struct ProwlarrIndexer {
    name: String,
    base_url: String,
    api_key: Option<String>,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl ProwlarrIndexer {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        transport: Arc<dyn HttpTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            transport,
            timeout,
        }
    }
}

#[async_trait]
impl IndexerBackend for ProwlarrIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<RawTorrentResult>, SearchError> {
        let category = match media_type {
            MediaType::Movie => "2000",
            MediaType::Tv => "5000",
        };
        let mut request = HttpRequest::get(format!("{}/api/v1/search", self.base_url))
            .query("query", query)
            .query("type", "search")
            .query("categories", category)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.credentials(Credentials::ApiKeyHeader {
                name: "X-Api-Key".to_string(),
                value: key.clone(),
            });
        }

        let response = self.transport.execute(request).await?;
        let rows: Vec<ProwlarrRelease> = parse_json(&response)?;
        let results: Vec<_> = rows.into_iter().filter_map(ProwlarrRelease::into_raw).collect();

        debug!(indexer = %self.name, results = results.len(), "Prowlarr search complete");
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProwlarrRelease {
    title: String,
    #[serde(default)]
    info_hash: Option<String>,
    #[serde(default)]
    magnet_url: Option<String>,
    #[serde(default)]
    guid: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: u64,
    #[serde(default, deserialize_with = "lenient_u32")]
    seeders: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    leechers: u32,
    #[serde(default)]
    publish_date: Option<DateTime<Utc>>,
}

impl ProwlarrRelease {
    fn into_raw(self) -> Option<RawTorrentResult> {
        let info_hash = self
            .info_hash
            .as_deref()
            .and_then(normalize_infohash)
            .or_else(|| self.magnet_url.as_deref().and_then(extract_btih))
            .or_else(|| self.guid.as_deref().and_then(extract_btih))?;
        Some(RawTorrentResult {
            title: self.title,
            info_hash,
            size_bytes: self.size,
            seeders: self.seeders,
            leechers: self.leechers,
            published_at: self.publish_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::testing::{fixtures, MockTransport};

    #[tokio::test]
    async fn test_search_sends_api_key_header() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with("/api/v1/search", HttpResponse::new(200, fixtures::PROWLARR_RESULTS));

        let indexer = ProwlarrIndexer::new(
            "prowlarr",
            "http://prowlarr.local:9696/",
            Some("pk-123".to_string()),
            transport.clone(),
            Duration::from_secs(5),
        );
        let results = indexer.search("The Office", MediaType::Tv).await.unwrap();

        // Row without any hash source is dropped
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].info_hash, fixtures::HASH_A);
        assert_eq!(results[1].info_hash, fixtures::HASH_C);
        assert_eq!(results[0].seeders, 42);

        let request = &transport.requests()[0];
        let url = request.full_url();
        assert!(url.starts_with("http://prowlarr.local:9696/api/v1/search?"));
        assert!(url.contains("categories=5000"));
        assert!(!url.contains("pk-123"));
        assert!(matches!(
            &request.credentials,
            Some(Credentials::ApiKeyHeader { name, value }) if name == "X-Api-Key" && value == "pk-123"
        ));
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with("/api/v1/search", HttpResponse::new(200, "{not json"));

        let indexer = ProwlarrIndexer::new(
            "prowlarr",
            "http://prowlarr.local",
            None,
            transport,
            Duration::from_secs(5),
        );
        let err = indexer.search("x", MediaType::Movie).await.unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }
}
