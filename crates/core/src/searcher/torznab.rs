//! Torznab (REST + XML) indexer, as served by Jackett and friends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::{ensure_success, IndexerBackend, MediaType, RawTorrentResult, SearchError};
use crate::http::{HttpRequest, HttpTransport};
use crate::infohash::{extract_btih, normalize_infohash};

pub struct TorznabIndexer {
    name: String,
    /// Full API endpoint, e.g. `http://jackett:9117/api/v2.0/indexers/all/results/torznab/api`.
    api_url: String,
    api_key: Option<String>,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl TorznabIndexer {
    pub fn new(
        name: impl Into<String>,
        api_url: impl Into<String>,
        api_key: Option<String>,
        transport: Arc<dyn HttpTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
            transport,
            timeout,
        }
    }

    fn build_request(&self, function: &str, query: &str, category: Option<&str>) -> HttpRequest {
        let mut request = HttpRequest::get(&self.api_url)
            .query("t", function)
            .query("q", query)
            .timeout(self.timeout);
        if let Some(cat) = category {
            request = request.query("cat", cat);
        }
        if let Some(key) = &self.api_key {
            request = request.query("apikey", key.as_str());
        }
        request
    }

    async fn fetch(&self, request: HttpRequest) -> Result<Vec<RawTorrentResult>, SearchError> {
        let response = self.transport.execute(request).await?;
        ensure_success(&response)?;
        let results = parse_torznab(&response.body)?;
        debug!(indexer = %self.name, results = results.len(), "Torznab search complete");
        Ok(results)
    }
}

#[async_trait]
impl IndexerBackend for TorznabIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<RawTorrentResult>, SearchError> {
        let (function, category) = match media_type {
            MediaType::Movie => ("movie", "2000"),
            MediaType::Tv => ("tvsearch", "5000"),
        };
        self.fetch(self.build_request(function, query, Some(category)))
            .await
    }

    async fn search_by_hash(
        &self,
        hash: &str,
        _media_type: MediaType,
    ) -> Result<Vec<RawTorrentResult>, SearchError> {
        let hash = hash.to_lowercase();
        let results = self.fetch(self.build_request("search", &hash, None)).await?;
        Ok(results.into_iter().filter(|r| r.info_hash == hash).collect())
    }
}

#[derive(Default)]
struct ItemBuilder {
    title: Option<String>,
    link: Option<String>,
    size: Option<u64>,
    pub_date: Option<DateTime<Utc>>,
    info_hash: Option<String>,
    magnet_url: Option<String>,
    seeders: Option<u32>,
    peers: Option<u32>,
}

impl ItemBuilder {
    fn apply_element(&mut self, element: &BytesStart<'_>) {
        match element.name().as_ref() {
            b"torznab:attr" => {
                let (mut name, mut value) = (String::new(), String::new());
                for attr in element.attributes().flatten() {
                    let val = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"name" => name = val,
                        b"value" => value = val,
                        _ => {}
                    }
                }
                self.set_attr(&name, value);
            }
            b"enclosure" => {
                for attr in element.attributes().flatten() {
                    let val = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"url" if self.link.is_none() => self.link = Some(val),
                        b"length" if self.size.is_none() => self.size = val.parse().ok(),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn set_attr(&mut self, name: &str, value: String) {
        match name {
            "infohash" => self.info_hash = Some(value),
            "magneturl" => self.magnet_url = Some(value),
            "seeders" => self.seeders = value.parse().ok(),
            "peers" => self.peers = value.parse().ok(),
            "size" => self.size = value.parse().ok(),
            _ => {}
        }
    }

    fn set_text(&mut self, tag: &str, text: String) {
        match tag {
            "title" => self.title = Some(text),
            "link" => self.link = Some(text),
            "size" => self.size = text.parse().ok(),
            "pubDate" => {
                self.pub_date = DateTime::parse_from_rfc2822(&text)
                    .ok()
                    .map(|d| d.with_timezone(&Utc))
            }
            _ => {}
        }
    }

    fn build(self) -> Option<RawTorrentResult> {
        let title = self.title?;
        let info_hash = self
            .info_hash
            .as_deref()
            .and_then(normalize_infohash)
            .or_else(|| self.magnet_url.as_deref().and_then(extract_btih))
            .or_else(|| self.link.as_deref().and_then(extract_btih))?;
        let seeders = self.seeders.unwrap_or(0);
        Some(RawTorrentResult {
            title,
            info_hash,
            size_bytes: self.size.unwrap_or(0),
            seeders,
            leechers: self.peers.unwrap_or(0).saturating_sub(seeders),
            published_at: self.pub_date,
        })
    }
}

/// Parse a Torznab RSS document. Items without a usable infohash are dropped.
pub(crate) fn parse_torznab(xml: &str) -> Result<Vec<RawTorrentResult>, SearchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut results = Vec::new();
    let mut current: Option<ItemBuilder> = None;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "item" {
                    current = Some(ItemBuilder::default());
                } else if let Some(item) = current.as_mut() {
                    item.apply_element(e);
                }
                current_tag = tag;
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(item) = current.as_mut() {
                    item.apply_element(e);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(item) = current.as_mut() {
                    let text = e.unescape().unwrap_or_default().to_string();
                    if !text.is_empty() {
                        item.set_text(&current_tag, text);
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(item) = current.as_mut() {
                    let text = String::from_utf8_lossy(e).trim().to_string();
                    if !text.is_empty() {
                        item.set_text(&current_tag, text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(result) = current.take().and_then(ItemBuilder::build) {
                        results.push(result);
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SearchError::Parse(format!("XML parse error: {}", e))),
            _ => {}
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockTransport};
    use crate::http::HttpResponse;

    fn indexer(transport: Arc<MockTransport>) -> TorznabIndexer {
        TorznabIndexer::new(
            "jackett",
            "http://jackett.local/api/",
            Some("secret-key".to_string()),
            transport,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_parse_torznab_feed() {
        let results = parse_torznab(fixtures::TORZNAB_FEED).unwrap();
        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.title, "Dune.Part.Two.2024.2160p.WEB-DL.DDP5.1.Atmos.DV.HDR10.H.265");
        assert_eq!(first.info_hash, fixtures::HASH_A);
        assert_eq!(first.size_bytes, 21_474_836_480);
        assert_eq!(first.seeders, 120);
        assert_eq!(first.leechers, 30);
        assert!(first.published_at.is_some());

        // Hash recovered from the magnet URL
        assert_eq!(results[1].info_hash, fixtures::HASH_B);
    }

    #[test]
    fn test_parse_torznab_invalid_xml() {
        let err = parse_torznab("<rss><channel><item><title>x</item>").unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_search_request_encoding() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with("jackett.local", HttpResponse::new(200, fixtures::TORZNAB_FEED));

        let results = indexer(transport.clone())
            .search("Fast & Furious = 10+", MediaType::Tv)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let url = requests[0].full_url();
        assert!(url.starts_with("http://jackett.local/api?"));
        assert!(url.contains("t=tvsearch"));
        assert!(url.contains("q=Fast%20%26%20Furious%20%3D%2010%2B"));
        assert!(url.contains("cat=5000"));
    }

    #[tokio::test]
    async fn test_search_by_hash_filters() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with("jackett.local", HttpResponse::new(200, fixtures::TORZNAB_FEED));

        let results = indexer(transport.clone())
            .search_by_hash(&fixtures::HASH_B.to_uppercase(), MediaType::Movie)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].info_hash, fixtures::HASH_B);
        assert!(transport.requests()[0].full_url().contains("t=search"));
    }

    #[tokio::test]
    async fn test_http_error_is_api_error() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with("jackett.local", HttpResponse::new(500, "boom"));

        let err = indexer(transport).search("dune", MediaType::Movie).await.unwrap_err();
        assert!(matches!(err, SearchError::ApiError(msg) if msg.contains("500")));
    }
}
