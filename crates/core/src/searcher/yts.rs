//! YTS movie API. Movies only.

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

pub const DEFAULT_YTS_URL: &str = "https://yts.mx/api/v2";

pub struct YtsIndexer {
    name: String,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl YtsIndexer {
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
impl IndexerBackend for YtsIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<RawTorrentResult>, SearchError> {
        if media_type == MediaType::Tv {
            return Ok(Vec::new());
        }

        let request = HttpRequest::get(format!("{}/list_movies.json", self.base_url))
            .query("query_term", query)
            .query("limit", "50")
            .timeout(self.timeout);
        let response = self.transport.execute(request).await?;
        let body: YtsResponse = parse_json(&response)?;

        if body.status != "ok" {
            return Err(SearchError::ApiError(
                body.status_message.unwrap_or(body.status),
            ));
        }

        let results: Vec<_> = body
            .data
            .and_then(|d| d.movies)
            .unwrap_or_default()
            .into_iter()
            .flat_map(YtsMovie::into_raw)
            .collect();

        debug!(indexer = %self.name, results = results.len(), "YTS search complete");
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct YtsResponse {
    status: String,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    data: Option<YtsData>,
}

#[derive(Debug, Deserialize)]
struct YtsData {
    // Absent when the query matched nothing.
    #[serde(default)]
    movies: Option<Vec<YtsMovie>>,
}

#[derive(Debug, Deserialize)]
struct YtsMovie {
    title_long: String,
    #[serde(default)]
    torrents: Vec<YtsTorrent>,
}

#[derive(Debug, Deserialize)]
struct YtsTorrent {
    hash: String,
    quality: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    video_codec: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    size_bytes: u64,
    #[serde(default, deserialize_with = "lenient_u32")]
    seeds: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    peers: u32,
    #[serde(default)]
    date_uploaded_unix: Option<i64>,
}

impl YtsMovie {
    fn into_raw(self) -> Vec<RawTorrentResult> {
        let title_long = self.title_long;
        self.torrents
            .into_iter()
            .filter_map(|t| {
                let info_hash = normalize_infohash(&t.hash)?;
                // YTS has no release names; build one the classifier understands.
                let mut title = format!("{} {} {}", title_long, t.quality, t.kind);
                if let Some(codec) = &t.video_codec {
                    title.push(' ');
                    title.push_str(codec);
                }
                Some(RawTorrentResult {
                    title: format!("{} YTS", title.trim_end()),
                    info_hash,
                    size_bytes: t.size_bytes,
                    seeders: t.seeds,
                    leechers: t.peers,
                    published_at: t
                        .date_uploaded_unix
                        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
                })
            })
            .collect()
    }
}
