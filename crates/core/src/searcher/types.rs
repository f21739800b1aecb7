//! Types for the torrent search system.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::{classify, Audio, Codec, Hdr, Quality, Source};
use crate::http::TransportError;

/// Kind of media being searched for. Some indexers only carry one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

/// Result from a single indexer, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTorrentResult {
    pub title: String,
    /// Lowercase 40-hex infohash.
    pub info_hash: String,
    pub size_bytes: u64,
    pub seeders: u32,
    pub leechers: u32,
    pub published_at: Option<DateTime<Utc>>,
}

/// A classified torrent release from one indexer.
///
/// Identity is `(info_hash, indexer_name)`: the same hash reported by two
/// indexers yields two distinct results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentResult {
    pub info_hash: String,
    pub title: String,
    pub size_bytes: u64,
    pub seeders: u32,
    pub leechers: u32,
    pub quality: Quality,
    pub codec: Codec,
    pub audio: Audio,
    pub source: Source,
    pub hdr: Hdr,
    pub indexer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl TorrentResult {
    /// Classify a raw result reported by `indexer_name`.
    pub fn from_raw(raw: RawTorrentResult, indexer_name: &str) -> Self {
        let tags = classify(&raw.title);
        Self {
            info_hash: raw.info_hash,
            title: raw.title,
            size_bytes: raw.size_bytes,
            seeders: raw.seeders,
            leechers: raw.leechers,
            quality: tags.quality,
            codec: tags.codec,
            audio: tags.audio,
            source: tags.source,
            hdr: tags.hdr,
            indexer_name: indexer_name.to_string(),
            published_at: raw.published_at,
        }
    }

    pub fn id(&self) -> String {
        format!("{}@{}", self.info_hash, self.indexer_name)
    }
}

impl PartialEq for TorrentResult {
    fn eq(&self, other: &Self) -> bool {
        self.info_hash == other.info_hash && self.indexer_name == other.indexer_name
    }
}

impl Eq for TorrentResult {}

impl Hash for TorrentResult {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.info_hash.hash(state);
        self.indexer_name.hash(state);
    }
}

/// Sort best-first: quality, then source tier, then seeders.
pub fn rank_results(results: &mut [TorrentResult]) {
    results.sort_by(|a, b| {
        b.quality
            .sort_order()
            .cmp(&a.quality.sort_order())
            .then_with(|| b.source.quality_tier().cmp(&a.source.quality_tier()))
            .then_with(|| b.seeders.cmp(&a.seeders))
    });
}

/// Errors that can occur during search operations.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Failed to parse indexer response: {0}")]
    Parse(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Indexer misconfigured: {0}")]
    Misconfigured(String),

    #[error("All indexers failed: {detail}")]
    AllIndexersFailed {
        detail: String,
        /// `(indexer name, error message)` for every failed indexer.
        errors: Vec<(String, String)>,
    },
}

impl From<TransportError> for SearchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => SearchError::Timeout,
            TransportError::Connect(msg) => SearchError::ConnectionFailed(msg),
            TransportError::Other(msg) => SearchError::ApiError(msg),
        }
    }
}

/// A single indexer protocol client.
#[async_trait]
pub trait IndexerBackend: Send + Sync {
    /// Configured indexer name, used for logging and result identity.
    fn name(&self) -> &str;

    /// Free-text search.
    async fn search(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<RawTorrentResult>, SearchError>;

    /// Look up one infohash. Defaults to searching for the hash text and
    /// keeping exact matches.
    async fn search_by_hash(
        &self,
        hash: &str,
        media_type: MediaType,
    ) -> Result<Vec<RawTorrentResult>, SearchError> {
        let hash = hash.to_lowercase();
        let results = self.search(&hash, media_type).await?;
        Ok(results.into_iter().filter(|r| r.info_hash == hash).collect())
    }
}
