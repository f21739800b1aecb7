//! Types shared by every debrid provider.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::classifier::{classify, Audio, Codec, Hdr, Quality, Source};
use crate::config::DebridServiceType;
use crate::http::TransportError;

/// Whether a provider already holds a torrent's content.
///
/// `Unknown` is not `NotCached`: the provider could not pre-check (Usenet
/// backends) or the check failed softly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CacheStatus {
    Cached {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_size: Option<u64>,
    },
    NotCached,
    Unknown,
}

impl CacheStatus {
    /// Cached with no file details.
    pub fn cached() -> Self {
        CacheStatus::Cached {
            file_id: None,
            file_name: None,
            file_size: None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, CacheStatus::Cached { .. })
    }
}

/// A resolved, directly playable stream.
///
/// Identity comes from the release tags and file name only. Providers sign
/// URLs with rotating tokens, so the URL never participates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub url: String,
    pub quality: Quality,
    pub codec: Codec,
    pub audio: Audio,
    pub source: Source,
    pub hdr: Hdr,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub debrid_service: DebridServiceType,
}

impl StreamInfo {
    /// Build from a file name, classifying it for tags.
    pub fn from_file(
        url: impl Into<String>,
        file_name: impl Into<String>,
        size_bytes: Option<u64>,
        debrid_service: DebridServiceType,
    ) -> Self {
        let file_name = file_name.into();
        let tags = classify(&file_name);
        Self {
            url: url.into(),
            quality: tags.quality,
            codec: tags.codec,
            audio: tags.audio,
            source: tags.source,
            hdr: tags.hdr,
            file_name,
            size_bytes,
            debrid_service,
        }
    }

    /// Stable identity over the semantic fields.
    pub fn id(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [
            self.quality.label(),
            self.codec.label(),
            self.audio.label(),
            self.source.label(),
            self.hdr.label(),
            self.file_name.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

impl PartialEq for StreamInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for StreamInfo {}

/// Account details reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub service: DebridServiceType,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_premium: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_expires: Option<DateTime<Utc>>,
}

/// A file inside a provider-side torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebridFile {
    pub id: String,
    pub path: String,
    pub size: u64,
}

impl DebridFile {
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str())
    }
}

const NON_VIDEO_EXTENSIONS: &[&str] = &[
    "srt", "sub", "idx", "ass", "ssa", "vtt", "nfo", "txt", "jpg", "png",
];

fn is_main_candidate(file: &DebridFile) -> bool {
    let name = file.file_name().to_lowercase();
    let extension = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    if NON_VIDEO_EXTENSIONS.contains(&extension) {
        return false;
    }
    !name
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == "sample")
}

/// The main video file: largest file that is not a subtitle, metadata or sample.
pub fn select_main_file(files: &[DebridFile]) -> Option<&DebridFile> {
    files
        .iter()
        .filter(|f| is_main_candidate(f))
        .max_by_key(|f| f.size)
}

/// A stream found through a provider's own search (Usenet providers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsenetResult {
    /// Opaque id accepted by `get_stream_url`.
    pub stream_id: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub service: DebridServiceType,
}

/// Errors from debrid providers and resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DebridError {
    #[error("Unauthorized: invalid or expired token")]
    Unauthorized,

    #[error("Account is not premium")]
    NotPremium,

    #[error("Invalid infohash")]
    InvalidHash,

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("File not ready")]
    FileNotReady,

    #[error("Rate limited")]
    RateLimited,

    #[error("HTTP {code}: {message}")]
    HttpError { code: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Invalid workflow state: {0}")]
    InvalidState(String),

    #[error("Debrid service not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<TransportError> for DebridError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => DebridError::Timeout,
            TransportError::Connect(msg) | TransportError::Other(msg) => {
                DebridError::NetworkError(msg)
            }
        }
    }
}

/// Capability set every debrid provider implements.
///
/// Partial-capability providers implement every method; the ones they
/// cannot support are explicit no-ops or always-error stubs.
#[async_trait]
pub trait DebridProvider: Send + Sync {
    fn service(&self) -> DebridServiceType;

    /// `Ok(false)` when the provider rejects the token.
    async fn validate_token(&self) -> Result<bool, DebridError> {
        match self.account_info().await {
            Ok(_) => Ok(true),
            Err(DebridError::Unauthorized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn account_info(&self) -> Result<AccountInfo, DebridError>;

    /// Availability per lowercase infohash. An empty input returns an empty
    /// map without touching the network.
    async fn check_cache(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, CacheStatus>, DebridError>;

    /// Add (or find) the torrent and return the provider's torrent id.
    async fn add_magnet(&self, hash: &str) -> Result<String, DebridError>;

    async fn list_files(&self, torrent_id: &str) -> Result<Vec<DebridFile>, DebridError>;

    /// Whether `select_files` has any effect for this provider.
    fn requires_file_selection(&self) -> bool;

    async fn select_files(&self, torrent_id: &str, file_ids: &[String]) -> Result<(), DebridError>;

    async fn get_stream_url(&self, torrent_id: &str) -> Result<StreamInfo, DebridError>;

    /// Turn a provider link into the final CDN URL.
    async fn unrestrict(&self, link: &str) -> Result<String, DebridError>;

    /// Provider-native search. Only Usenet providers support it.
    async fn search_streams(&self, _query: &str) -> Result<Vec<UsenetResult>, DebridError> {
        Err(DebridError::NotSupported(format!(
            "{} has no native search",
            self.service()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: &str, path: &str, size: u64) -> DebridFile {
        DebridFile {
            id: id.to_string(),
            path: path.to_string(),
            size,
        }
    }

    #[test]
    fn test_stream_identity_ignores_url() {
        let a = StreamInfo::from_file(
            "https://cdn.example/dl/abc?token=111&expires=1",
            "Movie.2024.1080p.BluRay.x264.mkv",
            Some(1000),
            DebridServiceType::RealDebrid,
        );
        let mut b = a.clone();
        b.url = "https://cdn.example/dl/abc?token=222&expires=2".to_string();

        assert_eq!(a.id(), b.id());
        assert_eq!(a, b);
    }

    #[test]
    fn test_stream_identity_changes_with_tags() {
        let a = StreamInfo::from_file(
            "https://cdn.example/a",
            "Movie.mkv",
            None,
            DebridServiceType::Torbox,
        );
        let mut b = a.clone();
        b.quality = Quality::FullHd;
        assert_ne!(a.id(), b.id());

        let mut c = a.clone();
        c.codec = Codec::Hevc;
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_select_main_file_skips_subtitles_and_samples() {
        let files = vec![
            file("1", "Movie/Movie.2024.1080p.mkv", 4_000_000_000),
            file("2", "Movie/Sample/movie-sample.mkv", 5_000_000_000),
            file("3", "Movie/Subs/English.srt", 9_000_000_000),
            file("4", "Movie/Movie.nfo", 1_000),
        ];
        assert_eq!(select_main_file(&files).map(|f| f.id.as_str()), Some("1"));
        assert!(select_main_file(&[]).is_none());
        assert!(select_main_file(&files[2..]).is_none());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file("1", "a/b/c.mkv", 1).file_name(), "c.mkv");
        assert_eq!(file("1", "c.mkv", 1).file_name(), "c.mkv");
    }

    #[test]
    fn test_cache_status_serialization() {
        let json = serde_json::to_value(CacheStatus::Cached {
            file_id: Some("1".into()),
            file_name: None,
            file_size: Some(42),
        })
        .unwrap();
        assert_eq!(json["status"], "cached");
        assert_eq!(json["file_size"], 42);
        assert_eq!(
            serde_json::to_value(CacheStatus::Unknown).unwrap()["status"],
            "unknown"
        );
        assert!(!CacheStatus::NotCached.is_cached());
        assert!(CacheStatus::cached().is_cached());
    }

    #[test]
    fn test_transport_error_mapping() {
        assert_eq!(DebridError::from(TransportError::Timeout), DebridError::Timeout);
        assert!(matches!(
            DebridError::from(TransportError::Connect("refused".into())),
            DebridError::NetworkError(_)
        ));
    }
}
