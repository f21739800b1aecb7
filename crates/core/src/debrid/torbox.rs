//! TorBox API v1.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::cache_check::check_in_batches;
use super::encoding::HashListEncoding;
use super::http::ProviderHttp;
use super::{
    select_main_file, AccountInfo, CacheStatus, DebridError, DebridFile, DebridProvider,
    StreamInfo,
};
use crate::config::DebridServiceType;
use crate::http::{Credentials, HttpRequest, HttpTransport};
use crate::infohash::{magnet_uri, normalize_infohash};
use crate::wire::lenient_u64;

pub const DEFAULT_TORBOX_URL: &str = "https://api.torbox.app/v1/api";

const CHECK_CACHED_LIMIT: usize = 100;
const LIST_LIMIT: &str = "2500";

pub struct TorboxProvider {
    http: ProviderHttp,
    base_url: String,
}

impl TorboxProvider {
    pub fn new(
        token: String,
        transport: Arc<dyn HttpTransport>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: ProviderHttp::new(
                DebridServiceType::Torbox,
                transport,
                Credentials::Bearer(token),
                timeout,
            ),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and unwrap `{"success", "error", "detail", "data"}`.
    async fn call<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<Option<T>, DebridError> {
        let envelope: Envelope<T> = self.http.json(request).await?;
        if envelope.success {
            Ok(envelope.data)
        } else {
            Err(map_error(
                envelope.error.as_deref().unwrap_or("UNKNOWN_ERROR"),
                &envelope.detail,
            ))
        }
    }

    async fn torrent(&self, torrent_id: &str) -> Result<TbTorrent, DebridError> {
        let request = HttpRequest::get(self.url("/torrents/mylist"))
            .query("id", torrent_id)
            .query("bypass_cache", "true");
        self.call(request)
            .await?
            .ok_or_else(|| DebridError::TorrentNotFound(torrent_id.to_string()))
    }

    async fn fetch_cached(
        &self,
        chunk: Vec<String>,
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        let request = HashListEncoding::CommaList("hash").apply(
            HttpRequest::get(self.url("/torrents/checkcached"))
                .query("format", "object")
                .query("list_files", "true"),
            &chunk,
        );
        // `data` is null or an empty list when nothing is cached.
        let data: Option<serde_json::Value> = self.call(request).await?;
        let cached: HashMap<String, TbCached> = match data {
            Some(value @ serde_json::Value::Object(_)) => serde_json::from_value(value)
                .map_err(|e| DebridError::Parse(e.to_string()))?,
            _ => HashMap::new(),
        };

        Ok(cached
            .into_iter()
            .map(|(hash, entry)| {
                (
                    hash.to_lowercase(),
                    CacheStatus::Cached {
                        file_id: None,
                        file_name: entry.name,
                        file_size: Some(entry.size),
                    },
                )
            })
            .collect())
    }
}

fn map_error(code: &str, detail: &str) -> DebridError {
    match code {
        "AUTH_ERROR" | "BAD_TOKEN" | "NO_AUTH" => DebridError::Unauthorized,
        "PLAN_RESTRICTED_FEATURE" => DebridError::NotPremium,
        "DOWNLOAD_TOO_LARGE" | "ACTIVE_LIMIT" | "MONTHLY_LIMIT" | "COOLDOWN_LIMIT" => {
            DebridError::RateLimited
        }
        "INVALID_OPTION" if detail.to_lowercase().contains("hash") => DebridError::InvalidHash,
        _ => DebridError::HttpError {
            code: 200,
            message: format!("{}: {}", code, detail),
        },
    }
}

#[async_trait]
impl DebridProvider for TorboxProvider {
    fn service(&self) -> DebridServiceType {
        DebridServiceType::Torbox
    }

    async fn account_info(&self) -> Result<AccountInfo, DebridError> {
        let user: TbUser = self
            .call(HttpRequest::get(self.url("/user/me")))
            .await?
            .ok_or_else(|| DebridError::Parse("user response without data".to_string()))?;
        Ok(AccountInfo {
            service: DebridServiceType::Torbox,
            username: user.email.clone(),
            email: Some(user.email),
            is_premium: user.plan > 0,
            premium_expires: user.premium_expires_at,
        })
    }

    async fn check_cache(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        check_in_batches(DebridServiceType::Torbox, hashes, CHECK_CACHED_LIMIT, |chunk| {
            self.fetch_cached(chunk)
        })
        .await
    }

    async fn add_magnet(&self, hash: &str) -> Result<String, DebridError> {
        let hash = normalize_infohash(hash).ok_or(DebridError::InvalidHash)?;

        let request = HttpRequest::get(self.url("/torrents/mylist"))
            .query("bypass_cache", "true")
            .query("limit", LIST_LIMIT);
        let existing: Vec<TbTorrent> = self.call(request).await?.unwrap_or_default();
        if let Some(torrent) = existing.iter().find(|t| t.hash.eq_ignore_ascii_case(&hash)) {
            debug!(torrent_id = torrent.id, "Reusing existing TorBox torrent");
            return Ok(torrent.id.to_string());
        }

        let request = HttpRequest::post(self.url("/torrents/createtorrent"))
            .multipart(vec![("magnet".to_string(), magnet_uri(&hash))]);
        let created: TbCreated = self
            .call(request)
            .await?
            .ok_or_else(|| DebridError::Parse("createtorrent returned no data".to_string()))?;
        Ok(created.torrent_id.to_string())
    }

    async fn list_files(&self, torrent_id: &str) -> Result<Vec<DebridFile>, DebridError> {
        Ok(self.torrent(torrent_id).await?.to_files())
    }

    fn requires_file_selection(&self) -> bool {
        false
    }

    async fn select_files(&self, _torrent_id: &str, _file_ids: &[String]) -> Result<(), DebridError> {
        Ok(())
    }

    async fn get_stream_url(&self, torrent_id: &str) -> Result<StreamInfo, DebridError> {
        let torrent = self.torrent(torrent_id).await?;
        if torrent.download_state.to_lowercase().contains("error") {
            return Err(DebridError::TorrentNotFound(torrent_id.to_string()));
        }
        if !torrent.download_finished {
            return Err(DebridError::FileNotReady);
        }

        let files = torrent.to_files();
        let main = select_main_file(&files).ok_or(DebridError::FileNotReady)?;

        // Auth stays in the header; `redirect=false` returns the link as data.
        let request = HttpRequest::get(self.url("/torrents/requestdl"))
            .query("torrent_id", torrent_id)
            .query("file_id", main.id.as_str())
            .query("redirect", "false");
        let url: String = self
            .call(request)
            .await?
            .ok_or(DebridError::FileNotReady)?;

        Ok(StreamInfo::from_file(
            url,
            main.file_name(),
            Some(main.size),
            DebridServiceType::Torbox,
        ))
    }

    /// `requestdl` already returns the CDN link.
    async fn unrestrict(&self, link: &str) -> Result<String, DebridError> {
        Ok(link.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TbUser {
    email: String,
    #[serde(default)]
    plan: u8,
    #[serde(default)]
    premium_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct TbCached {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct TbTorrent {
    id: u64,
    hash: String,
    #[serde(default)]
    download_finished: bool,
    #[serde(default)]
    download_state: String,
    #[serde(default)]
    files: Vec<TbFile>,
}

impl TbTorrent {
    fn to_files(&self) -> Vec<DebridFile> {
        self.files
            .iter()
            .map(|f| DebridFile {
                id: f.id.to_string(),
                path: f.name.clone(),
                size: f.size,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct TbFile {
    id: u64,
    name: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct TbCreated {
    torrent_id: u64,
}
