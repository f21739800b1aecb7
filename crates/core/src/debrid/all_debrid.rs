//! AllDebrid API v4.
//!
//! Every response is wrapped in `{"status": "success"|"error", "data", "error"}`
//! and errors arrive as string codes, frequently with HTTP 200.

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

pub const DEFAULT_ALL_DEBRID_URL: &str = "https://api.alldebrid.com/v4";

const AGENT: &str = "streamrelay";
const INSTANT_LIMIT: usize = 100;
const STATUS_READY: u32 = 4;

pub struct AllDebridProvider {
    http: ProviderHttp,
    base_url: String,
}

impl AllDebridProvider {
    pub fn new(
        token: String,
        transport: Arc<dyn HttpTransport>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: ProviderHttp::new(
                DebridServiceType::AllDebrid,
                transport,
                Credentials::Bearer(token),
                timeout,
            ),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, path: &str) -> HttpRequest {
        HttpRequest::get(format!("{}{}", self.base_url, path)).query("agent", AGENT)
    }

    fn post(&self, path: &str) -> HttpRequest {
        HttpRequest::post(format!("{}{}", self.base_url, path)).query("agent", AGENT)
    }

    /// Send and unwrap the envelope.
    async fn call<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, DebridError> {
        let envelope: Envelope<T> = self.http.json(request).await?;
        match (envelope.status.as_str(), envelope.data, envelope.error) {
            ("success", Some(data), _) => Ok(data),
            (_, _, Some(error)) => Err(map_error_code(&error.code, &error.message)),
            _ => Err(DebridError::Parse("envelope without data".to_string())),
        }
    }

    async fn magnet_by_id(&self, torrent_id: &str) -> Result<AdMagnet, DebridError> {
        let data: AdMagnetStatus = self
            .call(self.get("/magnet/status").query("id", torrent_id))
            .await
            .map_err(|e| match e {
                DebridError::TorrentNotFound(_) => DebridError::TorrentNotFound(torrent_id.to_string()),
                other => other,
            })?;
        match data.magnets {
            OneOrMany::One(magnet) => Ok(magnet),
            OneOrMany::Many(magnets) => magnets
                .into_iter()
                .next()
                .ok_or_else(|| DebridError::TorrentNotFound(torrent_id.to_string())),
        }
    }

    async fn fetch_instant(
        &self,
        chunk: Vec<String>,
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        let request = HashListEncoding::IndexedForm("magnets").apply(self.post("/magnet/instant"), &chunk);
        let data: AdInstant = self.call(request).await?;
        Ok(data
            .magnets
            .into_iter()
            .map(|m| {
                let status = if m.instant {
                    CacheStatus::cached()
                } else {
                    CacheStatus::NotCached
                };
                (m.hash.unwrap_or(m.magnet).to_lowercase(), status)
            })
            .collect())
    }
}

/// AllDebrid error codes onto the shared error set.
fn map_error_code(code: &str, message: &str) -> DebridError {
    match code {
        c if c.starts_with("AUTH_") => DebridError::Unauthorized,
        "MUST_BE_PREMIUM" | "FREE_TRIAL_LIMIT_REACHED" => DebridError::NotPremium,
        "MAGNET_INVALID_ID" => DebridError::TorrentNotFound(message.to_string()),
        "MAGNET_INVALID_URI" | "MAGNET_NO_URI" => DebridError::InvalidHash,
        _ => DebridError::HttpError {
            code: 200,
            message: format!("{}: {}", code, message),
        },
    }
}

fn links_to_files(links: &[AdLink]) -> Vec<DebridFile> {
    links
        .iter()
        .enumerate()
        .map(|(i, link)| DebridFile {
            id: i.to_string(),
            path: link.filename.clone(),
            size: link.size,
        })
        .collect()
}

#[async_trait]
impl DebridProvider for AllDebridProvider {
    fn service(&self) -> DebridServiceType {
        DebridServiceType::AllDebrid
    }

    async fn account_info(&self) -> Result<AccountInfo, DebridError> {
        let data: AdUserData = self.call(self.get("/user")).await?;
        let user = data.user;
        Ok(AccountInfo {
            service: DebridServiceType::AllDebrid,
            username: user.username,
            email: user.email,
            is_premium: user.is_premium,
            premium_expires: user
                .premium_until
                .filter(|ts| *ts > 0)
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        })
    }

    async fn check_cache(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        check_in_batches(DebridServiceType::AllDebrid, hashes, INSTANT_LIMIT, |chunk| {
            self.fetch_instant(chunk)
        })
        .await
    }

    async fn add_magnet(&self, hash: &str) -> Result<String, DebridError> {
        let hash = normalize_infohash(hash).ok_or(DebridError::InvalidHash)?;

        let existing: AdMagnetStatus = self.call(self.get("/magnet/status")).await?;
        if let OneOrMany::Many(magnets) = &existing.magnets {
            if let Some(magnet) = magnets.iter().find(|m| m.hash.eq_ignore_ascii_case(&hash)) {
                debug!(torrent_id = magnet.id, "Reusing existing AllDebrid magnet");
                return Ok(magnet.id.to_string());
            }
        }

        let request = self
            .post("/magnet/upload")
            .form(vec![("magnets[]".to_string(), magnet_uri(&hash))]);
        let data: AdUpload = self.call(request).await?;
        let uploaded = data
            .magnets
            .into_iter()
            .next()
            .ok_or_else(|| DebridError::Parse("upload returned no magnets".to_string()))?;
        if let Some(error) = uploaded.error {
            return Err(map_error_code(&error.code, &error.message));
        }
        uploaded
            .id
            .map(|id| id.to_string())
            .ok_or_else(|| DebridError::Parse("upload returned no id".to_string()))
    }

    async fn list_files(&self, torrent_id: &str) -> Result<Vec<DebridFile>, DebridError> {
        let magnet = self.magnet_by_id(torrent_id).await?;
        Ok(links_to_files(&magnet.links))
    }

    fn requires_file_selection(&self) -> bool {
        false
    }

    async fn select_files(&self, _torrent_id: &str, _file_ids: &[String]) -> Result<(), DebridError> {
        Ok(())
    }

    async fn get_stream_url(&self, torrent_id: &str) -> Result<StreamInfo, DebridError> {
        let magnet = self.magnet_by_id(torrent_id).await?;
        match magnet.status_code {
            STATUS_READY => {}
            // 5..=15 are terminal error states
            5..=15 => return Err(DebridError::TorrentNotFound(torrent_id.to_string())),
            _ => return Err(DebridError::FileNotReady),
        }

        let files = links_to_files(&magnet.links);
        let main = select_main_file(&files).ok_or(DebridError::FileNotReady)?;
        let link = magnet
            .links
            .get(main.id.parse::<usize>().unwrap_or(0))
            .ok_or(DebridError::FileNotReady)?;

        Ok(StreamInfo::from_file(
            link.link.clone(),
            main.file_name(),
            Some(main.size),
            DebridServiceType::AllDebrid,
        ))
    }

    async fn unrestrict(&self, link: &str) -> Result<String, DebridError> {
        let data: AdUnlock = self.call(self.get("/link/unlock").query("link", link)).await?;
        Ok(data.link)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    error: Option<AdError>,
}

#[derive(Debug, Deserialize)]
struct AdError {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AdUserData {
    user: AdUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdUser {
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    is_premium: bool,
    #[serde(default)]
    premium_until: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AdInstant {
    #[serde(default)]
    magnets: Vec<AdInstantMagnet>,
}

#[derive(Debug, Deserialize)]
struct AdInstantMagnet {
    magnet: String,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    instant: bool,
}

/// `/magnet/status` returns an object for a single id, an array otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

#[derive(Debug, Deserialize)]
struct AdMagnetStatus {
    magnets: OneOrMany<AdMagnet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdMagnet {
    id: u64,
    #[serde(default)]
    hash: String,
    #[serde(default)]
    status_code: u32,
    #[serde(default)]
    links: Vec<AdLink>,
}

#[derive(Debug, Deserialize)]
struct AdLink {
    link: String,
    filename: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct AdUpload {
    #[serde(default)]
    magnets: Vec<AdUploaded>,
}

#[derive(Debug, Deserialize)]
struct AdUploaded {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    error: Option<AdError>,
}

#[derive(Debug, Deserialize)]
struct AdUnlock {
    link: String,
}
