//! Real-Debrid REST API (`/rest/1.0`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::cache_check::check_in_batches;
use super::encoding::HashListEncoding;
use super::http::{check_status, parse_body, ProviderHttp, TokenRefresher};
use super::{
    select_main_file, AccountInfo, CacheStatus, DebridError, DebridFile, DebridProvider,
    StreamInfo,
};
use crate::config::DebridServiceType;
use crate::http::{Credentials, HttpRequest, HttpTransport};
use crate::infohash::{magnet_uri, normalize_infohash};

pub const DEFAULT_REAL_DEBRID_URL: &str = "https://api.real-debrid.com/rest/1.0";
pub const DEFAULT_REAL_DEBRID_OAUTH_URL: &str = "https://api.real-debrid.com/oauth/v2";

/// Hashes per `instantAvailability` request.
pub const INSTANT_AVAILABILITY_LIMIT: usize = 48;

/// Page size for the torrent list; the API default would hide older entries.
const TORRENT_LIST_LIMIT: &str = "2500";

const DEVICE_GRANT: &str = "http://oauth.net/grant_type/device/1.0";

pub struct RealDebridProvider {
    http: ProviderHttp,
    base_url: String,
}

impl RealDebridProvider {
    pub fn new(
        token: String,
        transport: Arc<dyn HttpTransport>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: ProviderHttp::new(
                DebridServiceType::RealDebrid,
                transport,
                Credentials::Bearer(token),
                timeout,
            ),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_refresher(mut self, refresher: RealDebridRefresher) -> Self {
        self.http = self.http.with_refresher(Box::new(refresher));
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn torrent_info(&self, torrent_id: &str) -> Result<TorrentInfo, DebridError> {
        let request = HttpRequest::get(self.url(&format!("/torrents/info/{}", torrent_id)));
        self.http.json(request).await.map_err(|e| match e {
            DebridError::HttpError { code: 404, .. } => {
                DebridError::TorrentNotFound(torrent_id.to_string())
            }
            other => other,
        })
    }

    async fn fetch_availability(
        &self,
        chunk: Vec<String>,
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        let request = HashListEncoding::PathSegments.apply(
            HttpRequest::get(self.url("/torrents/instantAvailability")),
            &chunk,
        );
        let body: HashMap<String, serde_json::Value> = self.http.json(request).await?;
        Ok(body
            .into_iter()
            .map(|(hash, value)| (hash.to_lowercase(), availability_status(&value)))
            .collect())
    }
}

/// `{"rd": [{"<fileId>": {"filename", "filesize"}}]}` is cached, `[]` is not.
fn availability_status(value: &serde_json::Value) -> CacheStatus {
    let variants = match value.get("rd").and_then(|rd| rd.as_array()) {
        Some(variants) if !variants.is_empty() => variants,
        _ => return CacheStatus::NotCached,
    };

    let largest = variants
        .iter()
        .filter_map(|v| v.as_object())
        .flat_map(|files| files.iter())
        .filter_map(|(file_id, file)| {
            let name = file.get("filename")?.as_str()?.to_string();
            let size = file.get("filesize").and_then(|s| s.as_u64()).unwrap_or(0);
            Some((file_id.clone(), name, size))
        })
        .max_by_key(|(_, _, size)| *size);

    match largest {
        Some((file_id, file_name, file_size)) => CacheStatus::Cached {
            file_id: Some(file_id),
            file_name: Some(file_name),
            file_size: Some(file_size),
        },
        None => CacheStatus::cached(),
    }
}

#[async_trait]
impl DebridProvider for RealDebridProvider {
    fn service(&self) -> DebridServiceType {
        DebridServiceType::RealDebrid
    }

    async fn account_info(&self) -> Result<AccountInfo, DebridError> {
        let user: RdUser = self.http.json(HttpRequest::get(self.url("/user"))).await?;
        Ok(AccountInfo {
            service: DebridServiceType::RealDebrid,
            username: user.username,
            email: user.email,
            is_premium: user.account_type == "premium",
            premium_expires: user.expiration,
        })
    }

    async fn check_cache(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        check_in_batches(
            DebridServiceType::RealDebrid,
            hashes,
            INSTANT_AVAILABILITY_LIMIT,
            |chunk| self.fetch_availability(chunk),
        )
        .await
    }

    async fn add_magnet(&self, hash: &str) -> Result<String, DebridError> {
        let hash = normalize_infohash(hash).ok_or(DebridError::InvalidHash)?;

        let existing: Vec<RdTorrent> = self
            .http
            .json(HttpRequest::get(self.url("/torrents")).query("limit", TORRENT_LIST_LIMIT))
            .await?;
        if let Some(torrent) = existing.iter().find(|t| t.hash.eq_ignore_ascii_case(&hash)) {
            debug!(torrent_id = %torrent.id, "Reusing existing Real-Debrid torrent");
            return Ok(torrent.id.clone());
        }

        let request = HttpRequest::post(self.url("/torrents/addMagnet"))
            .form(vec![("magnet".to_string(), magnet_uri(&hash))]);
        let added: RdAddMagnet = self.http.json(request).await.map_err(|e| match e {
            DebridError::HttpError { code: 400, .. } => DebridError::InvalidHash,
            DebridError::HttpError { code: 403, .. } => DebridError::NotPremium,
            other => other,
        })?;
        Ok(added.id)
    }

    async fn list_files(&self, torrent_id: &str) -> Result<Vec<DebridFile>, DebridError> {
        let info = self.torrent_info(torrent_id).await?;
        Ok(info.files.iter().map(RdFile::to_debrid_file).collect())
    }

    fn requires_file_selection(&self) -> bool {
        true
    }

    async fn select_files(&self, torrent_id: &str, file_ids: &[String]) -> Result<(), DebridError> {
        let files = if file_ids.is_empty() {
            "all".to_string()
        } else {
            file_ids.join(",")
        };
        let request = HttpRequest::post(self.url(&format!("/torrents/selectFiles/{}", torrent_id)))
            .form(vec![("files".to_string(), files)]);
        // 204 No Content on success
        self.http.send(request).await.map_err(|e| match e {
            DebridError::HttpError { code: 404, .. } => {
                DebridError::TorrentNotFound(torrent_id.to_string())
            }
            other => other,
        })?;
        Ok(())
    }

    async fn get_stream_url(&self, torrent_id: &str) -> Result<StreamInfo, DebridError> {
        let info = self.torrent_info(torrent_id).await?;
        match info.status.as_str() {
            "downloaded" => {}
            "magnet_error" | "error" | "virus" | "dead" => {
                return Err(DebridError::TorrentNotFound(torrent_id.to_string()))
            }
            _ => return Err(DebridError::FileNotReady),
        }

        let link = info.links.first().ok_or(DebridError::FileNotReady)?;
        let selected: Vec<DebridFile> = info
            .files
            .iter()
            .filter(|f| f.selected == 1)
            .map(RdFile::to_debrid_file)
            .collect();
        let (file_name, size) = match select_main_file(&selected) {
            Some(file) => (file.file_name().to_string(), Some(file.size)),
            None => (info.filename.clone(), Some(info.bytes)),
        };

        Ok(StreamInfo::from_file(
            link.clone(),
            file_name,
            size,
            DebridServiceType::RealDebrid,
        ))
    }

    async fn unrestrict(&self, link: &str) -> Result<String, DebridError> {
        let request = HttpRequest::post(self.url("/unrestrict/link"))
            .form(vec![("link".to_string(), link.to_string())]);
        let unrestricted: RdUnrestrict = self.http.json(request).await?;
        Ok(unrestricted.download)
    }
}

/// OAuth device-flow refresh. The secret is `client_id:client_secret:refresh_token`.
pub struct RealDebridRefresher {
    oauth_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl RealDebridRefresher {
    pub fn from_secret(secret: &str, oauth_url: impl Into<String>) -> Result<Self, DebridError> {
        let mut parts = secret.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(id), Some(client_secret), Some(refresh))
                if !id.is_empty() && !client_secret.is_empty() && !refresh.is_empty() =>
            {
                Ok(Self {
                    oauth_url: oauth_url.into().trim_end_matches('/').to_string(),
                    client_id: id.to_string(),
                    client_secret: client_secret.to_string(),
                    refresh_token: refresh.to_string(),
                })
            }
            _ => Err(DebridError::Parse(
                "refresh secret must be client_id:client_secret:refresh_token".to_string(),
            )),
        }
    }
}

#[async_trait]
impl TokenRefresher for RealDebridRefresher {
    async fn refresh(&self, transport: &dyn HttpTransport) -> Result<String, DebridError> {
        let request = HttpRequest::post(format!("{}/token", self.oauth_url)).form(vec![
            ("client_id".to_string(), self.client_id.clone()),
            ("client_secret".to_string(), self.client_secret.clone()),
            ("code".to_string(), self.refresh_token.clone()),
            ("grant_type".to_string(), DEVICE_GRANT.to_string()),
        ]);
        let response = check_status(transport.execute(request).await?).map_err(|e| match e {
            DebridError::HttpError { .. } => DebridError::Unauthorized,
            other => other,
        })?;
        let token: RdToken = parse_body(&response)?;
        Ok(token.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct RdUser {
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(rename = "type")]
    account_type: String,
    #[serde(default)]
    expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RdTorrent {
    id: String,
    hash: String,
}

#[derive(Debug, Deserialize)]
struct RdAddMagnet {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TorrentInfo {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    bytes: u64,
    status: String,
    #[serde(default)]
    files: Vec<RdFile>,
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RdFile {
    id: u64,
    path: String,
    bytes: u64,
    #[serde(default)]
    selected: u8,
}

impl RdFile {
    fn to_debrid_file(&self) -> DebridFile {
        DebridFile {
            id: self.id.to_string(),
            path: self.path.trim_start_matches('/').to_string(),
            size: self.bytes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RdUnrestrict {
    download: String,
}

#[derive(Debug, Deserialize)]
struct RdToken {
    access_token: String,
}
