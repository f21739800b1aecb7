//! Premiumize.me API.

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
use super::http::{parse_body, ProviderHttp};
use super::{
    select_main_file, AccountInfo, CacheStatus, DebridError, DebridFile, DebridProvider,
    StreamInfo,
};
use crate::config::DebridServiceType;
use crate::http::{Credentials, HttpRequest, HttpTransport};
use crate::infohash::{extract_btih, magnet_uri, normalize_infohash};
use crate::wire::lenient_u64;

pub const DEFAULT_PREMIUMIZE_URL: &str = "https://www.premiumize.me/api";

const CACHE_CHECK_LIMIT: usize = 100;

pub struct PremiumizeProvider {
    http: ProviderHttp,
    base_url: String,
}

impl PremiumizeProvider {
    pub fn new(
        token: String,
        transport: Arc<dyn HttpTransport>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: ProviderHttp::new(
                DebridServiceType::Premiumize,
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

    /// Send and check the `status` field.
    async fn call<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, DebridError> {
        let response = self.http.send(request).await?;
        let status: PmStatus = parse_body(&response)?;
        if status.status != "success" {
            return Err(map_message(status.message.as_deref().unwrap_or("unknown error")));
        }
        parse_body(&response)
    }

    async fn transfers(&self) -> Result<Vec<PmTransfer>, DebridError> {
        let list: PmTransferList = self.call(HttpRequest::get(self.url("/transfer/list"))).await?;
        Ok(list.transfers)
    }

    async fn transfer(&self, torrent_id: &str) -> Result<PmTransfer, DebridError> {
        self.transfers()
            .await?
            .into_iter()
            .find(|t| t.id == torrent_id)
            .ok_or_else(|| DebridError::TorrentNotFound(torrent_id.to_string()))
    }

    async fn direct_download(&self, src: &str) -> Result<Vec<PmContent>, DebridError> {
        let request = HttpRequest::post(self.url("/transfer/directdl"))
            .form(vec![("src".to_string(), src.to_string())]);
        let body: PmDirectDl = self.call(request).await?;
        Ok(body.content)
    }

    async fn fetch_cache(
        &self,
        chunk: Vec<String>,
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        let request = HashListEncoding::RepeatedQuery("items[]")
            .apply(HttpRequest::get(self.url("/cache/check")), &chunk);
        let body: PmCacheCheck = self.call(request).await?;

        // Response arrays are positional with the request items.
        Ok(chunk
            .into_iter()
            .enumerate()
            .map(|(i, hash)| {
                let status = if body.response.get(i).copied().unwrap_or(false) {
                    CacheStatus::Cached {
                        file_id: None,
                        file_name: body.filename.get(i).cloned().flatten(),
                        file_size: body
                            .filesize
                            .get(i)
                            .and_then(|s| s.as_ref())
                            .and_then(|s| s.parse().ok()),
                    }
                } else {
                    CacheStatus::NotCached
                };
                (hash, status)
            })
            .collect())
    }
}

fn map_message(message: &str) -> DebridError {
    let lower = message.to_lowercase();
    if lower.contains("not logged in") || lower.contains("auth") || lower.contains("api key") {
        DebridError::Unauthorized
    } else if lower.replace("premiumize", "").contains("premium") {
        DebridError::NotPremium
    } else if lower.contains("invalid") && lower.contains("hash") {
        DebridError::InvalidHash
    } else {
        DebridError::HttpError {
            code: 200,
            message: message.to_string(),
        }
    }
}

fn content_to_files(content: &[PmContent]) -> Vec<DebridFile> {
    content
        .iter()
        .enumerate()
        .map(|(i, c)| DebridFile {
            id: i.to_string(),
            path: c.path.clone(),
            size: c.size,
        })
        .collect()
}

#[async_trait]
impl DebridProvider for PremiumizeProvider {
    fn service(&self) -> DebridServiceType {
        DebridServiceType::Premiumize
    }

    async fn account_info(&self) -> Result<AccountInfo, DebridError> {
        let account: PmAccount = self.call(HttpRequest::get(self.url("/account/info"))).await?;
        let premium_expires = account
            .premium_until
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));
        Ok(AccountInfo {
            service: DebridServiceType::Premiumize,
            username: match &account.customer_id {
                serde_json::Value::String(id) => id.clone(),
                other => other.to_string(),
            },
            email: None,
            is_premium: premium_expires.map(|d| d > Utc::now()).unwrap_or(false),
            premium_expires,
        })
    }

    async fn check_cache(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        check_in_batches(DebridServiceType::Premiumize, hashes, CACHE_CHECK_LIMIT, |chunk| {
            self.fetch_cache(chunk)
        })
        .await
    }

    async fn add_magnet(&self, hash: &str) -> Result<String, DebridError> {
        let hash = normalize_infohash(hash).ok_or(DebridError::InvalidHash)?;

        let existing = self.transfers().await?;
        if let Some(transfer) = existing
            .iter()
            .find(|t| t.src.as_deref().and_then(extract_btih).as_deref() == Some(hash.as_str()))
        {
            debug!(torrent_id = %transfer.id, "Reusing existing Premiumize transfer");
            return Ok(transfer.id.clone());
        }

        let request = HttpRequest::post(self.url("/transfer/create"))
            .form(vec![("src".to_string(), magnet_uri(&hash))]);
        let created: PmCreated = self.call(request).await?;
        Ok(created.id)
    }

    async fn list_files(&self, torrent_id: &str) -> Result<Vec<DebridFile>, DebridError> {
        let transfer = self.transfer(torrent_id).await?;
        let src = transfer.src.ok_or(DebridError::FileNotReady)?;
        Ok(content_to_files(&self.direct_download(&src).await?))
    }

    fn requires_file_selection(&self) -> bool {
        false
    }

    async fn select_files(&self, _torrent_id: &str, _file_ids: &[String]) -> Result<(), DebridError> {
        Ok(())
    }

    async fn get_stream_url(&self, torrent_id: &str) -> Result<StreamInfo, DebridError> {
        let transfer = self.transfer(torrent_id).await?;
        match transfer.status.as_str() {
            "finished" | "seeding" => {}
            "error" | "deleted" | "banned" | "timeout" => {
                return Err(DebridError::TorrentNotFound(torrent_id.to_string()))
            }
            _ => return Err(DebridError::FileNotReady),
        }

        let src = transfer.src.ok_or(DebridError::FileNotReady)?;
        let content = self.direct_download(&src).await?;
        let files = content_to_files(&content);
        let main = select_main_file(&files).ok_or(DebridError::FileNotReady)?;
        let index: usize = main.id.parse().unwrap_or(0);
        let item = content.get(index).ok_or(DebridError::FileNotReady)?;

        Ok(StreamInfo::from_file(
            item.stream_link.clone().unwrap_or_else(|| item.link.clone()),
            main.file_name(),
            Some(main.size),
            DebridServiceType::Premiumize,
        ))
    }

    /// Premiumize links are already direct.
    async fn unrestrict(&self, link: &str) -> Result<String, DebridError> {
        Ok(link.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct PmStatus {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PmAccount {
    customer_id: serde_json::Value,
    #[serde(default)]
    premium_until: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PmCacheCheck {
    #[serde(default)]
    response: Vec<bool>,
    #[serde(default)]
    filename: Vec<Option<String>>,
    #[serde(default)]
    filesize: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct PmTransferList {
    #[serde(default)]
    transfers: Vec<PmTransfer>,
}

#[derive(Debug, Deserialize)]
struct PmTransfer {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    src: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PmCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PmDirectDl {
    #[serde(default)]
    content: Vec<PmContent>,
}

#[derive(Debug, Deserialize)]
struct PmContent {
    path: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: u64,
    link: String,
    #[serde(default)]
    stream_link: Option<String>,
}
