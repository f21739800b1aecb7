//! Easynews (Usenet) provider.
//!
//! Usenet has no torrents: there is nothing to pre-check, add or select.
//! Streams are found through `search_streams`, and `get_stream_url` only
//! accepts the `easynews:` ids that search produces.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http::ProviderHttp;
use super::{
    AccountInfo, CacheStatus, DebridError, DebridFile, DebridProvider, StreamInfo, UsenetResult,
};
use crate::config::DebridServiceType;
use crate::http::{Credentials, HttpRequest, HttpTransport};
use crate::wire::lenient_u64;

pub const DEFAULT_EASYNEWS_URL: &str = "https://members.easynews.com";

const STREAM_ID_PREFIX: &str = "easynews:";
const SEARCH_PAGE_SIZE: &str = "50";

pub struct EasynewsProvider {
    http: ProviderHttp,
    base_url: String,
    username: String,
}

impl EasynewsProvider {
    /// `token` is `username:password`.
    pub fn new(
        token: &str,
        transport: Arc<dyn HttpTransport>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> Result<Self, DebridError> {
        let (username, password) = token
            .split_once(':')
            .filter(|(user, pass)| !user.is_empty() && !pass.is_empty())
            .ok_or(DebridError::Unauthorized)?;
        Ok(Self {
            http: ProviderHttp::new(
                DebridServiceType::Easynews,
                transport,
                Credentials::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                },
                timeout,
            ),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.to_string(),
        })
    }

    fn search_request(&self, query: &str, page_size: &str) -> HttpRequest {
        HttpRequest::get(format!("{}/2.0/search/solr-search/", self.base_url))
            .query("gps", query)
            .query("pby", page_size)
            .query("pno", "1")
            .query("sS", "3")
            .query("s1", "dsize")
            .query("s1d", "-")
            .query("fty[]", "VIDEO")
    }
}

/// `easynews:{farm}/{port}/{hash}{ext}/{name}{ext}` from one search row.
fn stream_id(farm: &str, port: &str, item: &EnSearchItem) -> String {
    format!(
        "{}{}/{}/{}{}/{}{}",
        STREAM_ID_PREFIX,
        farm,
        port,
        item.hash,
        item.extension,
        urlencoding::encode(&item.name),
        item.extension
    )
}

#[async_trait]
impl DebridProvider for EasynewsProvider {
    fn service(&self) -> DebridServiceType {
        DebridServiceType::Easynews
    }

    async fn account_info(&self) -> Result<AccountInfo, DebridError> {
        // No account endpoint; an authenticated one-row search proves the login.
        self.http.send(self.search_request("test", "1")).await?;
        Ok(AccountInfo {
            service: DebridServiceType::Easynews,
            username: self.username.clone(),
            email: None,
            is_premium: true,
            premium_expires: None,
        })
    }

    async fn check_cache(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        Ok(hashes
            .iter()
            .map(|h| (h.trim().to_lowercase(), CacheStatus::Unknown))
            .collect())
    }

    async fn add_magnet(&self, _hash: &str) -> Result<String, DebridError> {
        Err(DebridError::NotSupported(
            "Easynews is Usenet-based and cannot add magnets".to_string(),
        ))
    }

    async fn list_files(&self, _torrent_id: &str) -> Result<Vec<DebridFile>, DebridError> {
        Err(DebridError::FileNotReady)
    }

    fn requires_file_selection(&self) -> bool {
        false
    }

    async fn select_files(&self, _torrent_id: &str, _file_ids: &[String]) -> Result<(), DebridError> {
        Err(DebridError::FileNotReady)
    }

    async fn get_stream_url(&self, torrent_id: &str) -> Result<StreamInfo, DebridError> {
        let path = torrent_id
            .strip_prefix(STREAM_ID_PREFIX)
            .filter(|p| !p.is_empty())
            .ok_or(DebridError::FileNotReady)?;
        let encoded_name = path.rsplit('/').next().unwrap_or(path);
        let file_name = urlencoding::decode(encoded_name)
            .map(|name| name.into_owned())
            .unwrap_or_else(|_| encoded_name.to_string());

        Ok(StreamInfo::from_file(
            format!("{}/dl/{}", self.base_url, path),
            file_name,
            None,
            DebridServiceType::Easynews,
        ))
    }

    /// Download links need only the Basic auth header.
    async fn unrestrict(&self, link: &str) -> Result<String, DebridError> {
        Ok(link.to_string())
    }

    async fn search_streams(&self, query: &str) -> Result<Vec<UsenetResult>, DebridError> {
        let body: EnSearch = self.http.json(self.search_request(query, SEARCH_PAGE_SIZE)).await?;
        let farm = body.dl_farm.unwrap_or_else(|| "auto".to_string());
        let port = match body.dl_port {
            Some(serde_json::Value::String(port)) => port,
            Some(serde_json::Value::Number(port)) => port.to_string(),
            _ => "443".to_string(),
        };

        let results: Vec<_> = body
            .data
            .iter()
            .filter(|item| !item.hash.is_empty())
            .map(|item| UsenetResult {
                stream_id: stream_id(&farm, &port, item),
                file_name: format!("{}{}", item.name, item.extension),
                size_bytes: item.raw_size,
                service: DebridServiceType::Easynews,
            })
            .collect();

        debug!(results = results.len(), "Easynews search complete");
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct EnSearch {
    #[serde(default)]
    data: Vec<EnSearchItem>,
    #[serde(rename = "dlFarm", default)]
    dl_farm: Option<String>,
    #[serde(rename = "dlPort", default)]
    dl_port: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EnSearchItem {
    #[serde(rename = "0")]
    hash: String,
    #[serde(rename = "10")]
    name: String,
    #[serde(rename = "11", default)]
    extension: String,
    #[serde(rename = "rawSize", default, deserialize_with = "lenient_u64")]
    raw_size: u64,
}
