use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub debrid: DebridSettings,
    /// Torrent indexers, tried concurrently on every search.
    #[serde(default)]
    pub indexers: Vec<IndexerConfig>,
    /// Debrid services, tried in priority order on stream resolution.
    #[serde(default)]
    pub debrid_services: Vec<DebridConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Indexer fan-out settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchSettings {
    /// Upper bound for a single indexer request, in seconds (default: 15).
    #[serde(default = "default_indexer_timeout")]
    pub indexer_timeout_secs: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            indexer_timeout_secs: default_indexer_timeout(),
        }
    }
}

impl SearchSettings {
    pub fn indexer_timeout(&self) -> Duration {
        Duration::from_secs(self.indexer_timeout_secs as u64)
    }
}

fn default_indexer_timeout() -> u32 {
    15
}

/// Debrid resolution settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridSettings {
    /// Upper bound for a single provider request, in seconds (default: 30).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u32,
    /// How many times a not-yet-ready stream link is queried (default: 5).
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    /// Delay between stream link queries in milliseconds (default: 2000).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for DebridSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            poll_attempts: default_poll_attempts(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl DebridSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs as u64)
    }
}

fn default_request_timeout() -> u32 {
    30
}

fn default_poll_attempts() -> u32 {
    5
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_active() -> bool {
    true
}

/// Supported indexer protocols.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IndexerType {
    /// Generic Torznab feed (Jackett, Prowlarr proxies, ...). Needs `base_url`.
    Torznab,
    /// Prowlarr native search API. Needs `base_url`.
    Prowlarr,
    Yts,
    Eztv,
    Apibay,
}

impl IndexerType {
    /// Whether this protocol has no well-known endpoint and must be configured.
    pub fn requires_base_url(&self) -> bool {
        matches!(self, IndexerType::Torznab | IndexerType::Prowlarr)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexerType::Torznab => "torznab",
            IndexerType::Prowlarr => "prowlarr",
            IndexerType::Yts => "yts",
            IndexerType::Eztv => "eztv",
            IndexerType::Apibay => "apibay",
        }
    }
}

/// A configured torrent indexer.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Display name, also used as `TorrentResult::indexer_name`.
    pub name: String,
    pub indexer_type: IndexerType,
    /// Base URL override; required for generic protocols.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Opaque reference resolved through the secret store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_ref: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Lower is tried first.
    #[serde(default)]
    pub priority: i32,
}

/// Supported debrid services.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DebridServiceType {
    RealDebrid,
    AllDebrid,
    Premiumize,
    Torbox,
    Easynews,
}

impl DebridServiceType {
    pub const ALL: [DebridServiceType; 5] = [
        DebridServiceType::RealDebrid,
        DebridServiceType::AllDebrid,
        DebridServiceType::Premiumize,
        DebridServiceType::Torbox,
        DebridServiceType::Easynews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DebridServiceType::RealDebrid => "real_debrid",
            DebridServiceType::AllDebrid => "all_debrid",
            DebridServiceType::Premiumize => "premiumize",
            DebridServiceType::Torbox => "torbox",
            DebridServiceType::Easynews => "easynews",
        }
    }

    /// Parse the snake_case identifier used in configs and URLs.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for DebridServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured debrid account.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DebridConfig {
    pub service_type: DebridServiceType,
    /// Opaque reference to the API token; never the token itself.
    pub api_token_ref: String,
    /// Optional reference to OAuth refresh credentials
    /// (`client_id:client_secret:refresh_token`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_ref: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Lower is tried first.
    #[serde(default)]
    pub priority: i32,
}

/// Sanitized config for API responses (secret references hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub search: SearchSettings,
    pub debrid: DebridSettings,
    pub indexers: Vec<SanitizedIndexerConfig>,
    pub debrid_services: Vec<SanitizedDebridConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIndexerConfig {
    pub name: String,
    pub indexer_type: IndexerType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub api_key_configured: bool,
    pub is_active: bool,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDebridConfig {
    pub service_type: DebridServiceType,
    pub refresh_configured: bool,
    pub is_active: bool,
    pub priority: i32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            search: config.search.clone(),
            debrid: config.debrid.clone(),
            indexers: config
                .indexers
                .iter()
                .map(|i| SanitizedIndexerConfig {
                    name: i.name.clone(),
                    indexer_type: i.indexer_type,
                    base_url: i.base_url.clone(),
                    api_key_configured: i.api_key_ref.is_some(),
                    is_active: i.is_active,
                    priority: i.priority,
                })
                .collect(),
            debrid_services: config
                .debrid_services
                .iter()
                .map(|d| SanitizedDebridConfig {
                    service_type: d.service_type,
                    refresh_configured: d.refresh_token_ref.is_some(),
                    is_active: d.is_active,
                    priority: d.priority,
                })
                .collect(),
        }
    }
}
