pub mod classifier;
pub mod config;
pub mod debrid;
pub mod http;
pub mod infohash;
pub mod metrics;
pub mod searcher;
pub mod store;
pub mod testing;
mod wire;

pub use classifier::{classify, ReleaseTags};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DebridConfig,
    DebridServiceType, IndexerConfig, IndexerType, SanitizedConfig,
};
pub use debrid::{
    CacheStatus, DebridError, DebridManager, DebridProvider, HttpProviderFactory, StreamInfo,
};
pub use http::{HttpTransport, ReqwestTransport};
pub use searcher::{
    HttpIndexerFactory, IndexerAggregator, MediaType, SearchError, TorrentResult,
};
pub use store::{ConfigStore, EnvSecretStore, SecretStore, StaticConfigStore};
