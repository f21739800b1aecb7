//! Construction of indexer backends from configuration.

use std::sync::Arc;
use std::time::Duration;

use super::apibay::DEFAULT_APIBAY_URL;
use super::eztv::DEFAULT_EZTV_URL;
use super::yts::DEFAULT_YTS_URL;
use super::{
    ApibayIndexer, EztvIndexer, IndexerBackend, ProwlarrIndexer, SearchError, TorznabIndexer,
    YtsIndexer,
};
use crate::config::{IndexerConfig, IndexerType};
use crate::http::HttpTransport;

/// Builds a backend for one indexer config and its resolved API key.
pub trait IndexerFactory: Send + Sync {
    fn create(
        &self,
        config: &IndexerConfig,
        api_key: Option<String>,
    ) -> Result<Box<dyn IndexerBackend>, SearchError>;
}

/// Creates HTTP backends sharing one transport.
pub struct HttpIndexerFactory {
    transport: Arc<dyn HttpTransport>,
    request_timeout: Duration,
}

impl HttpIndexerFactory {
    pub fn new(transport: Arc<dyn HttpTransport>, request_timeout: Duration) -> Self {
        Self {
            transport,
            request_timeout,
        }
    }
}

impl IndexerFactory for HttpIndexerFactory {
    fn create(
        &self,
        config: &IndexerConfig,
        api_key: Option<String>,
    ) -> Result<Box<dyn IndexerBackend>, SearchError> {
        let base_url = |default: &str| {
            config
                .base_url
                .clone()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let required_url = || {
            config
                .base_url
                .clone()
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| {
                    SearchError::Misconfigured(format!("{}: base_url is required", config.name))
                })
        };
        let transport = self.transport.clone();
        let timeout = self.request_timeout;

        let backend: Box<dyn IndexerBackend> = match config.indexer_type {
            IndexerType::Torznab => Box::new(TorznabIndexer::new(
                &config.name,
                required_url()?,
                api_key,
                transport,
                timeout,
            )),
            IndexerType::Prowlarr => Box::new(ProwlarrIndexer::new(
                &config.name,
                required_url()?,
                api_key,
                transport,
                timeout,
            )),
            IndexerType::Yts => Box::new(YtsIndexer::new(
                &config.name,
                base_url(DEFAULT_YTS_URL),
                transport,
                timeout,
            )),
            IndexerType::Eztv => Box::new(EztvIndexer::new(
                &config.name,
                base_url(DEFAULT_EZTV_URL),
                transport,
                timeout,
            )),
            IndexerType::Apibay => Box::new(ApibayIndexer::new(
                &config.name,
                base_url(DEFAULT_APIBAY_URL),
                transport,
                timeout,
            )),
        };
        Ok(backend)
    }
}
