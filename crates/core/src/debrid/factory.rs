//! Construction of debrid provider clients.

use std::sync::Arc;
use std::time::Duration;

use super::all_debrid::DEFAULT_ALL_DEBRID_URL;
use super::easynews::DEFAULT_EASYNEWS_URL;
use super::premiumize::DEFAULT_PREMIUMIZE_URL;
use super::real_debrid::{DEFAULT_REAL_DEBRID_OAUTH_URL, DEFAULT_REAL_DEBRID_URL};
use super::torbox::DEFAULT_TORBOX_URL;
use super::{
    AllDebridProvider, DebridError, DebridProvider, EasynewsProvider, PremiumizeProvider,
    RealDebridProvider, RealDebridRefresher, TorboxProvider,
};
use crate::config::DebridServiceType;
use crate::http::HttpTransport;

/// Builds a provider client from resolved secrets.
pub trait ProviderFactory: Send + Sync {
    /// `refresh_secret` is only honored by providers with token refresh.
    fn create(
        &self,
        service: DebridServiceType,
        token: String,
        refresh_secret: Option<String>,
    ) -> Result<Arc<dyn DebridProvider>, DebridError>;
}

/// Base URLs for every provider. Overridable for self-hosted proxies and tests.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub real_debrid: String,
    pub real_debrid_oauth: String,
    pub all_debrid: String,
    pub premiumize: String,
    pub torbox: String,
    pub easynews: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            real_debrid: DEFAULT_REAL_DEBRID_URL.to_string(),
            real_debrid_oauth: DEFAULT_REAL_DEBRID_OAUTH_URL.to_string(),
            all_debrid: DEFAULT_ALL_DEBRID_URL.to_string(),
            premiumize: DEFAULT_PREMIUMIZE_URL.to_string(),
            torbox: DEFAULT_TORBOX_URL.to_string(),
            easynews: DEFAULT_EASYNEWS_URL.to_string(),
        }
    }
}

/// Creates HTTP provider clients sharing one transport.
pub struct HttpProviderFactory {
    transport: Arc<dyn HttpTransport>,
    request_timeout: Duration,
    endpoints: ProviderEndpoints,
}

impl HttpProviderFactory {
    pub fn new(transport: Arc<dyn HttpTransport>, request_timeout: Duration) -> Self {
        Self {
            transport,
            request_timeout,
            endpoints: ProviderEndpoints::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(
        &self,
        service: DebridServiceType,
        token: String,
        refresh_secret: Option<String>,
    ) -> Result<Arc<dyn DebridProvider>, DebridError> {
        let transport = self.transport.clone();
        let timeout = self.request_timeout;
        let endpoints = &self.endpoints;

        let provider: Arc<dyn DebridProvider> = match service {
            DebridServiceType::RealDebrid => {
                let mut provider =
                    RealDebridProvider::new(token, transport, timeout, &endpoints.real_debrid);
                if let Some(secret) = refresh_secret {
                    provider = provider.with_refresher(RealDebridRefresher::from_secret(
                        &secret,
                        &endpoints.real_debrid_oauth,
                    )?);
                }
                Arc::new(provider)
            }
            DebridServiceType::AllDebrid => Arc::new(AllDebridProvider::new(
                token,
                transport,
                timeout,
                &endpoints.all_debrid,
            )),
            DebridServiceType::Premiumize => Arc::new(PremiumizeProvider::new(
                token,
                transport,
                timeout,
                &endpoints.premiumize,
            )),
            DebridServiceType::Torbox => Arc::new(TorboxProvider::new(
                token,
                transport,
                timeout,
                &endpoints.torbox,
            )),
            DebridServiceType::Easynews => Arc::new(EasynewsProvider::new(
                &token,
                transport,
                timeout,
                &endpoints.easynews,
            )?),
        };
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    #[test]
    fn test_creates_every_service() {
        let factory = HttpProviderFactory::new(Arc::new(MockTransport::new()), Duration::from_secs(5));
        for service in DebridServiceType::ALL {
            let provider = factory
                .create(service, "user:token".to_string(), None)
                .unwrap();
            assert_eq!(provider.service(), service);
        }
    }

    #[test]
    fn test_malformed_refresh_secret_rejected() {
        let factory = HttpProviderFactory::new(Arc::new(MockTransport::new()), Duration::from_secs(5));
        assert!(factory
            .create(DebridServiceType::RealDebrid, "t".to_string(), Some("bad".to_string()))
            .is_err());
    }
}
