//! Orchestration across configured debrid services.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::{
    AccountInfo, CacheStatus, DebridError, DebridProvider, PollPolicy, ProviderFactory,
    StreamInfo, StreamResolver, UsenetResult,
};
use crate::config::{DebridConfig, DebridServiceType};
use crate::infohash::normalize_infohash;
use crate::metrics;
use crate::store::{ConfigStore, SecretStore};

/// Resolves infohashes to playable streams through the configured services.
///
/// Configs are read from the store on every call and tokens are resolved
/// through the secret store right before a client is built. Without a
/// preferred service, every active service is tried in priority order and the
/// last error is surfaced once the list is exhausted. With a preferred
/// service, only that service is tried.
pub struct DebridManager {
    store: Arc<dyn ConfigStore>,
    secrets: Arc<dyn SecretStore>,
    factory: Arc<dyn ProviderFactory>,
    poll: PollPolicy,
}

impl DebridManager {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        secrets: Arc<dyn SecretStore>,
        factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        Self {
            store,
            secrets,
            factory,
            poll: PollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub async fn resolve_stream(
        &self,
        hash: &str,
        preferred: Option<DebridServiceType>,
    ) -> Result<StreamInfo, DebridError> {
        let hash = normalize_infohash(hash).ok_or(DebridError::InvalidHash)?;

        if let Some(service) = preferred {
            let config = self.config_for(service).await?;
            return self.resolve_with(&config, &hash).await;
        }

        let configs = self.active_configs().await?;
        if configs.is_empty() {
            return Err(DebridError::NotConfigured(
                "no active debrid services".to_string(),
            ));
        }

        let mut last_error = None;
        for (index, config) in configs.iter().enumerate() {
            if index > 0 {
                metrics::DEBRID_FALLBACKS.inc();
                debug!(service = %config.service_type, "Falling back to next debrid service");
            }
            match self.resolve_with(config, &hash).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    warn!(service = %config.service_type, error = %e, "Resolution failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DebridError::NotConfigured("no active debrid services".to_string())
        }))
    }

    /// Cache status for `hashes` on one service.
    pub async fn check_cache(
        &self,
        service: DebridServiceType,
        hashes: &[String],
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        let config = self.config_for(service).await?;
        let provider = self.provider_for(&config).await?;
        provider.check_cache(hashes).await
    }

    /// Cache status on every active service. Failing services are omitted.
    pub async fn check_cache_all(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<DebridServiceType, HashMap<String, CacheStatus>>, DebridError> {
        let configs = self.active_configs().await?;

        let checks = configs.iter().map(|config| async move {
            let provider = self.provider_for(config).await?;
            let statuses = provider.check_cache(hashes).await?;
            Ok::<_, DebridError>((config.service_type, statuses))
        });

        let mut merged = HashMap::new();
        for (config, outcome) in configs.iter().zip(join_all(checks).await) {
            match outcome {
                Ok((service, statuses)) => {
                    merged.insert(service, statuses);
                }
                Err(e) => {
                    warn!(service = %config.service_type, error = %e, "Cache check failed");
                }
            }
        }
        Ok(merged)
    }

    /// Whether the configured token for `service` is accepted.
    pub async fn validate(&self, service: DebridServiceType) -> Result<bool, DebridError> {
        let config = self.config_for(service).await?;
        let provider = self.provider_for(&config).await?;
        provider.validate_token().await
    }

    pub async fn account_info(
        &self,
        service: DebridServiceType,
    ) -> Result<AccountInfo, DebridError> {
        let config = self.config_for(service).await?;
        let provider = self.provider_for(&config).await?;
        provider.account_info().await
    }

    /// Search every active service that has native search (Usenet providers).
    ///
    /// Services run concurrently and fail on their own. Results from every
    /// service that answered are merged in priority order; when none did, the
    /// last failure is returned.
    pub async fn search_usenet(&self, query: &str) -> Result<Vec<UsenetResult>, DebridError> {
        let configs = self.active_configs().await?;

        let searches = configs.iter().map(|config| async move {
            let provider = self.provider_for(config).await?;
            provider.search_streams(query).await
        });

        let mut results = Vec::new();
        let mut answered = false;
        let mut last_error = None;
        for (config, outcome) in configs.iter().zip(join_all(searches).await) {
            match outcome {
                Ok(found) => {
                    answered = true;
                    results.extend(found);
                }
                Err(DebridError::NotSupported(_)) => {}
                Err(e) => {
                    warn!(service = %config.service_type, error = %e, "Usenet search failed");
                    last_error = Some(e);
                }
            }
        }

        if answered {
            return Ok(results);
        }
        Err(last_error.unwrap_or_else(|| {
            DebridError::NotConfigured("no active service supports search".to_string())
        }))
    }

    /// Turn a stream id from `search_usenet` into a playable stream.
    pub async fn resolve_search_result(
        &self,
        service: DebridServiceType,
        stream_id: &str,
    ) -> Result<StreamInfo, DebridError> {
        let config = self.config_for(service).await?;
        let provider = self.provider_for(&config).await?;
        let mut stream = provider.get_stream_url(stream_id).await?;
        stream.url = provider.unrestrict(&stream.url).await?;
        Ok(stream)
    }

    async fn resolve_with(
        &self,
        config: &DebridConfig,
        hash: &str,
    ) -> Result<StreamInfo, DebridError> {
        let service = config.service_type;
        let start = Instant::now();

        let outcome = match self.provider_for(config).await {
            Ok(provider) => StreamResolver::new(provider.as_ref(), self.poll).resolve(hash).await,
            Err(e) => Err(e),
        };

        let label = if outcome.is_ok() { "success" } else { "failure" };
        metrics::DEBRID_RESOLUTIONS
            .with_label_values(&[service.as_str(), label])
            .inc();
        metrics::DEBRID_RESOLUTION_DURATION
            .with_label_values(&[service.as_str()])
            .observe(start.elapsed().as_secs_f64());

        if outcome.is_ok() {
            info!(service = %service, hash = %hash, "Resolved stream");
        }
        outcome
    }

    async fn provider_for(
        &self,
        config: &DebridConfig,
    ) -> Result<Arc<dyn DebridProvider>, DebridError> {
        let token = self
            .secrets
            .resolve(&config.api_token_ref)
            .await
            .map_err(|e| {
                warn!(service = %config.service_type, error = %e, "Token resolution failed");
                DebridError::Unauthorized
            })?;

        let refresh_secret = match &config.refresh_token_ref {
            Some(reference) => match self.secrets.resolve(reference).await {
                Ok(secret) => Some(secret),
                Err(e) => {
                    warn!(service = %config.service_type, error = %e, "Refresh token unavailable");
                    None
                }
            },
            None => None,
        };

        self.factory.create(config.service_type, token, refresh_secret)
    }

    async fn active_configs(&self) -> Result<Vec<DebridConfig>, DebridError> {
        self.store
            .active_debrid_configs()
            .await
            .map_err(|e| DebridError::NotConfigured(e.to_string()))
    }

    async fn config_for(&self, service: DebridServiceType) -> Result<DebridConfig, DebridError> {
        self.active_configs()
            .await?
            .into_iter()
            .find(|c| c.service_type == service)
            .ok_or_else(|| DebridError::NotConfigured(service.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::testing::{fixtures, MockConfigStore, MockDebridProvider, MockProviderFactory, MockSecretStore};

    async fn manager(
        providers: Vec<MockDebridProvider>,
    ) -> (DebridManager, Arc<MockProviderFactory>) {
        let store = Arc::new(MockConfigStore::new());
        let secrets = Arc::new(MockSecretStore::new());
        let factory = Arc::new(MockProviderFactory::new());

        let mut configs = Vec::new();
        for (priority, provider) in providers.into_iter().enumerate() {
            let service = provider.service();
            let reference = format!("{}-token", service);
            secrets.insert(&reference, "secret-token").await;
            configs.push(fixtures::debrid_config(service, &reference, priority as i32));
            factory.register(provider);
        }
        store.set_debrid(configs).await;

        let manager = DebridManager::new(store, secrets, factory.clone()).with_poll_policy(
            PollPolicy {
                attempts: 2,
                interval: Duration::from_millis(1),
            },
        );
        (manager, factory)
    }

    #[tokio::test]
    async fn test_invalid_hash_touches_no_provider() {
        let rd = MockDebridProvider::new(DebridServiceType::RealDebrid);
        let (manager, factory) = manager(vec![rd.clone()]).await;

        let err = manager.resolve_stream("not-a-hash", None).await.unwrap_err();

        assert_eq!(err, DebridError::InvalidHash);
        assert!(rd.calls().await.is_empty());
        assert_eq!(factory.created().len(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_service() {
        let rd = MockDebridProvider::new(DebridServiceType::RealDebrid);
        rd.fail_on("add_magnet", DebridError::NotPremium).await;
        let ad = MockDebridProvider::new(DebridServiceType::AllDebrid);
        let (manager, _) = manager(vec![rd.clone(), ad.clone()]).await;

        let stream = manager.resolve_stream(fixtures::HASH_A, None).await.unwrap();

        assert_eq!(stream.debrid_service, DebridServiceType::AllDebrid);
        assert_eq!(rd.calls().await, vec!["add_magnet"]);
        assert_eq!(ad.calls().await.first().map(String::as_str), Some("add_magnet"));
    }

    #[tokio::test]
    async fn test_surfaces_last_error_when_exhausted() {
        let rd = MockDebridProvider::new(DebridServiceType::RealDebrid);
        rd.fail_on("add_magnet", DebridError::Unauthorized).await;
        let tb = MockDebridProvider::new(DebridServiceType::Torbox);
        tb.fail_on("get_stream_url", DebridError::TorrentNotFound("42".into())).await;
        let (manager, _) = manager(vec![rd, tb]).await;

        let err = manager.resolve_stream(fixtures::HASH_A, None).await.unwrap_err();

        assert_eq!(err, DebridError::TorrentNotFound("42".into()));
    }

    #[tokio::test]
    async fn test_preferred_service_does_not_fall_back() {
        let rd = MockDebridProvider::new(DebridServiceType::RealDebrid);
        let ad = MockDebridProvider::new(DebridServiceType::AllDebrid);
        ad.fail_on("add_magnet", DebridError::RateLimited).await;
        let (manager, _) = manager(vec![rd.clone(), ad.clone()]).await;

        let err = manager
            .resolve_stream(fixtures::HASH_A, Some(DebridServiceType::AllDebrid))
            .await
            .unwrap_err();

        assert_eq!(err, DebridError::RateLimited);
        assert!(rd.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_preferred_service_not_configured() {
        let rd = MockDebridProvider::new(DebridServiceType::RealDebrid);
        let (manager, _) = manager(vec![rd]).await;

        let err = manager
            .resolve_stream(fixtures::HASH_A, Some(DebridServiceType::Premiumize))
            .await
            .unwrap_err();

        assert!(matches!(err, DebridError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_no_services_configured() {
        let (manager, _) = manager(vec![]).await;
        let err = manager.resolve_stream(fixtures::HASH_A, None).await.unwrap_err();
        assert!(matches!(err, DebridError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_missing_secret_is_unauthorized() {
        let store = Arc::new(MockConfigStore::new());
        store
            .set_debrid(vec![fixtures::debrid_config(
                DebridServiceType::RealDebrid,
                "missing",
                0,
            )])
            .await;
        let factory = Arc::new(MockProviderFactory::new());
        factory.register(MockDebridProvider::new(DebridServiceType::RealDebrid));
        let manager = DebridManager::new(store, Arc::new(MockSecretStore::new()), factory.clone());

        let err = manager.resolve_stream(fixtures::HASH_A, None).await.unwrap_err();

        assert_eq!(err, DebridError::Unauthorized);
        assert!(factory.created().is_empty());
    }

    #[tokio::test]
    async fn test_factory_receives_resolved_token() {
        let rd = MockDebridProvider::new(DebridServiceType::RealDebrid);
        let (manager, factory) = manager(vec![rd]).await;

        manager.resolve_stream(fixtures::HASH_A, None).await.unwrap();

        assert_eq!(
            factory.created(),
            vec![(DebridServiceType::RealDebrid, "secret-token".to_string())]
        );
    }

    #[tokio::test]
    async fn test_check_cache_all_omits_failures() {
        let rd = MockDebridProvider::new(DebridServiceType::RealDebrid);
        rd.fail_on("check_cache", DebridError::Timeout).await;
        let pm = MockDebridProvider::new(DebridServiceType::Premiumize);
        let (manager, _) = manager(vec![rd, pm]).await;

        let all = manager
            .check_cache_all(&[fixtures::HASH_A.to_string()])
            .await
            .unwrap();

        assert_eq!(all.len(), 1);
        assert!(all.contains_key(&DebridServiceType::Premiumize));
    }

    #[tokio::test]
    async fn test_search_usenet_requires_capable_service() {
        let rd = MockDebridProvider::new(DebridServiceType::RealDebrid);
        let (manager, _) = manager(vec![rd]).await;

        let err = manager.search_usenet("dune").await.unwrap_err();
        assert!(matches!(err, DebridError::NotConfigured(_)));
    }

    fn usenet_hit(name: &str) -> UsenetResult {
        UsenetResult {
            stream_id: format!("{}-id", name),
            file_name: name.to_string(),
            size_bytes: 1_000_000,
            service: DebridServiceType::Easynews,
        }
    }

    #[tokio::test]
    async fn test_search_usenet_skips_service_without_token() {
        let store = Arc::new(MockConfigStore::new());
        let secrets = Arc::new(MockSecretStore::new());
        secrets.insert("easynews-token", "user:pass").await;
        store
            .set_debrid(vec![
                fixtures::debrid_config(DebridServiceType::RealDebrid, "missing", 0),
                fixtures::debrid_config(DebridServiceType::Easynews, "easynews-token", 1),
            ])
            .await;
        let factory = Arc::new(MockProviderFactory::new());
        factory.register(MockDebridProvider::new(DebridServiceType::RealDebrid));
        factory.register(
            MockDebridProvider::new(DebridServiceType::Easynews)
                .with_search_results(vec![usenet_hit("Dune.2021.1080p.mkv")]),
        );
        let manager = DebridManager::new(store, secrets, factory);

        let results = manager.search_usenet("dune").await.unwrap();

        assert_eq!(results, vec![usenet_hit("Dune.2021.1080p.mkv")]);
    }

    #[tokio::test]
    async fn test_search_usenet_surfaces_error_when_every_search_fails() {
        let en = MockDebridProvider::new(DebridServiceType::Easynews)
            .with_search_results(vec![usenet_hit("unused")]);
        en.fail_on("search_streams", DebridError::RateLimited).await;
        let rd = MockDebridProvider::new(DebridServiceType::RealDebrid);
        let (manager, _) = manager(vec![rd, en]).await;

        let err = manager.search_usenet("dune").await.unwrap_err();

        assert_eq!(err, DebridError::RateLimited);
    }

    #[tokio::test]
    async fn test_search_usenet_keeps_results_when_one_search_fails() {
        let en = MockDebridProvider::new(DebridServiceType::Easynews)
            .with_search_results(vec![usenet_hit("Dune.2021.2160p.mkv")]);
        let pm = MockDebridProvider::new(DebridServiceType::Premiumize)
            .with_search_results(Vec::new());
        pm.fail_on("search_streams", DebridError::Timeout).await;
        let (manager, _) = manager(vec![pm, en.clone()]).await;

        let results = manager.search_usenet("dune").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(en.calls().await, vec!["search_streams"]);
    }
}
