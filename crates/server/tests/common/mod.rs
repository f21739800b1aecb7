//! Common test utilities for router testing with mocks.
//!
//! Builds an in-process router over mock stores, indexers and debrid
//! providers, so every route can be exercised without a network.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use streamrelay_core::debrid::PollPolicy;
use streamrelay_core::testing::{
    MockConfigStore, MockDebridProvider, MockIndexer, MockIndexerFactory, MockProviderFactory,
    MockSecretStore,
};
use streamrelay_core::{
    Config, DebridManager, DebridServiceType, IndexerAggregator, IndexerType,
};
use streamrelay_server::api::create_router;
use streamrelay_server::state::AppState;

/// Re-export fixtures for test convenience
pub use streamrelay_core::testing::fixtures;

/// Test fixture with fully controllable mocks.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_resolve() {
///     let fixture = TestFixture::new().await;
///     fixture.add_provider(MockDebridProvider::new(DebridServiceType::Torbox)).await;
///
///     let response = fixture.post("/api/v1/resolve", json!({ "hash": fixtures::HASH_A })).await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    pub store: Arc<MockConfigStore>,
    pub secrets: Arc<MockSecretStore>,
    pub indexers: Arc<MockIndexerFactory>,
    pub providers: Arc<MockProviderFactory>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// `config` is only reported by `/config`; providers come from the mocks.
    pub async fn with_config(config: Config) -> Self {
        let store = Arc::new(MockConfigStore::new());
        let secrets = Arc::new(MockSecretStore::new());
        let indexers = Arc::new(MockIndexerFactory::new());
        let providers = Arc::new(MockProviderFactory::new());

        let aggregator = IndexerAggregator::new(store.clone(), secrets.clone(), indexers.clone())
            .with_timeout(Duration::from_secs(2));
        let debrid = DebridManager::new(store.clone(), secrets.clone(), providers.clone())
            .with_poll_policy(PollPolicy {
                attempts: 3,
                interval: Duration::from_millis(1),
            });

        let state = Arc::new(AppState::new(config, aggregator, debrid));
        let router = create_router(state);

        Self {
            router,
            store,
            secrets,
            indexers,
            providers,
        }
    }

    /// Register mock indexers as active Yts-protocol indexers, in order.
    pub async fn set_indexers(&self, mocks: Vec<MockIndexer>) {
        let mut configs = Vec::new();
        for mock in mocks {
            configs.push(fixtures::indexer_config(
                streamrelay_core::searcher::IndexerBackend::name(&mock),
                IndexerType::Yts,
            ));
            self.indexers.register(mock);
        }
        self.store.set_indexers(configs).await;
    }

    /// Register mock providers as active services, first one highest priority.
    pub async fn set_providers(&self, mocks: Vec<MockDebridProvider>) {
        let mut configs = Vec::new();
        for (priority, mock) in mocks.into_iter().enumerate() {
            let service: DebridServiceType =
                streamrelay_core::DebridProvider::service(&mock);
            let reference = format!("env:{}_TOKEN", service.as_str().to_uppercase());
            self.secrets.insert(&reference, "token").await;
            configs.push(fixtures::debrid_config(service, &reference, priority as i32));
            self.providers.register(mock);
        }
        self.store.set_debrid(configs).await;
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
