//! Mock debrid provider and provider factory for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::RwLock;

use crate::config::DebridServiceType;
use crate::debrid::{
    AccountInfo, CacheStatus, DebridError, DebridFile, DebridProvider, ProviderFactory,
    StreamInfo, UsenetResult,
};

/// Mock implementation of the DebridProvider trait.
///
/// Every step succeeds by default and each call is recorded by name, so tests
/// can assert the exact workflow order. Clones share recorded state.
///
/// # Example
///
/// ```rust,ignore
/// let provider = MockDebridProvider::new(DebridServiceType::RealDebrid)
///     .with_file_selection(true)
///     .with_not_ready_polls(2);
/// provider.fail_on("unrestrict", DebridError::RateLimited).await;
///
/// let err = StreamResolver::new(&provider, PollPolicy::default())
///     .resolve(hash)
///     .await
///     .unwrap_err();
///
/// assert_eq!(provider.calls().await.last().unwrap(), "unrestrict");
/// ```
#[derive(Clone)]
pub struct MockDebridProvider {
    service: DebridServiceType,
    file_selection: bool,
    files: Vec<DebridFile>,
    /// `None` means the service has no native search.
    search_results: Option<Vec<UsenetResult>>,
    /// `get_stream_url` answers `FileNotReady` this many times first.
    not_ready_polls: Arc<AtomicU32>,
    failures: Arc<RwLock<HashMap<String, DebridError>>>,
    calls: Arc<RwLock<Vec<String>>>,
    selected: Arc<RwLock<Vec<Vec<String>>>>,
}

impl MockDebridProvider {
    pub fn new(service: DebridServiceType) -> Self {
        Self {
            service,
            file_selection: false,
            files: Vec::new(),
            search_results: None,
            not_ready_polls: Arc::new(AtomicU32::new(0)),
            failures: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            selected: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_file_selection(mut self, required: bool) -> Self {
        self.file_selection = required;
        self
    }

    pub fn with_files(mut self, files: Vec<DebridFile>) -> Self {
        self.files = files;
        self
    }

    /// Give the service native search answering with `results`.
    pub fn with_search_results(mut self, results: Vec<UsenetResult>) -> Self {
        self.search_results = Some(results);
        self
    }

    pub fn with_not_ready_polls(self, polls: u32) -> Self {
        self.not_ready_polls.store(polls, Ordering::SeqCst);
        self
    }

    /// Make the named operation fail with `error` from now on.
    pub async fn fail_on(&self, operation: &str, error: DebridError) {
        self.failures
            .write()
            .await
            .insert(operation.to_string(), error);
    }

    /// Operation names in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    /// File id lists passed to `select_files`.
    pub async fn selected_files(&self) -> Vec<Vec<String>> {
        self.selected.read().await.clone()
    }

    async fn record(&self, operation: &str) -> Result<(), DebridError> {
        self.calls.write().await.push(operation.to_string());
        match self.failures.read().await.get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DebridProvider for MockDebridProvider {
    fn service(&self) -> DebridServiceType {
        self.service
    }

    async fn account_info(&self) -> Result<AccountInfo, DebridError> {
        self.record("account_info").await?;
        Ok(AccountInfo {
            service: self.service,
            username: "mock-user".to_string(),
            email: None,
            is_premium: true,
            premium_expires: None,
        })
    }

    async fn check_cache(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, CacheStatus>, DebridError> {
        if hashes.is_empty() {
            return Ok(HashMap::new());
        }
        self.record("check_cache").await?;
        Ok(hashes
            .iter()
            .map(|h| (h.to_lowercase(), CacheStatus::cached()))
            .collect())
    }

    async fn add_magnet(&self, hash: &str) -> Result<String, DebridError> {
        self.record("add_magnet").await?;
        Ok(format!("mock-{}", hash.chars().take(8).collect::<String>()))
    }

    async fn list_files(&self, _torrent_id: &str) -> Result<Vec<DebridFile>, DebridError> {
        self.record("list_files").await?;
        Ok(self.files.clone())
    }

    fn requires_file_selection(&self) -> bool {
        self.file_selection
    }

    async fn select_files(&self, _torrent_id: &str, file_ids: &[String]) -> Result<(), DebridError> {
        self.record("select_files").await?;
        self.selected.write().await.push(file_ids.to_vec());
        Ok(())
    }

    async fn get_stream_url(&self, torrent_id: &str) -> Result<StreamInfo, DebridError> {
        self.record("get_stream_url").await?;
        let pending = self.not_ready_polls.load(Ordering::SeqCst);
        if pending > 0 {
            self.not_ready_polls.store(pending - 1, Ordering::SeqCst);
            return Err(DebridError::FileNotReady);
        }
        Ok(StreamInfo::from_file(
            format!("https://mock.{}/d/{}", self.service, torrent_id),
            "Mock.Movie.2024.1080p.WEB-DL.x264.mkv",
            Some(2_000_000_000),
            self.service,
        ))
    }

    async fn unrestrict(&self, link: &str) -> Result<String, DebridError> {
        self.record("unrestrict").await?;
        Ok(format!("{}?cdn=1", link))
    }

    async fn search_streams(&self, _query: &str) -> Result<Vec<UsenetResult>, DebridError> {
        let Some(results) = &self.search_results else {
            return Err(DebridError::NotSupported(format!(
                "{} has no native search",
                self.service
            )));
        };
        self.record("search_streams").await?;
        Ok(results.clone())
    }
}

/// Hands out registered mock providers by service.
#[derive(Default)]
pub struct MockProviderFactory {
    providers: Mutex<HashMap<DebridServiceType, MockDebridProvider>>,
    created: Mutex<Vec<(DebridServiceType, String)>>,
}

impl MockProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, provider: MockDebridProvider) {
        lock(&self.providers).insert(provider.service, provider);
    }

    /// `(service, token)` for every client built.
    pub fn created(&self) -> Vec<(DebridServiceType, String)> {
        lock(&self.created).clone()
    }
}

impl ProviderFactory for MockProviderFactory {
    fn create(
        &self,
        service: DebridServiceType,
        token: String,
        _refresh_secret: Option<String>,
    ) -> Result<Arc<dyn DebridProvider>, DebridError> {
        let provider = lock(&self.providers)
            .get(&service)
            .cloned()
            .ok_or_else(|| DebridError::NotConfigured(service.to_string()))?;
        lock(&self.created).push((service, token));
        Ok(Arc::new(provider))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
