//! Mock indexer backend and factory for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::IndexerConfig;
use crate::searcher::{IndexerBackend, IndexerFactory, MediaType, RawTorrentResult, SearchError};

/// Mock implementation of the IndexerBackend trait.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the factory hands out another.
///
/// # Example
///
/// ```rust,ignore
/// let slow = MockIndexer::new("slow").with_delay(Duration::from_secs(60));
/// let broken = MockIndexer::new("broken")
///     .failing_with(SearchError::ApiError("HTTP 500".into()));
/// let good = MockIndexer::new("good").with_results(vec![raw_result]);
///
/// let factory = MockIndexerFactory::new();
/// factory.register(slow);
/// factory.register(broken);
/// factory.register(good.clone());
///
/// // ... run the aggregator ...
///
/// assert_eq!(good.searches().await, vec!["dune"]);
/// ```
#[derive(Clone)]
pub struct MockIndexer {
    name: String,
    results: Vec<RawTorrentResult>,
    error: Option<SearchError>,
    delay: Option<Duration>,
    /// Recorded search queries.
    searches: Arc<RwLock<Vec<String>>>,
    /// Searches started and not yet finished or dropped.
    in_flight: Arc<AtomicUsize>,
}

/// Counts a search as in flight until its future completes or is dropped.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockIndexer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            results: Vec::new(),
            error: None,
            delay: None,
            searches: Arc::new(RwLock::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_results(mut self, results: Vec<RawTorrentResult>) -> Self {
        self.results = results;
        self
    }

    /// Every search fails with `error`.
    pub fn failing_with(mut self, error: SearchError) -> Self {
        self.error = Some(error);
        self
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queries seen so far.
    pub async fn searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    /// Searches currently running on any clone of this indexer.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexerBackend for MockIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        _media_type: MediaType,
    ) -> Result<Vec<RawTorrentResult>, SearchError> {
        let _guard = InFlightGuard::enter(&self.in_flight);
        self.searches.write().await.push(query.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        Ok(self.results.clone())
    }
}

/// Hands out registered mock indexers by config name.
#[derive(Default)]
pub struct MockIndexerFactory {
    indexers: Mutex<HashMap<String, MockIndexer>>,
    api_keys: Mutex<Vec<(String, Option<String>)>>,
}

impl MockIndexerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, indexer: MockIndexer) {
        lock(&self.indexers).insert(indexer.name.clone(), indexer);
    }

    /// `(indexer name, api key)` for every backend created.
    pub fn api_keys(&self) -> Vec<(String, Option<String>)> {
        lock(&self.api_keys).clone()
    }
}

impl IndexerFactory for MockIndexerFactory {
    fn create(
        &self,
        config: &IndexerConfig,
        api_key: Option<String>,
    ) -> Result<Box<dyn IndexerBackend>, SearchError> {
        lock(&self.api_keys).push((config.name.clone(), api_key));
        lock(&self.indexers)
            .get(&config.name)
            .cloned()
            .map(|indexer| Box::new(indexer) as Box<dyn IndexerBackend>)
            .ok_or_else(|| SearchError::Misconfigured(format!("no mock for {}", config.name)))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
