//! In-memory config and secret stores for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::config::{DebridConfig, IndexerConfig};
use crate::store::{ConfigStore, SecretError, SecretStore, StoreError};

/// Mock implementation of the ConfigStore trait.
///
/// Returns exactly the configs that were set, in the order given.
#[derive(Default)]
pub struct MockConfigStore {
    indexers: RwLock<Vec<IndexerConfig>>,
    debrid: RwLock<Vec<DebridConfig>>,
    unavailable: RwLock<bool>,
}

impl MockConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_indexers(&self, configs: Vec<IndexerConfig>) {
        *self.indexers.write().await = configs;
    }

    pub async fn set_debrid(&self, configs: Vec<DebridConfig>) {
        *self.debrid.write().await = configs;
    }

    /// Make every read fail.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    async fn check_available(&self) -> Result<(), StoreError> {
        if *self.unavailable.read().await {
            return Err(StoreError::Unavailable("mock store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for MockConfigStore {
    async fn active_debrid_configs(&self) -> Result<Vec<DebridConfig>, StoreError> {
        self.check_available().await?;
        Ok(self.debrid.read().await.clone())
    }

    async fn active_indexer_configs(&self) -> Result<Vec<IndexerConfig>, StoreError> {
        self.check_available().await?;
        Ok(self.indexers.read().await.clone())
    }
}

/// Mock implementation of the SecretStore trait.
#[derive(Default)]
pub struct MockSecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MockSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, reference: &str, secret: &str) {
        self.secrets
            .write()
            .await
            .insert(reference.to_string(), secret.to_string());
    }
}

#[async_trait]
impl SecretStore for MockSecretStore {
    async fn resolve(&self, reference: &str) -> Result<String, SecretError> {
        self.secrets
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(reference.to_string()))
    }
}
