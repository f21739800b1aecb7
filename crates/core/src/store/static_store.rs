//! Config store backed by the loaded configuration file.

use async_trait::async_trait;

use crate::config::{Config, DebridConfig, IndexerConfig};

use super::{ConfigStore, StoreError};

/// Serves the indexers and debrid services declared in `Config`.
#[derive(Debug, Clone)]
pub struct StaticConfigStore {
    indexers: Vec<IndexerConfig>,
    debrid_services: Vec<DebridConfig>,
}

impl StaticConfigStore {
    pub fn new(indexers: Vec<IndexerConfig>, debrid_services: Vec<DebridConfig>) -> Self {
        Self {
            indexers,
            debrid_services,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.indexers.clone(), config.debrid_services.clone())
    }
}

#[async_trait]
impl ConfigStore for StaticConfigStore {
    async fn active_debrid_configs(&self) -> Result<Vec<DebridConfig>, StoreError> {
        let mut active: Vec<_> = self
            .debrid_services
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        // Stable: equal priorities keep declaration order.
        active.sort_by_key(|c| c.priority);
        Ok(active)
    }

    async fn active_indexer_configs(&self) -> Result<Vec<IndexerConfig>, StoreError> {
        let mut active: Vec<_> = self
            .indexers
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        active.sort_by_key(|c| c.priority);
        Ok(active)
    }
}
