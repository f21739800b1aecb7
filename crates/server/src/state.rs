use streamrelay_core::{Config, DebridManager, IndexerAggregator, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    aggregator: IndexerAggregator,
    debrid: DebridManager,
}

impl AppState {
    pub fn new(config: Config, aggregator: IndexerAggregator, debrid: DebridManager) -> Self {
        Self {
            config,
            aggregator,
            debrid,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn aggregator(&self) -> &IndexerAggregator {
        &self.aggregator
    }

    pub fn debrid(&self) -> &DebridManager {
        &self.debrid
    }
}
