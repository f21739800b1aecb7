use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Timeouts and poll attempts are positive
/// - Indexer names are non-empty and unique
/// - Generic indexer protocols have a base URL
/// - Debrid services carry a token reference
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.search.indexer_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "search.indexer_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.debrid.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "debrid.request_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.debrid.poll_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "debrid.poll_attempts must be at least 1".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for indexer in &config.indexers {
        if indexer.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "indexer name cannot be empty".to_string(),
            ));
        }
        if !names.insert(indexer.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate indexer name: {}",
                indexer.name
            )));
        }
        let has_url = indexer
            .base_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty());
        if indexer.indexer_type.requires_base_url() && !has_url {
            return Err(ConfigError::ValidationError(format!(
                "indexer {} ({}) requires base_url",
                indexer.name,
                indexer.indexer_type.as_str()
            )));
        }
    }

    for service in &config.debrid_services {
        if service.api_token_ref.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "debrid service {} has an empty api_token_ref",
                service.service_type
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DebridConfig, DebridServiceType, IndexerConfig, IndexerType};

    fn indexer(name: &str, indexer_type: IndexerType, base_url: Option<&str>) -> IndexerConfig {
        IndexerConfig {
            name: name.to_string(),
            indexer_type,
            base_url: base_url.map(String::from),
            api_key_ref: None,
            is_active: true,
            priority: 0,
        }
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_poll_attempts_fails() {
        let mut config = Config::default();
        config.debrid.poll_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_torznab_without_url_fails() {
        let config = Config {
            indexers: vec![indexer("jackett", IndexerType::Torznab, None)],
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("requires base_url"));
    }

    #[test]
    fn test_validate_yts_without_url_ok() {
        let config = Config {
            indexers: vec![indexer("yts", IndexerType::Yts, None)],
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_duplicate_indexer_names_fails() {
        let config = Config {
            indexers: vec![
                indexer("yts", IndexerType::Yts, None),
                indexer("yts", IndexerType::Yts, None),
            ],
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_validate_empty_token_ref_fails() {
        let config = Config {
            debrid_services: vec![DebridConfig {
                service_type: DebridServiceType::AllDebrid,
                api_token_ref: "  ".to_string(),
                refresh_token_ref: None,
                is_active: true,
                priority: 0,
            }],
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
