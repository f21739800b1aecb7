//! Secret store reading from the process environment.

use async_trait::async_trait;

use super::{SecretError, SecretStore};

/// Resolves `env:NAME` references (or bare `NAME`) to environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }

    fn variable_name(reference: &str) -> Result<&str, SecretError> {
        let name = reference.strip_prefix("env:").unwrap_or(reference).trim();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(name)
        } else {
            Err(SecretError::InvalidReference(reference.to_string()))
        }
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn resolve(&self, reference: &str) -> Result<String, SecretError> {
        let name = Self::variable_name(reference)?;
        match std::env::var(name) {
            Ok(value) if !value.is_empty() => Ok(value),
            _ => Err(SecretError::NotFound(reference.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_name() {
        assert_eq!(EnvSecretStore::variable_name("env:RD_TOKEN").unwrap(), "RD_TOKEN");
        assert_eq!(EnvSecretStore::variable_name("RD_TOKEN").unwrap(), "RD_TOKEN");
        assert!(EnvSecretStore::variable_name("env:").is_err());
        assert!(EnvSecretStore::variable_name("env:BAD NAME").is_err());
    }

    #[tokio::test]
    async fn test_resolve_from_environment() {
        std::env::set_var("STREAMRELAY_TEST_SECRET_RESOLVE", "value-123");
        let store = EnvSecretStore::new();
        assert_eq!(
            store.resolve("env:STREAMRELAY_TEST_SECRET_RESOLVE").await.unwrap(),
            "value-123"
        );
    }

    #[tokio::test]
    async fn test_resolve_missing_variable() {
        let store = EnvSecretStore::new();
        let err = store
            .resolve("env:STREAMRELAY_TEST_SECRET_DEFINITELY_UNSET")
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::NotFound(_)));
    }

    #[test]
    fn test_resolve_invalid_reference() {
        let store = EnvSecretStore::new();
        let err = tokio_test::block_on(store.resolve("env:not valid")).unwrap_err();
        assert_eq!(
            err,
            SecretError::InvalidReference("env:not valid".to_string())
        );
    }
}
