//! Collaborator interfaces for configuration and secrets.
//!
//! The core never persists settings or tokens itself. Active indexer and
//! debrid configs are read fresh from a `ConfigStore` on every operation,
//! and opaque token references are resolved through a `SecretStore` right
//! before a client is constructed.

mod env_secrets;
mod static_store;

pub use env_secrets::EnvSecretStore;
pub use static_store::StaticConfigStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{DebridConfig, IndexerConfig};

/// Errors from the configuration store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the secret store. Never carries secret material.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Invalid secret reference: {0}")]
    InvalidReference(String),
}

/// Source of active, priority-ordered provider configs.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Active debrid configs, lowest priority value first.
    async fn active_debrid_configs(&self) -> Result<Vec<DebridConfig>, StoreError>;

    /// Active indexer configs, lowest priority value first.
    async fn active_indexer_configs(&self) -> Result<Vec<IndexerConfig>, StoreError>;
}

/// Maps opaque references to raw secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn resolve(&self, reference: &str) -> Result<String, SecretError>;
}
