//! Secret store port

use std::collections::HashMap;

use async_trait::async_trait;
use santoku_errors::{AppError, AppResult};

use crate::payload::SecretValue;

/// Centralized secret storage the resolver reads from.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the current value of a secret. Unknown identifiers yield `NotFound`.
    async fn fetch(&self, secret_id: &str) -> AppResult<SecretValue>;
}

/// In-memory store for tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct MemorySecretStore {
    secrets: HashMap<String, SecretValue>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, secret_id: impl Into<String>, value: SecretValue) {
        self.secrets.insert(secret_id.into(), value);
    }

    pub fn with_text(mut self, secret_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(secret_id, SecretValue::Text(text.into()));
        self
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn fetch(&self, secret_id: &str) -> AppResult<SecretValue> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Secret '{}' does not exist.", secret_id)))
    }
}
