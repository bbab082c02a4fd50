//! Credential resolver

use std::fmt;
use std::sync::Arc;

use santoku_errors::{AppError, AppResult};
use tracing::debug;

use crate::payload::SecretPayload;
use crate::store::SecretStore;

/// Turns a secret identifier into credential fields. Every call fetches again.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn SecretStore>,
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    pub fn from_store<S: SecretStore + 'static>(store: S) -> Self {
        Self::new(Arc::new(store))
    }

    pub async fn resolve(&self, secret_id: &str) -> AppResult<SecretPayload> {
        debug!("Resolving credentials from secret: {}", secret_id);

        let value = self.store.fetch(secret_id).await?;
        let payload = SecretPayload::parse(&value)?;

        debug!(
            secret_id,
            keys = payload.len(),
            "Credentials resolved"
        );
        Ok(payload)
    }

    /// Resolve a single string field of a secret.
    pub async fn resolve_field(&self, secret_id: &str, field: &str) -> AppResult<String> {
        let payload = self.resolve(secret_id).await?;
        match payload.get(field) {
            Some(value) => value.as_str().map(str::to_string).ok_or_else(|| {
                AppError::malformed(format!(
                    "Field '{}' in secret '{}' is not a string.",
                    field, secret_id
                ))
            }),
            None => Err(AppError::configuration(format!(
                "Field '{}' not found in secret '{}'.",
                field, secret_id
            ))),
        }
    }
}
