//! Handler factory

use async_trait::async_trait;
use santoku_errors::AppResult;
use serde::de::DeserializeOwned;

use crate::payload::SecretPayload;
use crate::resolver::CredentialResolver;

/// Dual construction path shared by every credentialed handler.
///
/// `from_credentials` is the direct path. `from_secret` resolves a secret first and unpacks it
/// into the same `Credentials` struct, so both paths end in the same constructor.
#[async_trait]
pub trait FromSecret: Sized + Send {
    type Credentials: DeserializeOwned + Send;

    fn from_credentials(credentials: Self::Credentials) -> AppResult<Self>;

    fn from_payload(payload: &SecretPayload) -> AppResult<Self> {
        Self::from_credentials(payload.extract()?)
    }

    async fn from_secret(resolver: &CredentialResolver, secret_id: &str) -> AppResult<Self> {
        let payload = resolver.resolve(secret_id).await?;
        Self::from_payload(&payload)
    }
}
