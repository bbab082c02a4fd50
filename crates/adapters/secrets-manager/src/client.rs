//! Secrets Manager client implementation

use async_trait::async_trait;
use aws_sdk_secretsmanager::Client;
use santoku_config::AwsConfig;
use santoku_credentials::{SecretPayload, SecretStore, SecretValue};
use santoku_errors::{AppError, AppResult};
use tracing::{debug, info};

use crate::error::map_secrets_manager_error;

/// Secrets Manager handler
#[derive(Debug, Clone)]
pub struct SecretsManagerHandler {
    client: Client,
}

impl SecretsManagerHandler {
    /// Create a handler from the shared AWS configuration
    pub async fn new(config: &AwsConfig) -> Self {
        let sdk_config = santoku_common::load_sdk_config(config).await;
        info!("Secrets Manager handler created");
        Self::from_client(Client::new(&sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Get the stored value of a secret, text or binary
    pub async fn get_secret_value(&self, secret_name: &str) -> AppResult<SecretValue> {
        debug!("Reading secret: {}", secret_name);

        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_name)
            .send()
            .await
            .map_err(map_secrets_manager_error)?;

        if let Some(text) = output.secret_string() {
            return Ok(SecretValue::Text(text.to_string()));
        }
        if let Some(binary) = output.secret_binary() {
            return Ok(SecretValue::Binary(binary.as_ref().to_vec()));
        }

        Err(AppError::malformed(format!(
            "Secret '{}' has neither a string nor a binary value.",
            secret_name
        )))
    }

    /// Get a secret parsed into key/value pairs
    pub async fn get_secret_payload(&self, secret_name: &str) -> AppResult<SecretPayload> {
        let value = self.get_secret_value(secret_name).await?;
        SecretPayload::parse(&value)
    }
}

#[async_trait]
impl SecretStore for SecretsManagerHandler {
    async fn fetch(&self, secret_id: &str) -> AppResult<SecretValue> {
        self.get_secret_value(secret_id).await
    }
}
