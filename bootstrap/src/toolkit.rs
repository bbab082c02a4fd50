//! 处理器装配

use std::sync::Arc;

use santoku_adapter_bigquery::BigQueryHandler;
use santoku_adapter_firehose::FirehoseHandler;
use santoku_adapter_s3::S3Handler;
use santoku_adapter_salesforce::SalesforceHandler;
use santoku_adapter_secrets_manager::SecretsManagerHandler;
use santoku_adapter_slack::SlackBotHandler;
use santoku_adapter_sqs::SqsHandler;
use santoku_config::ToolkitConfig;
use santoku_credentials::{CredentialResolver, FromSecret};
use santoku_errors::AppResult;
use tracing::info;

/// Entry point wiring configuration, the credential resolver and the handlers together.
#[derive(Debug, Clone)]
pub struct Toolkit {
    config: ToolkitConfig,
    resolver: CredentialResolver,
}

impl Toolkit {
    /// Resolve credentials through AWS Secrets Manager.
    pub async fn new(config: ToolkitConfig) -> Self {
        let secrets_manager = SecretsManagerHandler::new(&config.aws).await;
        let resolver = CredentialResolver::new(Arc::new(secrets_manager));
        info!(app_env = %config.app_env, "Toolkit initialized");
        Self::with_resolver(config, resolver)
    }

    /// Use a custom resolver, e.g. backed by an in-memory store.
    pub fn with_resolver(config: ToolkitConfig, resolver: CredentialResolver) -> Self {
        Self { config, resolver }
    }

    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    pub async fn secrets_manager(&self) -> SecretsManagerHandler {
        SecretsManagerHandler::new(&self.config.aws).await
    }

    pub async fn s3(&self) -> S3Handler {
        S3Handler::new(&self.config.aws).await
    }

    pub async fn sqs(&self) -> SqsHandler {
        SqsHandler::new(&self.config.aws).await
    }

    pub async fn firehose(&self) -> FirehoseHandler {
        FirehoseHandler::new(&self.config.aws).await
    }

    /// Salesforce handler from a secret. Configured values fill in what the secret leaves out;
    /// a configured `auth_url` always wins.
    pub async fn salesforce(&self, secret_id: &str) -> AppResult<SalesforceHandler> {
        let payload = self.resolver.resolve(secret_id).await?;
        let mut handler = SalesforceHandler::from_payload(&payload)?;

        if !payload.contains("api_version") {
            handler = handler.with_api_version(self.config.salesforce.api_version);
        }
        if let Some(auth_url) = &self.config.salesforce.auth_url {
            handler = handler.with_auth_url(auth_url);
        }
        Ok(handler)
    }

    pub async fn slack(&self, secret_id: &str) -> AppResult<SlackBotHandler> {
        let handler = SlackBotHandler::from_secret(&self.resolver, secret_id).await?;
        Ok(handler.with_api_base_url(&self.config.slack.api_base_url))
    }

    pub async fn bigquery(&self, secret_id: &str) -> AppResult<BigQueryHandler> {
        let handler = BigQueryHandler::from_secret(&self.resolver, secret_id).await?;
        Ok(handler.with_api_base_url(&self.config.bigquery.api_base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use santoku_credentials::MemorySecretStore;
    use santoku_errors::ErrorKind;
    use serde_json::json;

    fn store() -> MemorySecretStore {
        MemorySecretStore::new()
            .with_text("slack/bot", r#"{"API_TOKEN":"xoxb-toolkit"}"#)
            .with_text(
                "crm/prod",
                json!({
                    "auth_url": "https://login.salesforce.com/services/oauth2/token",
                    "username": "etl@example.com",
                    "password": "pw",
                    "client_id": "key",
                    "client_secret": "secret"
                })
                .to_string(),
            )
            .with_text("crm/broken", r#"{"username":"etl@example.com"}"#)
    }

    #[tokio::test]
    async fn test_slack_uses_configured_api_base_url() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat.postMessage")
            .match_header("authorization", "Bearer xoxb-toolkit")
            .with_status(200)
            .with_body(r#"{"ok":true,"channel":"C1","ts":"1.0"}"#)
            .create_async()
            .await;

        let mut config = ToolkitConfig::default();
        config.slack.api_base_url = server.url();
        let toolkit = Toolkit::with_resolver(config, CredentialResolver::from_store(store()));

        let slack = toolkit.slack("slack/bot").await.unwrap();
        slack.send_message("general", "deployed").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_salesforce_configuration_overrides() {
        let mut config = ToolkitConfig::default();
        config.salesforce.api_version = 58.0;
        config.salesforce.auth_url = Some("https://test.salesforce.com/services/oauth2/token".into());
        let toolkit = Toolkit::with_resolver(config, CredentialResolver::from_store(store()));

        let handler = toolkit.salesforce("crm/prod").await.unwrap();
        assert_eq!(handler.api_version(), 58.0);
        assert_eq!(
            handler.auth_url(),
            "https://test.salesforce.com/services/oauth2/token"
        );

        let err = toolkit.salesforce("crm/broken").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = toolkit.slack("slack/missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
