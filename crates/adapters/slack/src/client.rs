//! Slack Web API client

use reqwest::Client;
use santoku_credentials::{CredentialResolver, FromSecret};
use santoku_errors::{AppError, AppResult};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{SERVICE, map_slack_error};

const SLACK_API_BASE: &str = "https://slack.com/api";

/// Secret layout for a bot token: `{"API_TOKEN": "xoxb-..."}`.
#[derive(Deserialize)]
pub struct SlackCredentials {
    #[serde(rename = "API_TOKEN")]
    pub api_token: SecretString,
}

/// Message accepted by `chat.postMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: Option<String>,
    pub ts: Option<String>,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
    channel: Option<String>,
    ts: Option<String>,
}

/// Slack bot handler
#[derive(Debug, Clone)]
pub struct SlackBotHandler {
    http: Client,
    api_token: SecretString,
    api_base_url: String,
}

impl SlackBotHandler {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_token: SecretString::new(api_token.into()),
            api_base_url: SLACK_API_BASE.to_string(),
        }
    }

    /// Point the handler at another Web API base URL.
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build from a secret whose token is stored under `secret_key` instead of `API_TOKEN`.
    pub async fn from_secret_key(
        resolver: &CredentialResolver,
        secret_id: &str,
        secret_key: &str,
    ) -> AppResult<Self> {
        let token = resolver.resolve_field(secret_id, secret_key).await?;
        Ok(Self::new(token))
    }

    /// Send `text` to `channel`. The bot must be a member of the channel with write scope.
    pub async fn send_message(&self, channel: &str, text: &str) -> AppResult<PostedMessage> {
        debug!("Posting message to channel: {}", channel);

        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.api_base_url))
            .bearer_auth(self.api_token.expose_secret())
            .json(&json!({ "channel": channel, "text": text }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::vendor(SERVICE, e))?;

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| AppError::vendor(SERVICE, e))?;

        if !body.ok {
            return Err(map_slack_error(body.error.as_deref().unwrap_or("unknown_error")));
        }

        info!(channel, "Slack message posted");
        Ok(PostedMessage {
            channel: body.channel,
            ts: body.ts,
        })
    }
}

impl FromSecret for SlackBotHandler {
    type Credentials = SlackCredentials;

    fn from_credentials(credentials: Self::Credentials) -> AppResult<Self> {
        Ok(Self::new(credentials.api_token.expose_secret().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use santoku_credentials::MemorySecretStore;
    use santoku_errors::ErrorKind;

    async fn handler_for(server: &Server) -> SlackBotHandler {
        SlackBotHandler::new("xoxb-test").with_api_base_url(server.url())
    }

    #[tokio::test]
    async fn test_send_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat.postMessage")
            .match_header("authorization", "Bearer xoxb-test")
            .match_body(Matcher::Json(
                json!({ "channel": "bi-notifications", "text": "job finished" }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"channel":"C123","ts":"1503435956.000247"}"#)
            .create_async()
            .await;

        let handler = handler_for(&server).await;
        let posted = handler
            .send_message("bi-notifications", "job finished")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(posted.channel.as_deref(), Some("C123"));
        assert_eq!(posted.ts.as_deref(), Some("1503435956.000247"));
    }

    #[tokio::test]
    async fn test_api_errors() {
        let mut server = Server::new_async().await;
        let cases = [
            ("invalid_auth", ErrorKind::Unauthenticated),
            ("channel_not_found", ErrorKind::NotFound),
            ("msg_too_long", ErrorKind::Passthrough),
        ];

        for (code, kind) in cases {
            let mock = server
                .mock("POST", "/chat.postMessage")
                .with_status(200)
                .with_body(json!({ "ok": false, "error": code }).to_string())
                .create_async()
                .await;

            let err = handler_for(&server)
                .await
                .send_message("general", "hi")
                .await
                .unwrap_err();
            assert_eq!(err.kind(), kind, "code: {}", code);
            mock.remove_async().await;
        }
    }

    #[tokio::test]
    async fn test_http_failure_passes_through() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat.postMessage")
            .with_status(500)
            .create_async()
            .await;

        let err = handler_for(&server)
            .await
            .send_message("general", "hi")
            .await
            .unwrap_err();
        assert!(err.is_passthrough());
    }

    #[tokio::test]
    async fn test_construction_from_secret() {
        let resolver = CredentialResolver::from_store(
            MemorySecretStore::new()
                .with_text("slack/bot", r#"{"API_TOKEN":"xoxb-secret","BACKUP":"xoxb-other"}"#)
                .with_text("slack/empty", r#"{}"#),
        );

        let handler = SlackBotHandler::from_secret(&resolver, "slack/bot").await.unwrap();
        assert_eq!(handler.api_token.expose_secret(), "xoxb-secret");

        let handler = SlackBotHandler::from_secret_key(&resolver, "slack/bot", "BACKUP")
            .await
            .unwrap();
        assert_eq!(handler.api_token.expose_secret(), "xoxb-other");

        let err = SlackBotHandler::from_secret(&resolver, "slack/empty").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
