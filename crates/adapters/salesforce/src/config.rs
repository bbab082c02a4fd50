//! Salesforce credentials

use secrecy::SecretString;
use serde::Deserialize;

/// Connected-app credentials for the OAuth username/password flow.
#[derive(Debug, Clone, Deserialize)]
pub struct SalesforceCredentials {
    /// Token endpoint, e.g. `https://login.salesforce.com/services/oauth2/token`.
    pub auth_url: String,
    pub username: String,
    pub password: SecretString,
    /// Consumer key of the connected app.
    pub client_id: String,
    /// Consumer secret of the connected app.
    pub client_secret: SecretString,
    #[serde(default = "default_api_version")]
    pub api_version: f64,
    #[serde(default = "default_grant_type")]
    pub grant_type: String,
}

pub(crate) fn default_api_version() -> f64 {
    47.0
}

fn default_grant_type() -> String {
    "password".to_string()
}

impl SalesforceCredentials {
    pub fn new(
        auth_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            username: username.into(),
            password: SecretString::new(password.into()),
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            api_version: default_api_version(),
            grant_type: default_grant_type(),
        }
    }
}
