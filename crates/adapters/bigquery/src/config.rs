//! Service account credentials

use std::path::Path;

use santoku_errors::{AppError, AppResult};
use secrecy::SecretString;
use serde::Deserialize;

/// Google Cloud service account key, as downloaded from the console.
///
/// ```json
/// {
///     "type": "service_account",
///     "project_id": "<project name>",
///     "private_key_id": "<private key id>",
///     "private_key": "<private key>",
///     "client_email": "<service account email>",
///     "client_id": "<client id>",
///     "token_uri": "https://oauth2.googleapis.com/token"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    pub private_key_id: String,
    /// PEM encoded RSA private key.
    pub private_key: SecretString,
    pub client_email: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            AppError::configuration(format!("Invalid service account key: {}", e))
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::configuration(format!(
                "Failed to read service account file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }
}
