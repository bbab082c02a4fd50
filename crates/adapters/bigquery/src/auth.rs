//! Service account authentication (OAuth 2.0 JWT bearer grant)

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use santoku_errors::{AppError, AppResult};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ServiceAccountKey;

pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Claims of the self-signed assertion exchanged for an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: SecretString,
    expires_in: i64,
}

/// OAuth access token with its expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn secret(&self) -> &str {
        self.token.expose_secret()
    }

    /// Usable for at least another minute.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Load the RSA signing key from the service account key.
pub fn signing_key(key: &ServiceAccountKey) -> AppResult<EncodingKey> {
    EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes()).map_err(|e| {
        AppError::configuration(format!("Invalid service account private key: {}", e))
    })
}

/// Sign an RS256 assertion for the BigQuery scope.
pub fn sign_assertion(
    key: &ServiceAccountKey,
    encoding_key: &EncodingKey,
    now: DateTime<Utc>,
) -> AppResult<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(key.private_key_id.clone());

    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        scope: BIGQUERY_SCOPE.to_string(),
        aud: key.token_uri.clone(),
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
    };

    encode(&header, &claims, encoding_key)
        .map_err(|e| AppError::internal(format!("Failed to sign assertion: {}", e)))
}

/// Exchange a signed assertion for an access token at the key's `token_uri`.
pub async fn fetch_access_token(
    http: &Client,
    key: &ServiceAccountKey,
    encoding_key: &EncodingKey,
) -> AppResult<AccessToken> {
    let now = Utc::now();
    let assertion = sign_assertion(key, encoding_key, now)?;

    debug!("Requesting access token for {}", key.client_email);
    let response: TokenResponse = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| AppError::vendor(crate::client::SERVICE, e))?
        .json()
        .await
        .map_err(|e| AppError::vendor(crate::client::SERVICE, e))?;

    Ok(AccessToken {
        token: response.access_token,
        expires_at: now + Duration::seconds(response.expires_in),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
    use secrecy::SecretString;

    const PRIVATE_KEY: &str = include_str!("../tests/fixtures/test_service_account_key.pem");
    const PUBLIC_KEY: &str = include_str!("../tests/fixtures/test_service_account_key.pub.pem");

    fn key() -> ServiceAccountKey {
        ServiceAccountKey {
            key_type: "service_account".to_string(),
            project_id: "analytics".to_string(),
            private_key_id: "kid-1".to_string(),
            private_key: SecretString::new(PRIVATE_KEY.to_string()),
            client_email: "etl@analytics.iam.gserviceaccount.com".to_string(),
            client_id: None,
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        }
    }

    #[test]
    fn test_assertion_is_rs256_signed() {
        let key = key();
        let now = Utc::now();
        let jwt = sign_assertion(&key, &signing_key(&key).unwrap(), now).unwrap();

        let header = decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("kid-1"));

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[key.token_uri.as_str()]);
        let decoded = decode::<AssertionClaims>(
            &jwt,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.claims.iss, key.client_email);
        assert_eq!(decoded.claims.scope, BIGQUERY_SCOPE);
        assert_eq!(decoded.claims.exp - decoded.claims.iat, ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn test_invalid_private_key() {
        let mut key = key();
        key.private_key = SecretString::new("not a pem".to_string());
        assert!(matches!(signing_key(&key), Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_token_freshness() {
        let now = Utc::now();
        let token = AccessToken {
            token: SecretString::new("t".to_string()),
            expires_at: now + Duration::seconds(120),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::seconds(90)));
    }
}
