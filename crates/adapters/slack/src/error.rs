//! Error mapping for the Slack Web API

use santoku_errors::AppError;
use thiserror::Error;

pub(crate) const SERVICE: &str = "slack";

/// Error reported by the Web API in an `ok: false` response.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SlackApiError {
    pub error: String,
}

/// Map a Web API error code to AppError
pub fn map_slack_error(code: &str) -> AppError {
    match code {
        "invalid_auth" => AppError::unauthenticated("The authentication token is invalid."),
        "channel_not_found" => AppError::not_found("The channel was not found."),
        other => AppError::vendor(
            SERVICE,
            SlackApiError {
                error: other.to_string(),
            },
        ),
    }
}
