//! Error mapping for Secrets Manager

use aws_sdk_secretsmanager::error::{ProvideErrorMetadata, SdkError};
use santoku_errors::{AppError, BoxError};

pub(crate) const SERVICE: &str = "secretsmanager";

pub(crate) const RESOURCE_NOT_FOUND: &str = "Secrets Manager can't find the resource you asked for.";

/// Convert an SDK error to AppError. Only a missing secret is reinterpreted.
pub fn map_secrets_manager_error<E>(err: SdkError<E>) -> AppError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.code().map(str::to_string);
    classify(code.as_deref(), err)
}

fn classify(code: Option<&str>, err: impl Into<BoxError>) -> AppError {
    match code {
        Some("ResourceNotFoundException") => AppError::not_found(RESOURCE_NOT_FOUND),
        _ => AppError::vendor(SERVICE, err),
    }
}
