//! Error mapping for S3

use aws_sdk_s3::error::SdkError;
use santoku_errors::AppError;

pub(crate) const SERVICE: &str = "s3";

/// S3 failures are surfaced unchanged.
pub fn map_s3_error<E>(err: SdkError<E>) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AppError::vendor(SERVICE, err)
}
