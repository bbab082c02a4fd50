//! Error mapping for SQS

use aws_sdk_sqs::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::operation::get_queue_url::GetQueueUrlError;
use santoku_errors::AppError;

pub(crate) const SERVICE: &str = "sqs";

const NON_EXISTENT_QUEUE_CODES: [&str; 2] =
    ["AWS.SimpleQueueService.NonExistentQueue", "QueueDoesNotExist"];

/// SQS failures are surfaced unchanged.
pub fn map_sqs_error<E>(err: SdkError<E>) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AppError::vendor(SERVICE, err)
}

pub(crate) fn is_missing_queue(err: &SdkError<GetQueueUrlError>) -> bool {
    err.as_service_error()
        .is_some_and(GetQueueUrlError::is_queue_does_not_exist)
        || err
            .code()
            .is_some_and(|code| NON_EXISTENT_QUEUE_CODES.contains(&code))
}
