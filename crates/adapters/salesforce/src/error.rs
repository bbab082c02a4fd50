//! Error mapping for the Salesforce REST API

use santoku_errors::AppError;

pub(crate) const SERVICE: &str = "salesforce";

/// HTTP and transport failures are surfaced unchanged.
pub fn map_salesforce_error(err: reqwest::Error) -> AppError {
    AppError::vendor(SERVICE, err)
}
