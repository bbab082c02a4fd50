//! 批量请求结果

use serde::Serialize;

/// Per-entry result of a vendor batch call. A batch request can succeed while some of its
/// entries fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Identifiers of the accepted entries.
    pub successful: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub code: String,
    pub message: Option<String>,
    /// Whether the caller, rather than the service, caused the failure.
    pub sender_fault: bool,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(|f| f.id.as_str())
    }
}
