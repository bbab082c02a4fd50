//! santoku-errors - 统一错误处理
//!
//! Every handler in the workspace reports failures through [`AppError`]. Vendor failures are
//! never rewritten: they travel inside [`AppError::Vendor`] with the original error attached as
//! the source.

use thiserror::Error;

/// Boxed vendor error carried by [`AppError::Vendor`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("{service} error: {source}")]
    Vendor {
        service: String,
        #[source]
        source: BoxError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse category of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Malformed,
    Configuration,
    Validation,
    Unauthenticated,
    Passthrough,
    Internal,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Wrap a vendor failure without altering it.
    pub fn vendor<E>(service: impl Into<String>, err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Vendor {
            service: service.into(),
            source: err.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Malformed(_) => ErrorKind::Malformed,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::Vendor { .. } => ErrorKind::Passthrough,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// 是否为上游服务错误
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Vendor { .. })
    }

    /// The vendor error, if this is a passthrough failure.
    pub fn vendor_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Vendor { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
