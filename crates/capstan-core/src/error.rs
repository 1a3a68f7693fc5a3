//! Error taxonomy for Capstan.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CapstanError>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum CapstanError {
    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// A caller-supplied argument was rejected (e.g. empty order id).
    /// Returned synchronously; no job is created.
    #[error("validation error: {0}")]
    Validation(String),

    /// A platform API call failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure modes of the commerce-platform API.
///
/// `PermissionDenied` indicates a credential/scope configuration problem,
/// not a transient fault, and is never retried.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("transaction already captured")]
    AlreadyCaptured,

    #[error("network timeout after {0}s")]
    NetworkTimeout(u64),

    #[error("platform error: {0}")]
    Remote(String),
}

impl PlatformError {
    /// Whether a retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlatformError::NetworkTimeout(_) | PlatformError::Remote(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(PlatformError::NetworkTimeout(30).is_retryable());
        assert!(PlatformError::Remote("502 Bad Gateway".into()).is_retryable());
        assert!(!PlatformError::PermissionDenied("missing scope".into()).is_retryable());
        assert!(!PlatformError::AlreadyCaptured.is_retryable());
        assert!(!PlatformError::NotFound("order 42".into()).is_retryable());
    }
}
