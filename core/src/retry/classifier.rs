//! Error classification for retry decisions

/// Top-level error classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient errors that should be retried with backoff
    Retryable(RetryableError),

    /// Permanent errors that should NOT be retried
    Permanent(PermanentError),
}

/// Transient errors (retry recommended)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryableError {
    #[error("Network timeout")]
    NetworkTimeout,

    #[error("Connection reset")]
    ConnectionReset,

    #[error("Connection refused")]
    ConnectionRefused,

    #[error("Network failure")]
    Network,
}

/// Permanent errors (do NOT retry)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermanentError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session is not authenticated")]
    NotAuthenticated,

    #[error("Rejected by vendor: {0}")]
    Rejected(String),

    #[error("Insufficient deposit: {available} of {required} KRW available")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("Invalid input in field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unclassified failure: {0}")]
    Unclassified(String),
}

/// Trait for error classification
pub trait RetryClassifiable {
    fn classify(&self) -> ErrorClass;

    fn is_retryable(&self) -> bool {
        matches!(self.classify(), ErrorClass::Retryable(_))
    }
}

/// Classify a free-form error message by its transient-network indicators.
///
/// Anything that does not look like a network hiccup is permanent.
pub fn classify_message(msg: &str) -> ErrorClass {
    let lower = msg.to_lowercase();

    if lower.contains("timeout") || lower.contains("timed out") {
        ErrorClass::Retryable(RetryableError::NetworkTimeout)
    } else if lower.contains("econnreset") || lower.contains("connection reset") {
        ErrorClass::Retryable(RetryableError::ConnectionReset)
    } else if lower.contains("econnrefused") || lower.contains("connection refused") {
        ErrorClass::Retryable(RetryableError::ConnectionRefused)
    } else if lower.contains("net::") || lower.contains("connection") || lower.contains("network")
    {
        ErrorClass::Retryable(RetryableError::Network)
    } else {
        ErrorClass::Permanent(PermanentError::Unclassified(msg.to_string()))
    }
}
