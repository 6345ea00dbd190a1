//! Error types for vendor interaction

use thiserror::Error;

use crate::retry::classifier::{
    ErrorClass, PermanentError, RetryClassifiable, RetryableError, classify_message,
};

pub type Result<T> = std::result::Result<T, LottoError>;

/// Failures raised while talking to the ticket vendor
#[derive(Debug, Error)]
pub enum LottoError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Vendor(String),

    #[error("Unexpected page while {context}")]
    UnexpectedPage { context: String },

    #[error("Login failed: invalid username or password")]
    InvalidCredentials,

    #[error("Session is not authenticated")]
    NotAuthenticated,

    #[error("Purchase rejected by vendor (code {code}): {message}")]
    PurchaseRejected { code: String, message: String },

    #[error("Insufficient deposit: {available} KRW available, {required} KRW required")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("Invalid input in field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Failed to parse {what}: {value:?}")]
    Parse { what: &'static str, value: String },
}

impl LottoError {
    pub fn vendor(msg: impl Into<String>) -> Self {
        LottoError::Vendor(msg.into())
    }

    pub fn unexpected_page(context: impl Into<String>) -> Self {
        LottoError::UnexpectedPage {
            context: context.into(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        LottoError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Errors that no amount of retrying will fix: bad credentials, a lost
    /// session, an order the vendor refused or could not be paid for, or
    /// caller input.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            LottoError::InvalidCredentials
                | LottoError::NotAuthenticated
                | LottoError::PurchaseRejected { .. }
                | LottoError::InsufficientBalance { .. }
                | LottoError::InvalidInput { .. }
        )
    }
}

impl RetryClassifiable for LottoError {
    fn classify(&self) -> ErrorClass {
        match self {
            LottoError::Http(err) => classify_http_error(err),
            LottoError::Vendor(msg) => classify_message(msg),
            LottoError::UnexpectedPage { context } => {
                ErrorClass::Permanent(PermanentError::Unclassified(format!(
                    "unexpected page while {context}"
                )))
            }
            LottoError::InvalidCredentials => {
                ErrorClass::Permanent(PermanentError::InvalidCredentials)
            }
            LottoError::NotAuthenticated => ErrorClass::Permanent(PermanentError::NotAuthenticated),
            LottoError::PurchaseRejected { code, message } => {
                ErrorClass::Permanent(PermanentError::Rejected(format!("{code}: {message}")))
            }
            LottoError::InsufficientBalance {
                required,
                available,
            } => ErrorClass::Permanent(PermanentError::InsufficientBalance {
                required: *required,
                available: *available,
            }),
            LottoError::InvalidInput { field, reason } => {
                ErrorClass::Permanent(PermanentError::InvalidInput {
                    field: field.clone(),
                    reason: reason.clone(),
                })
            }
            LottoError::Parse { what, value } => ErrorClass::Permanent(
                PermanentError::Unclassified(format!("unparseable {what}: {value}")),
            ),
        }
    }
}

// Transport-level failures are transient; 4xx answers are not.
fn classify_http_error(err: &reqwest::Error) -> ErrorClass {
    if err.is_timeout() {
        return ErrorClass::Retryable(RetryableError::NetworkTimeout);
    }
    if err.is_connect() {
        return ErrorClass::Retryable(RetryableError::ConnectionRefused);
    }
    if let Some(status) = err.status() {
        return if status.is_server_error() || status.as_u16() == 429 {
            ErrorClass::Retryable(RetryableError::Network)
        } else {
            ErrorClass::Permanent(PermanentError::Unclassified(format!("HTTP status {status}")))
        };
    }
    if err.is_request() || err.is_body() {
        return ErrorClass::Retryable(RetryableError::Network);
    }
    classify_message(&err.to_string())
}
