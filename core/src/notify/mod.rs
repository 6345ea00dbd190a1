//! Report delivery
//!
//! Reports are rendered into an [`EmailMessage`] by [`templates`] and handed
//! to a [`Notifier`]. [`SmtpNotifier`] delivers them; [`LogNotifier`] stands
//! in when no mail server is configured.

mod smtp;
pub mod templates;

use async_trait::async_trait;
use thiserror::Error;

pub use smtp::SmtpNotifier;

/// A rendered report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to render email: {0}")]
    Render(#[from] askama::Error),

    #[error("Invalid email address {address:?}: {source}")]
    Address {
        address: String,
        source: lettre::address::AddressError,
    },

    #[error("No recipients configured")]
    NoRecipients,

    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Logs reports instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        tracing::warn!(subject = %message.subject, "email is not configured, report not sent");
        tracing::debug!(body = %message.text, "report body");
        Ok(())
    }
}
