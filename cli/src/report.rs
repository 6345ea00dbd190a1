//! Report routing and delivery

use clap::Parser;
use lotto_core::config::AppConfig;
use lotto_core::notify::templates;
use lotto_core::notify::{EmailMessage, LogNotifier, Notifier, NotifyError, SmtpNotifier};
use lotto_core::{LottoError, Product, PurchaseError};
use tracing::{info, warn};

#[derive(Debug, Parser)]
pub struct NotifyFailureArgs {
    /// Name of the operation that failed, e.g. "lotto purchase"
    pub operation: String,

    /// Error message to include in the report
    pub message: String,
}

/// SMTP when email is configured, the log otherwise.
pub(crate) fn notifier(config: &AppConfig) -> Box<dyn Notifier> {
    match &config.email {
        Some(email) => Box::new(SmtpNotifier::new(email.clone())),
        None => Box::new(LogNotifier),
    }
}

/// Send a rendered report. Delivery problems are logged and never fail the
/// command that produced the report.
pub(crate) async fn deliver(
    notifier: &dyn Notifier,
    rendered: Result<EmailMessage, NotifyError>,
) {
    let message = match rendered {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "could not render report");
            return;
        }
    };

    match notifier.send(&message).await {
        Ok(()) => info!(subject = %message.subject, "report sent"),
        Err(err) => warn!(subject = %message.subject, error = %err, "report could not be sent"),
    }
}

/// Template for a failed purchase run.
pub(crate) fn failure_report(
    product: Product,
    err: &PurchaseError,
) -> Result<EmailMessage, NotifyError> {
    match err {
        PurchaseError::DryRun(source) => templates::dry_run_failure(product, &source.to_string()),
        PurchaseError::Action(LottoError::InsufficientBalance {
            required,
            available,
        }) => templates::insufficient_balance(product, *required, *available),
        PurchaseError::Action(source) => templates::purchase_failure(product, &source.to_string()),
        PurchaseError::VerificationFailed { .. } => {
            templates::verification_required(product, &err.to_string())
        }
    }
}

pub(crate) async fn run_notify_failure(
    args: NotifyFailureArgs,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let Some(email) = &config.email else {
        anyhow::bail!("email is not configured; set LOTTO_EMAIL_SMTP_HOST and LOTTO_EMAIL_SMTP_PORT");
    };

    let message = templates::operation_failure(&args.operation, &args.message)?;
    SmtpNotifier::new(email.clone()).send(&message).await?;
    info!(operation = %args.operation, "failure report sent");
    Ok(())
}
