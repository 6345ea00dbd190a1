use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{EmailMessage, Notifier, NotifyError};
use crate::config::EmailConfig;

/// Port on which the server expects implicit TLS; other ports use STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Delivers reports through an authenticated SMTP relay.
pub struct SmtpNotifier {
    config: EmailConfig,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let builder = if self.config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
        };

        Ok(builder
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}

/// Multipart (plain + HTML) message addressed to every recipient.
pub(super) fn build_message(
    config: &EmailConfig,
    message: &EmailMessage,
) -> Result<Message, NotifyError> {
    if config.to.is_empty() {
        return Err(NotifyError::NoRecipients);
    }

    let mut builder = Message::builder()
        .from(mailbox(&config.from)?)
        .subject(message.subject.as_str());
    for recipient in &config.to {
        builder = builder.to(mailbox(recipient)?);
    }

    Ok(builder.multipart(MultiPart::alternative_plain_html(
        message.text.clone(),
        message.html.clone(),
    ))?)
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let email = build_message(&self.config, message)?;
        self.transport()?.send(email).await?;

        tracing::info!(
            subject = %message.subject,
            recipients = self.config.to.len(),
            "report sent"
        );
        Ok(())
    }
}
