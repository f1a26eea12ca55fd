//! Email sender using authenticated SMTP.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Mailer, OutgoingEmail};
use crate::config::{MailConfig, SmtpSecurity};
use crate::error::DeliveryError;

/// SMTP mailer built once per run from [`MailConfig`].
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Create a mailer with the configured credentials and From header.
    pub fn new(config: &MailConfig) -> Result<Self, DeliveryError> {
        let from = Mailbox::new(
            Some(config.from_name.clone()),
            parse_address(&config.sender_email)?,
        );

        let creds = Credentials::new(
            config.sender_email.clone(),
            config.sender_password.clone(),
        );

        let builder = match config.security {
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            }
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host),
        }
        .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { from, transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DeliveryError> {
        let message = build_message(&self.from, email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Send(e.to_string()))?;

        tracing::debug!(
            to = ?email.to,
            subject = %email.subject,
            "SMTP server accepted message"
        );
        Ok(())
    }
}

fn parse_address(raw: &str) -> Result<Address, DeliveryError> {
    raw.parse().map_err(|e: lettre::address::AddressError| DeliveryError::Address {
        address: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Assemble the MIME message: HTML digests go out as `multipart/alternative`
/// with the text rendering as the plain part.
fn build_message(from: &Mailbox, email: &OutgoingEmail) -> Result<Message, DeliveryError> {
    let mut builder = Message::builder().from(from.clone()).subject(&email.subject);
    for recipient in &email.to {
        builder = builder.to(Mailbox::new(None, parse_address(recipient)?));
    }

    let built = match &email.body.html {
        Some(html) => builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.body.text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html.clone()),
                ),
        ),
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.text.clone()),
    };

    built.map_err(|e| DeliveryError::Build(e.to_string()))
}
