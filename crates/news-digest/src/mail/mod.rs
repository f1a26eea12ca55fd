//! Digest delivery.
//!
//! [`deliver`] sends the rendered digest either as one message addressed to
//! every recipient or as one message per recipient. Delivery failures are
//! logged and collected in the [`DeliveryReport`]; they never abort the run
//! and a failure for one recipient does not block the others.

mod smtp;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

pub use smtp::SmtpMailer;

use crate::error::DeliveryError;
use crate::render::RenderedDigest;

/// How the digest is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// One message per recipient.
    #[default]
    PerRecipient,
    /// A single message listing every recipient.
    Batch,
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-recipient" | "per_recipient" | "individual" => Ok(Self::PerRecipient),
            "batch" | "single" => Ok(Self::Batch),
            other => Err(format!("expected per-recipient or batch, got {other:?}")),
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerRecipient => f.write_str("per-recipient"),
            Self::Batch => f.write_str("batch"),
        }
    }
}

/// One message ready for the transport.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: RenderedDigest,
}

/// Something that can put a message on the wire.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DeliveryError>;
}

/// Outcome of delivering one digest.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Recipients the transport accepted a message for.
    pub delivered: Vec<String>,
    /// Recipients whose message failed, with the error text.
    pub failed: Vec<(String, String)>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Send `body` to `recipients` according to `mode`.
pub async fn deliver(
    mailer: &dyn Mailer,
    recipients: &[String],
    subject: &str,
    body: &RenderedDigest,
    mode: DeliveryMode,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    match mode {
        DeliveryMode::PerRecipient => {
            for recipient in recipients {
                tracing::info!(to = %recipient, "Sending digest");
                let email = OutgoingEmail {
                    to: vec![recipient.clone()],
                    subject: subject.to_string(),
                    body: body.clone(),
                };
                match mailer.send(&email).await {
                    Ok(()) => {
                        tracing::info!(to = %recipient, "Email sent");
                        report.delivered.push(recipient.clone());
                    }
                    Err(e) => {
                        tracing::error!(to = %recipient, error = %e, "Failed to send email");
                        report.failed.push((recipient.clone(), e.to_string()));
                    }
                }
            }
        }
        DeliveryMode::Batch => {
            tracing::info!(recipients = recipients.len(), "Sending digest");
            let email = OutgoingEmail {
                to: recipients.to_vec(),
                subject: subject.to_string(),
                body: body.clone(),
            };
            match mailer.send(&email).await {
                Ok(()) => {
                    tracing::info!(recipients = recipients.len(), "Email sent");
                    report.delivered.extend(recipients.iter().cloned());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to send email");
                    let reason = e.to_string();
                    report
                        .failed
                        .extend(recipients.iter().map(|r| (r.clone(), reason.clone())));
                }
            }
        }
    }

    report
}

/// Short message used to check SMTP settings.
pub fn test_email_body() -> RenderedDigest {
    let text = "\
News Digest - Test Email

Email configuration is working!

If you're seeing this, SMTP is configured correctly.
"
    .to_string();

    let html = r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; padding: 20px;">
    <h2 style="color: #2a9d8f;">🌍 News Digest</h2>
    <p style="font-weight: bold; color: #16a34a;">Email configuration is working!</p>
    <p>If you're seeing this, SMTP is configured correctly.</p>
</body>
</html>
"#
    .to_string();

    RenderedDigest {
        text,
        html: Some(html),
    }
}
