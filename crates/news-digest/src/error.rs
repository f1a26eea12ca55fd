//! Error types for the digest workflow.
//!
//! Fetch, parse and render failures abort a run. Summarization and delivery
//! failures are isolated per entry / per recipient and never escape their
//! component; they are carried in [`crate::summarizer::SummaryOutcome`] and
//! [`crate::mail::DeliveryReport`] instead.

use thiserror::Error;

/// Failure while downloading the feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Could not build the HTTP client
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Network failure or timeout
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-2xx status
    #[error("HTTP {status} when fetching {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

impl FetchError {
    /// Whether the failure was caused by the request timing out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request { source, .. } if source.is_timeout())
    }
}

/// The fetched bytes are not a readable feed.
#[derive(Debug, Error)]
#[error("failed to parse feed: {0}")]
pub struct ParseError(#[from] pub rss::Error);

/// Failure of a single chat-completion call.
#[derive(Debug, Error)]
pub enum SummarizationError {
    /// Network failure, timeout or unreadable body
    #[error("chat completion request failed: {0}")]
    Request(String),

    /// The API rejected the call (auth, quota, bad model, ...)
    #[error("chat completion API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The body did not match the chat-completion schema
    #[error("malformed chat completion response: {0}")]
    Malformed(String),

    /// The first choice carried no text
    #[error("chat completion returned no content")]
    EmptyResponse,
}

/// Failure delivering one message.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// A sender or recipient address did not parse
    #[error("invalid email address {address:?}: {reason}")]
    Address { address: String, reason: String },

    /// The message could not be assembled
    #[error("failed to build email message: {0}")]
    Build(String),

    /// SMTP session could not be established
    #[error("failed to set up SMTP transport: {0}")]
    Transport(String),

    /// The server refused the message or the connection dropped
    #[error("SMTP send failed: {0}")]
    Send(String),
}

/// Invalid or missing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    /// A variable is set but its value is unusable
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// CSS inlining failed.
#[derive(Debug, Error)]
#[error("failed to inline CSS: {0}")]
pub struct RenderError(pub String);

/// CSV snapshot could not be written.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to write snapshot: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a digest run before anything is sent.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
