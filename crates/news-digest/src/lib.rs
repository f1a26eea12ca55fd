//! Scheduled RSS news digest.
//!
//! This crate provides:
//! - Feed download and RSS parsing, links kept exactly as published
//! - Summary rewriting through an OpenAI-compatible chat-completion API
//! - Plain-text and inlined-CSS HTML rendering
//! - SMTP delivery, one message per recipient or one batch message
//! - A cancellable daily scheduler
//!
//! A run goes Fetcher -> Parser -> Summarizer -> Renderer -> Mailer, see
//! [`pipeline::DigestJob`].

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ai;
pub mod config;
pub mod error;
pub mod feed;
pub mod mail;
pub mod pipeline;
pub mod render;
pub mod scheduler;
pub mod snapshot;
pub mod summarizer;

pub use config::{DigestConfig, PreviewConfig};
pub use error::{
    ConfigError, DeliveryError, FetchError, ParseError, RenderError, RunError, SnapshotError,
    SummarizationError,
};
pub use feed::FeedEntry;
pub use pipeline::{DigestJob, RunReport};
pub use render::{Digest, RenderFormat, RenderedDigest};
pub use scheduler::{DailyTrigger, ScheduledJob, Scheduler, SchedulerState};
pub use summarizer::{DigestItem, FallbackPolicy, SummaryOutcome};
