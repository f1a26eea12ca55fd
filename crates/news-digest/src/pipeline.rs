//! Digest run orchestration - fetch, parse, summarize, render, deliver.
//!
//! A run is strictly sequential. Fetch, parse and render failures abort it
//! before anything is written or sent; summarization and delivery failures
//! are absorbed by their components and show up in the [`RunReport`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::ai::ChatProvider;
use crate::config::{DigestConfig, FeedConfig, PreviewConfig};
use crate::error::RunError;
use crate::feed::{parse_feed, FeedFetcher};
use crate::mail::{deliver, DeliveryReport, Mailer};
use crate::render::{render, Digest, RenderOptions, RenderedDigest};
use crate::scheduler::ScheduledJob;
use crate::snapshot::write_snapshot;
use crate::summarizer::{FallbackPolicy, Summarizer};

/// Result of a single digest run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Entries kept from the feed.
    pub entries: usize,
    /// Entries whose summary the API rewrote.
    pub rewritten: usize,
    /// Entries that fell back to the original text or placeholder.
    pub fell_back: usize,
    /// Whether a CSV snapshot was written.
    pub snapshot_written: bool,
    pub delivery: DeliveryReport,
}

/// The daily digest job.
pub struct DigestJob {
    config: DigestConfig,
    provider: Arc<dyn ChatProvider>,
    mailer: Arc<dyn Mailer>,
}

impl DigestJob {
    #[must_use]
    pub fn new(
        config: DigestConfig,
        provider: Arc<dyn ChatProvider>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            provider,
            mailer,
        }
    }

    /// Run the whole workflow once.
    pub async fn run_once(&self) -> Result<RunReport, RunError> {
        tracing::info!(feed = %self.config.feed.url, "Running the news digest");

        let digest = build_digest(
            &self.config.feed,
            self.provider.clone(),
            &self.config.summarizer.fallback,
        )
        .await?;
        let rewritten = digest
            .items
            .iter()
            .filter(|i| i.outcome.is_rewritten())
            .count();
        let mut report = RunReport {
            entries: digest.len(),
            rewritten,
            fell_back: digest.len() - rewritten,
            ..Default::default()
        };
        tracing::info!(
            entries = report.entries,
            rewritten = report.rewritten,
            fell_back = report.fell_back,
            "News digest generated and summarized"
        );

        if let Some(path) = &self.config.output.csv_path {
            match write_snapshot(path, &digest.items) {
                Ok(()) => report.snapshot_written = true,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Snapshot not written");
                }
            }
        }

        let rendered = render(&digest, &RenderOptions::from(&self.config.output))?;

        let mail = &self.config.mail;
        report.delivery = deliver(
            self.mailer.as_ref(),
            &mail.recipients,
            &mail.subject,
            &rendered,
            mail.delivery_mode,
        )
        .await;

        tracing::info!(
            entries = report.entries,
            delivered = report.delivery.delivered.len(),
            failed = report.delivery.failed.len(),
            "Digest run complete"
        );
        Ok(report)
    }
}

/// Fetch, parse and summarize the feed.
pub async fn build_digest(
    feed: &FeedConfig,
    provider: Arc<dyn ChatProvider>,
    fallback: &FallbackPolicy,
) -> Result<Digest, RunError> {
    let fetcher = FeedFetcher::new(feed)?;
    let bytes = fetcher.fetch().await?;
    let entries = parse_feed(&bytes, feed.entry_limit)?;

    let summarizer = Summarizer::new(provider, fallback.clone());
    let items = summarizer.summarize_all(entries).await;
    Ok(Digest::new(items))
}

/// Build and render the digest without writing or sending anything.
pub async fn preview(
    config: &PreviewConfig,
    provider: Arc<dyn ChatProvider>,
) -> Result<RenderedDigest, RunError> {
    let digest = build_digest(&config.feed, provider, &config.summarizer.fallback).await?;
    Ok(render(&digest, &RenderOptions::from(&config.output))?)
}

#[async_trait]
impl ScheduledJob for DigestJob {
    fn name(&self) -> &str {
        "news-digest"
    }

    async fn run(&self) {
        if let Err(e) = self.run_once().await {
            tracing::error!(error = %e, "Digest run aborted");
        }
    }
}
