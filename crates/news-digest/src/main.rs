//! News digest CLI - fetch a feed, rewrite summaries, email the digest.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_digest::ai::OpenAiChatClient;
use news_digest::config::{parse_trigger_time, FeedConfig, MailConfig, OutputConfig};
use news_digest::mail::{deliver, test_email_body, SmtpMailer};
use news_digest::pipeline::preview;
use news_digest::{DailyTrigger, DigestConfig, DigestJob, PreviewConfig, RenderFormat, Scheduler};

/// News digest CLI - scheduled RSS digest delivered by email.
#[derive(Parser)]
#[command(name = "news-digest")]
#[command(about = "Fetch an RSS feed, rewrite summaries with an LLM and email the digest")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the digest every day at the trigger time until interrupted
    Schedule {
        /// Trigger time (HH:MM, local time); overrides DIGEST_TRIGGER_TIME
        #[arg(long)]
        at: Option<String>,

        /// Poll interval in seconds; overrides DIGEST_POLL_INTERVAL_SECS
        #[arg(long)]
        interval: Option<u64>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Run the digest once, now
    Run {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Build and render the digest without mailing it
    Preview {
        /// Write the rendered digest here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Send a short test email to the configured recipients
    TestEmail,
}

/// Settings that can be overridden per invocation.
#[derive(Args)]
pub struct Overrides {
    /// Number of feed entries to include; overrides DIGEST_ENTRY_LIMIT
    #[arg(long)]
    limit: Option<usize>,

    /// Output format (html or text); overrides DIGEST_FORMAT
    #[arg(long)]
    format: Option<RenderFormat>,
}

impl Overrides {
    fn apply(self, feed: &mut FeedConfig, output: &mut OutputConfig) {
        if let Some(limit) = self.limit {
            feed.entry_limit = limit;
        }
        if let Some(format) = self.format {
            output.format = format;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("news_digest=debug,info")
        } else {
            EnvFilter::new("news_digest=info,warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Schedule {
            at,
            interval,
            overrides,
        } => {
            let mut config = load_config()?;
            overrides.apply(&mut config.feed, &mut config.output);
            if let Some(at) = at {
                config.schedule.trigger =
                    parse_trigger_time(&at).map_err(|e| anyhow::anyhow!("Invalid --at: {e}"))?;
            }
            if let Some(secs) = interval {
                config.schedule.poll_interval = std::time::Duration::from_secs(secs);
            }
            config.validate()?;
            run_schedule(config).await
        }
        Commands::Run { overrides } => {
            let mut config = load_config()?;
            overrides.apply(&mut config.feed, &mut config.output);
            config.validate()?;
            run_once(config).await
        }
        Commands::Preview { output, overrides } => {
            let mut config = PreviewConfig::from_env().context("Failed to load configuration")?;
            overrides.apply(&mut config.feed, &mut config.output);
            config.feed.validate()?;
            run_preview(&config, output).await
        }
        Commands::TestEmail => {
            let config = MailConfig::from_env().context("Failed to load SMTP configuration")?;
            run_test_email(&config).await
        }
    }
}

fn load_config() -> Result<DigestConfig> {
    DigestConfig::from_env().context("Failed to load configuration")
}

fn build_job(config: DigestConfig) -> Result<DigestJob> {
    let provider =
        OpenAiChatClient::new(&config.summarizer).context("Failed to create chat client")?;
    let mailer = SmtpMailer::new(&config.mail).context("Failed to create SMTP mailer")?;
    Ok(DigestJob::new(config, Arc::new(provider), Arc::new(mailer)))
}

async fn run_schedule(config: DigestConfig) -> Result<()> {
    let trigger = DailyTrigger::new(config.schedule.trigger);
    let poll_interval = config.schedule.poll_interval;
    let job = build_job(config)?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received SIGINT, shutting down");
            signal_token.cancel();
        }
    });

    let mut scheduler = Scheduler::new(job, trigger, poll_interval);
    scheduler.run(cancel).await;
    Ok(())
}

async fn run_once(config: DigestConfig) -> Result<()> {
    let job = build_job(config)?;
    let report = job.run_once().await.context("Digest run aborted")?;

    println!("\n📊 Digest Run Summary");
    println!("   Entries: {}", report.entries);
    println!("   Rewritten: {}", report.rewritten);
    println!("   Fell back: {}", report.fell_back);
    println!("   Snapshot written: {}", report.snapshot_written);
    println!("   Delivered: {}", report.delivery.delivered.len());

    if !report.delivery.failed.is_empty() {
        println!("   Failed: {}", report.delivery.failed.len());
        for (recipient, err) in &report.delivery.failed {
            eprintln!("     - {recipient}: {err}");
        }
    }

    Ok(())
}

async fn run_preview(config: &PreviewConfig, output: Option<PathBuf>) -> Result<()> {
    let provider =
        OpenAiChatClient::new(&config.summarizer).context("Failed to create chat client")?;
    let rendered = preview(config, Arc::new(provider))
        .await
        .context("Digest preview failed")?;

    match output {
        Some(path) => {
            std::fs::write(&path, rendered.body())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Digest written to: {}", path.display());
        }
        None => println!("{}", rendered.body()),
    }

    Ok(())
}

async fn run_test_email(config: &MailConfig) -> Result<()> {
    let mailer = SmtpMailer::new(config).context("Failed to create SMTP mailer")?;
    let report = deliver(
        &mailer,
        &config.recipients,
        "News Digest - Test Email",
        &test_email_body(),
        config.delivery_mode,
    )
    .await;

    for recipient in &report.delivered {
        println!("✅ Test email sent to {recipient}");
    }
    for (recipient, err) in &report.failed {
        eprintln!("❌ Test email to {recipient} failed: {err}");
    }

    if report.delivered.is_empty() {
        anyhow::bail!("No test email could be delivered");
    }
    Ok(())
}
