//! Configuration for the news digest.
//!
//! Every setting the workflow needs lives in [`DigestConfig`] and is handed to
//! each component explicitly. Values come from environment variables; tests
//! build the same structure from an in-memory map through
//! [`DigestConfig::from_lookup`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;

use crate::error::ConfigError;
use crate::mail::DeliveryMode;
use crate::render::RenderFormat;
use crate::summarizer::FallbackPolicy;

/// Default User-Agent sent with the feed request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Default feed request timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Default number of entries kept from the feed.
pub const DEFAULT_ENTRY_LIMIT: usize = 15;

/// Default chat-completion base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat-completion model.
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// Default Gmail SMTP host.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Default Gmail SMTP port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default display name on the From header.
pub const DEFAULT_FROM_NAME: &str = "Automated News Digest";

/// Default subject line and page heading.
pub const DEFAULT_SUBJECT: &str = "Daily News Digest";

/// Default daily trigger time.
pub const DEFAULT_TRIGGER_TIME: &str = "08:00";

/// Default scheduler poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Feed source settings.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// RSS/Atom document URL.
    pub url: String,
    /// User-Agent header value.
    pub user_agent: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Number of entries kept, in feed order.
    pub entry_limit: usize,
}

/// Chat-completion settings.
#[derive(Clone)]
pub struct SummarizerConfig {
    pub api_key: String,
    /// Base URL; `/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    /// Per-call timeout. `None` waits for the API indefinitely.
    pub timeout: Option<Duration>,
    /// What a failed call is replaced with.
    pub fallback: FallbackPolicy,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS (port 587).
    #[default]
    StartTls,
    /// TLS from the first byte (port 465).
    Tls,
}

impl FromStr for SmtpSecurity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starttls" => Ok(Self::StartTls),
            "tls" | "ssl" => Ok(Self::Tls),
            other => Err(format!("expected starttls or tls, got {other:?}")),
        }
    }
}

/// Outgoing mail settings.
#[derive(Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub security: SmtpSecurity,
    /// Sender address, also the SMTP username.
    pub sender_email: String,
    /// SMTP password or app token.
    pub sender_password: String,
    /// Display name shown in the From header.
    pub from_name: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub delivery_mode: DeliveryMode,
}

/// Daily trigger settings.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Local wall-clock time the job fires at.
    pub trigger: NaiveTime,
    /// How often the trigger table is checked.
    pub poll_interval: Duration,
}

/// Rendering and snapshot settings.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: RenderFormat,
    /// Heading of the HTML page.
    pub title: String,
    /// Escape entry text before interpolating it into HTML.
    pub escape_html: bool,
    /// CSV snapshot destination; no snapshot when unset.
    pub csv_path: Option<PathBuf>,
}

/// Root configuration.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub feed: FeedConfig,
    pub summarizer: SummarizerConfig,
    pub mail: MailConfig,
    pub schedule: ScheduleConfig,
    pub output: OutputConfig,
}

impl DigestConfig {
    /// Create configuration from environment variables.
    ///
    /// # Required Environment Variables
    /// - `DIGEST_FEED_URL`: feed to digest
    /// - `OPENAI_API_KEY`: chat-completion API key
    /// - `SENDER_EMAIL`: sender address / SMTP username
    /// - `EMAIL_PASSWORD`: SMTP password (Gmail app password)
    /// - `RECIPIENTS`: comma-separated recipient addresses
    ///
    /// Everything else has a default, see the constants in this module.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let config = Self {
            feed: FeedConfig::load(&vars)?,
            summarizer: SummarizerConfig::load(&vars)?,
            mail: MailConfig::load(&vars)?,
            schedule: ScheduleConfig::load(&vars)?,
            output: OutputConfig::load(&vars)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.feed.validate()?;
        self.mail.validate()?;
        self.schedule.validate()
    }
}

/// The sections a mail-free preview run needs.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub feed: FeedConfig,
    pub summarizer: SummarizerConfig,
    pub output: OutputConfig,
}

impl PreviewConfig {
    /// Like [`DigestConfig::from_env`] without the mail and schedule variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let config = Self {
            feed: FeedConfig::load(&vars)?,
            summarizer: SummarizerConfig::load(&vars)?,
            output: OutputConfig::load(&vars)?,
        };
        config.feed.validate()?;
        Ok(config)
    }
}

impl FeedConfig {
    fn load<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: vars.require("DIGEST_FEED_URL")?,
            user_agent: vars.get_or("DIGEST_USER_AGENT", DEFAULT_USER_AGENT),
            timeout: Duration::from_secs(
                vars.parse_or("DIGEST_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?,
            ),
            entry_limit: vars.parse_or("DIGEST_ENTRY_LIMIT", DEFAULT_ENTRY_LIMIT)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "DIGEST_ENTRY_LIMIT",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "DIGEST_FETCH_TIMEOUT_SECS",
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

impl SummarizerConfig {
    fn load<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: vars.require("OPENAI_API_KEY")?,
            base_url: vars.get_or("OPENAI_BASE_URL", DEFAULT_API_BASE_URL),
            model: vars.get_or("DIGEST_MODEL", DEFAULT_MODEL),
            timeout: vars
                .get("DIGEST_SUMMARY_TIMEOUT_SECS")
                .map(|v| parse_value("DIGEST_SUMMARY_TIMEOUT_SECS", &v))
                .transpose()?
                .map(Duration::from_secs),
            fallback: vars
                .get("DIGEST_FALLBACK_PLACEHOLDER")
                .map_or(FallbackPolicy::Original, FallbackPolicy::Placeholder),
        })
    }
}

impl MailConfig {
    /// Load only the SMTP settings, for sending a test email.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::load(&Vars(lookup))?;
        config.validate()?;
        Ok(config)
    }

    fn load<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self, ConfigError> {
        Ok(Self {
            smtp_host: vars.get_or("SMTP_HOST", DEFAULT_SMTP_HOST),
            smtp_port: vars.parse_or("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            security: vars.parse_or("SMTP_SECURITY", SmtpSecurity::default())?,
            sender_email: vars.require("SENDER_EMAIL")?,
            sender_password: vars.require("EMAIL_PASSWORD")?,
            from_name: vars.get_or("DIGEST_FROM_NAME", DEFAULT_FROM_NAME),
            recipients: parse_recipients(&vars.require("RECIPIENTS")?),
            subject: vars.get_or("DIGEST_SUBJECT", DEFAULT_SUBJECT),
            delivery_mode: vars.parse_or("DIGEST_DELIVERY_MODE", DeliveryMode::default())?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recipients.is_empty() {
            return Err(ConfigError::Invalid {
                key: "RECIPIENTS",
                reason: "no recipient addresses given".to_string(),
            });
        }
        Ok(())
    }
}

impl ScheduleConfig {
    fn load<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self, ConfigError> {
        let trigger_raw = vars.get_or("DIGEST_TRIGGER_TIME", DEFAULT_TRIGGER_TIME);
        Ok(Self {
            trigger: parse_trigger_time(&trigger_raw).map_err(|reason| ConfigError::Invalid {
                key: "DIGEST_TRIGGER_TIME",
                reason,
            })?,
            poll_interval: Duration::from_secs(
                vars.parse_or("DIGEST_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?,
            ),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "DIGEST_POLL_INTERVAL_SECS",
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

impl OutputConfig {
    fn load<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self, ConfigError> {
        Ok(Self {
            format: vars.parse_or("DIGEST_FORMAT", RenderFormat::default())?,
            title: vars.get_or("DIGEST_TITLE", DEFAULT_SUBJECT),
            escape_html: vars.parse_or("DIGEST_ESCAPE_HTML", false)?,
            csv_path: vars.get("DIGEST_CSV_PATH").map(PathBuf::from),
        })
    }
}

/// Split a comma-separated recipient list, dropping blanks.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_trigger_time(raw: &str) -> Result<NaiveTime, String> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| format!("expected HH:MM or HH:MM:SS, got {raw:?}"))
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Key lookup where blank values count as unset.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get(key)
            .map_or(Ok(default), |v| parse_value(key, &v))
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

impl fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("security", &self.security)
            .field("sender_email", &self.sender_email)
            .field("sender_password", &"<redacted>")
            .field("from_name", &self.from_name)
            .field("recipients", &self.recipients)
            .field("subject", &self.subject)
            .field("delivery_mode", &self.delivery_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DIGEST_FEED_URL", "https://example.com/rss"),
            ("OPENAI_API_KEY", "sk-test"),
            ("SENDER_EMAIL", "digest@example.com"),
            ("EMAIL_PASSWORD", "app-password"),
            ("RECIPIENTS", "a@example.com, b@example.com"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<DigestConfig, ConfigError> {
        DigestConfig::from_lookup(|key| vars.get(key).map(ToString::to_string))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.feed.user_agent, "Mozilla/5.0");
        assert_eq!(config.feed.timeout, Duration::from_secs(10));
        assert_eq!(config.feed.entry_limit, 15);
        assert_eq!(config.summarizer.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.summarizer.model, "gpt-4.1");
        assert!(config.summarizer.timeout.is_none());
        assert_eq!(config.summarizer.fallback, FallbackPolicy::Original);
        assert_eq!(config.mail.smtp_port, 587);
        assert_eq!(config.mail.security, SmtpSecurity::StartTls);
        assert_eq!(config.mail.delivery_mode, DeliveryMode::PerRecipient);
        assert_eq!(
            config.schedule.trigger,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );
        assert_eq!(config.schedule.poll_interval, Duration::from_secs(60));
        assert_eq!(config.output.format, RenderFormat::Html);
        assert!(!config.output.escape_html);
        assert!(config.output.csv_path.is_none());
    }

    #[test]
    fn test_recipients_are_split_and_trimmed() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(
            config.mail.recipients,
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
        assert_eq!(parse_recipients(" x@y.z ,, "), vec!["x@y.z".to_string()]);
    }

    #[test]
    fn test_missing_required_variable() {
        let mut vars = base_vars();
        vars.remove("OPENAI_API_KEY");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENAI_API_KEY")));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("DIGEST_FEED_URL", "   ");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("DIGEST_FEED_URL")
        ));
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("DIGEST_ENTRY_LIMIT", "10");
        vars.insert("DIGEST_POLL_INTERVAL_SECS", "20");
        vars.insert("DIGEST_TRIGGER_TIME", "07:30:15");
        vars.insert("DIGEST_DELIVERY_MODE", "batch");
        vars.insert("DIGEST_FORMAT", "text");
        vars.insert("DIGEST_FALLBACK_PLACEHOLDER", "Summary unavailable");
        vars.insert("DIGEST_CSV_PATH", "news.csv");
        vars.insert("SMTP_SECURITY", "tls");
        vars.insert("SMTP_PORT", "465");

        let config = load(&vars).unwrap();
        assert_eq!(config.feed.entry_limit, 10);
        assert_eq!(config.schedule.poll_interval, Duration::from_secs(20));
        assert_eq!(
            config.schedule.trigger,
            NaiveTime::from_hms_opt(7, 30, 15).unwrap()
        );
        assert_eq!(config.mail.delivery_mode, DeliveryMode::Batch);
        assert_eq!(config.output.format, RenderFormat::Text);
        assert_eq!(
            config.summarizer.fallback,
            FallbackPolicy::Placeholder("Summary unavailable".to_string())
        );
        assert_eq!(config.output.csv_path, Some(PathBuf::from("news.csv")));
        assert_eq!(config.mail.security, SmtpSecurity::Tls);
        assert_eq!(config.mail.smtp_port, 465);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut vars = base_vars();
        vars.insert("DIGEST_ENTRY_LIMIT", "0");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid {
                key: "DIGEST_ENTRY_LIMIT",
                ..
            }
        ));

        let mut vars = base_vars();
        vars.insert("DIGEST_TRIGGER_TIME", "8am");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid {
                key: "DIGEST_TRIGGER_TIME",
                ..
            }
        ));

        let mut vars = base_vars();
        vars.insert("RECIPIENTS", " , ");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid {
                key: "RECIPIENTS",
                ..
            }
        ));

        let mut vars = base_vars();
        vars.insert("DIGEST_DELIVERY_MODE", "carrier-pigeon");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_mail_config_needs_only_mail_variables() {
        let vars: HashMap<&'static str, &'static str> = HashMap::from([
            ("SENDER_EMAIL", "digest@example.com"),
            ("EMAIL_PASSWORD", "app-password"),
            ("RECIPIENTS", "a@example.com"),
        ]);
        let mail = MailConfig::from_lookup(|key| vars.get(key).map(ToString::to_string)).unwrap();
        assert_eq!(mail.recipients, vec!["a@example.com".to_string()]);
        assert_eq!(mail.smtp_host, "smtp.gmail.com");

        assert!(matches!(
            MailConfig::from_lookup(|_| None).unwrap_err(),
            ConfigError::Missing("SENDER_EMAIL")
        ));
    }

    #[test]
    fn test_preview_config_skips_mail_variables() {
        let vars: HashMap<&'static str, &'static str> = HashMap::from([
            ("DIGEST_FEED_URL", "https://example.com/rss"),
            ("OPENAI_API_KEY", "sk-test"),
            ("DIGEST_FORMAT", "text"),
        ]);
        let preview =
            PreviewConfig::from_lookup(|key| vars.get(key).map(ToString::to_string)).unwrap();
        assert_eq!(preview.feed.url, "https://example.com/rss");
        assert_eq!(preview.output.format, RenderFormat::Text);

        assert!(matches!(
            DigestConfig::from_lookup(|key| vars.get(key).map(ToString::to_string)).unwrap_err(),
            ConfigError::Missing("SENDER_EMAIL")
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&base_vars()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-test"));
        assert!(!debug.contains("app-password"));
        assert!(debug.contains("<redacted>"));
    }
}
