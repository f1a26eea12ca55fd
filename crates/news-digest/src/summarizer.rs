//! Per-entry summary rewriting.
//!
//! Each entry's summary is sent to the chat provider with a fixed rewrite
//! instruction. A failed call never aborts the run: the entry keeps its
//! original text (or a placeholder) and the failure is recorded in the
//! [`SummaryOutcome`] so callers can tell the two cases apart.

use std::sync::Arc;

use crate::ai::{ChatMessage, ChatProvider};
use crate::error::SummarizationError;
use crate::feed::FeedEntry;

/// System prompt for the rewrite call.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant for searching for news articles";

/// Instruction prepended to the source text.
pub const REWRITE_INSTRUCTION: &str =
    "Rewrite the news summary in a very professional and appealing way:";

/// What a failed rewrite is replaced with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Keep the feed's own summary.
    #[default]
    Original,
    /// Use a fixed text.
    Placeholder(String),
}

/// Result of rewriting one summary.
#[derive(Debug)]
pub enum SummaryOutcome {
    /// The API returned a rewrite (already trimmed).
    Rewritten(String),
    /// The call failed and `text` is the fallback.
    FellBack {
        text: String,
        reason: SummarizationError,
    },
}

impl SummaryOutcome {
    /// Text to show in the digest, whichever way it was produced.
    pub fn text(&self) -> &str {
        match self {
            Self::Rewritten(text) | Self::FellBack { text, .. } => text,
        }
    }

    pub fn is_rewritten(&self) -> bool {
        matches!(self, Self::Rewritten(_))
    }
}

/// A feed entry together with its rewritten summary.
#[derive(Debug)]
pub struct DigestItem {
    pub entry: FeedEntry,
    pub outcome: SummaryOutcome,
}

impl DigestItem {
    pub fn new(entry: FeedEntry, outcome: SummaryOutcome) -> Self {
        Self { entry, outcome }
    }

    /// Summary text used by the renderer.
    pub fn rewritten_summary(&self) -> &str {
        self.outcome.text()
    }
}

/// Rewrites entry summaries through a chat provider.
pub struct Summarizer {
    provider: Arc<dyn ChatProvider>,
    fallback: FallbackPolicy,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn ChatProvider>, fallback: FallbackPolicy) -> Self {
        Self { provider, fallback }
    }

    /// Build the two-message conversation for one summary.
    pub fn prompt(text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("{REWRITE_INSTRUCTION} \n\n {text}")),
        ]
    }

    /// Rewrite one summary. Never fails; see [`SummaryOutcome`].
    pub async fn summarize(&self, text: &str) -> SummaryOutcome {
        let result = self
            .provider
            .complete(&Self::prompt(text))
            .await
            .and_then(|answer| {
                let trimmed = answer.trim();
                if trimmed.is_empty() {
                    Err(SummarizationError::EmptyResponse)
                } else {
                    Ok(trimmed.to_string())
                }
            });

        match result {
            Ok(rewritten) => SummaryOutcome::Rewritten(rewritten),
            Err(reason) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    error = %reason,
                    "Summarization failed, using fallback"
                );
                let text = match &self.fallback {
                    FallbackPolicy::Original => text.to_string(),
                    FallbackPolicy::Placeholder(placeholder) => placeholder.clone(),
                };
                SummaryOutcome::FellBack { text, reason }
            }
        }
    }

    /// Rewrite every entry, one request at a time, keeping feed order.
    pub async fn summarize_all(&self, entries: Vec<FeedEntry>) -> Vec<DigestItem> {
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let outcome = self.summarize(&entry.summary).await;
            tracing::debug!(
                title = %entry.title,
                rewritten = outcome.is_rewritten(),
                "Summarized entry"
            );
            items.push(DigestItem::new(entry, outcome));
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers with a canned reply, failing for inputs containing `fail_on`.
    struct StubProvider {
        reply: String,
        fail_on: Option<String>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl StubProvider {
        fn new(reply: &str, fail_on: Option<&str>) -> Self {
            Self {
                reply: reply.to_string(),
                fail_on: fail_on.map(ToString::to_string),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SummarizationError> {
            self.calls.lock().unwrap().push(messages.to_vec());
            let user = &messages[1].content;
            if self.fail_on.as_ref().is_some_and(|f| user.contains(f.as_str())) {
                return Err(SummarizationError::Request("connection reset".to_string()));
            }
            Ok(self.reply.clone())
        }
    }

    fn entry(title: &str, summary: &str) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            link: format!("http://example.com/{title}"),
            summary: summary.to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_prompt_shape() {
        let messages = Summarizer::prompt("Markets rallied.");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system(SYSTEM_PROMPT));
        assert_eq!(
            messages[1].content,
            "Rewrite the news summary in a very professional and appealing way: \n\n Markets rallied."
        );
    }

    #[tokio::test]
    async fn test_rewrite_is_trimmed() {
        let provider = Arc::new(StubProvider::new("  Polished text.\n", None));
        let summarizer = Summarizer::new(provider, FallbackPolicy::Original);

        let outcome = summarizer.summarize("raw").await;
        assert!(outcome.is_rewritten());
        assert_eq!(outcome.text(), "Polished text.");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_original() {
        let provider = Arc::new(StubProvider::new("ok", Some("raw")));
        let summarizer = Summarizer::new(provider, FallbackPolicy::Original);

        let outcome = summarizer.summarize("raw text").await;
        assert!(!outcome.is_rewritten());
        assert_eq!(outcome.text(), "raw text");
        assert!(matches!(
            outcome,
            SummaryOutcome::FellBack {
                reason: SummarizationError::Request(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_placeholder() {
        let provider = Arc::new(StubProvider::new("ok", Some("raw")));
        let summarizer = Summarizer::new(
            provider,
            FallbackPolicy::Placeholder("Summary not available.".to_string()),
        );

        let outcome = summarizer.summarize("raw text").await;
        assert_eq!(outcome.text(), "Summary not available.");
    }

    #[tokio::test]
    async fn test_blank_answer_counts_as_failure() {
        let provider = Arc::new(StubProvider::new("   ", None));
        let summarizer = Summarizer::new(provider, FallbackPolicy::Original);

        let outcome = summarizer.summarize("source").await;
        assert!(matches!(
            outcome,
            SummaryOutcome::FellBack {
                reason: SummarizationError::EmptyResponse,
                ..
            }
        ));
        assert_eq!(outcome.text(), "source");
    }

    #[tokio::test]
    async fn test_summarize_all_isolates_failures() {
        let provider = Arc::new(StubProvider::new("rewritten", Some("second")));
        let summarizer = Summarizer::new(provider.clone(), FallbackPolicy::Original);

        let items = summarizer
            .summarize_all(vec![
                entry("one", "first summary"),
                entry("two", "second summary"),
                entry("three", "third summary"),
            ])
            .await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].rewritten_summary(), "rewritten");
        assert_eq!(items[1].rewritten_summary(), "second summary");
        assert!(!items[1].outcome.is_rewritten());
        assert_eq!(items[2].rewritten_summary(), "rewritten");
        assert_eq!(
            items.iter().map(|i| i.entry.title.as_str()).collect::<Vec<_>>(),
            vec!["one", "two", "three"]
        );
        assert_eq!(provider.calls.lock().unwrap().len(), 3);
    }
}
