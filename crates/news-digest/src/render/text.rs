//! Plain-text digest.

use super::Digest;

/// `"{title} ({link})\n{summary}"` per item, separated by a blank line.
pub fn render_text(digest: &Digest) -> String {
    digest
        .items
        .iter()
        .map(|item| {
            format!(
                "{} ({})\n{}",
                item.entry.title,
                item.entry.link,
                item.rewritten_summary()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SummarizationError;
    use crate::feed::FeedEntry;
    use crate::summarizer::{DigestItem, SummaryOutcome};

    fn item(title: &str, link: &str, outcome: SummaryOutcome) -> DigestItem {
        DigestItem::new(
            FeedEntry {
                title: title.to_string(),
                link: link.to_string(),
                summary: "original".to_string(),
                image_url: None,
            },
            outcome,
        )
    }

    #[test]
    fn test_layout() {
        let digest = Digest::new(vec![
            item("A", "http://x", SummaryOutcome::Rewritten("one".to_string())),
            item(
                "B",
                "http://y",
                SummaryOutcome::FellBack {
                    text: "original".to_string(),
                    reason: SummarizationError::EmptyResponse,
                },
            ),
        ]);

        assert_eq!(
            render_text(&digest),
            "A (http://x)\none\n\nB (http://y)\noriginal"
        );
    }

    #[test]
    fn test_empty_digest() {
        assert_eq!(render_text(&Digest::default()), "");
    }
}
