//! Feed parser.
//!
//! Item text is taken as written in the document: links are only trimmed,
//! never normalized, so the digest links to exactly what the feed published.

use rss::{Channel, Item};

use crate::error::ParseError;

/// One article from the feed.
///
/// Missing fields are kept as empty strings so that an entry without a title
/// or link still makes it into the digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub image_url: Option<String>,
}

impl FeedEntry {
    fn from_item(item: &Item) -> Self {
        let text = |value: Option<&str>| value.map(str::trim).unwrap_or_default().to_string();
        Self {
            title: text(item.title()),
            link: text(item.link()),
            summary: text(item.description()),
            image_url: thumbnail_url(item),
        }
    }
}

/// Parse feed bytes and keep the first `limit` entries in feed order.
pub fn parse_feed(bytes: &[u8], limit: usize) -> Result<Vec<FeedEntry>, ParseError> {
    let channel = Channel::read_from(bytes)?;
    tracing::info!(total = channel.items().len(), limit, "Parsed feed");

    let entries: Vec<FeedEntry> = channel
        .items()
        .iter()
        .take(limit)
        .map(FeedEntry::from_item)
        .collect();

    for (i, entry) in entries.iter().enumerate() {
        tracing::info!(index = i + 1, title = %entry.title, "Processed entry");
    }

    Ok(entries)
}

/// First `media:thumbnail`, else the first image `media:content`.
fn thumbnail_url(item: &Item) -> Option<String> {
    let media = item.extensions().get("media")?;

    let thumbnail = media
        .get("thumbnail")
        .into_iter()
        .flatten()
        .filter_map(|ext| ext.attrs().get("url"))
        .find(|url| !url.trim().is_empty());

    thumbnail
        .or_else(|| {
            media
                .get("content")
                .into_iter()
                .flatten()
                .filter(|ext| {
                    let attrs = ext.attrs();
                    attrs.get("type").is_some_and(|t| t.starts_with("image/"))
                        || attrs.get("medium").is_some_and(|m| m == "image")
                })
                .find_map(|ext| ext.attrs().get("url"))
        })
        .map(|url| url.trim().to_string())
}
