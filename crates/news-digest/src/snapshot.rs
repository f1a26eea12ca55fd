//! CSV snapshot of the latest digest.
//!
//! The file is overwritten on every run; it is a convenience dump, not a
//! history.

use std::path::Path;

use serde::Serialize;

use crate::error::SnapshotError;
use crate::summarizer::DigestItem;

/// One CSV row.
#[derive(Debug, Serialize)]
pub struct SnapshotRow<'a> {
    #[serde(rename = "Headline")]
    pub headline: &'a str,
    #[serde(rename = "Link")]
    pub link: &'a str,
    #[serde(rename = "Summary")]
    pub summary: &'a str,
    pub professional: &'a str,
    pub image: &'a str,
}

impl<'a> From<&'a DigestItem> for SnapshotRow<'a> {
    fn from(item: &'a DigestItem) -> Self {
        Self {
            headline: &item.entry.title,
            link: &item.entry.link,
            summary: &item.entry.summary,
            professional: item.rewritten_summary(),
            image: item.entry.image_url.as_deref().unwrap_or_default(),
        }
    }
}

/// Write the items to `path` as UTF-8 CSV with a header row.
pub fn write_snapshot(path: &Path, items: &[DigestItem]) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    if items.is_empty() {
        writer.write_record(["Headline", "Link", "Summary", "professional", "image"])?;
    }
    for item in items {
        writer.serialize(SnapshotRow::from(item))?;
    }
    writer.flush()?;

    tracing::debug!(path = %path.display(), rows = items.len(), "Wrote snapshot");
    Ok(())
}
