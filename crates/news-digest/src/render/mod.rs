//! Digest rendering.
//!
//! Rendering is a pure function of the [`Digest`]: the same items in the
//! same order always produce byte-identical output.

mod html;
mod inline;
mod text;

use std::fmt;
use std::str::FromStr;

pub use html::render_html;
pub use inline::inline_css;
pub use text::render_text;

use crate::config::OutputConfig;
use crate::error::RenderError;
use crate::summarizer::DigestItem;

/// Ordered collection of summarized entries for one email.
#[derive(Debug, Default)]
pub struct Digest {
    pub items: Vec<DigestItem>,
}

impl Digest {
    pub fn new(items: Vec<DigestItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Output flavour of the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFormat {
    /// Styled HTML page with inlined CSS, plus a plain-text alternative.
    #[default]
    Html,
    /// Plain text only.
    Text,
}

impl FromStr for RenderFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "text" | "plain" => Ok(Self::Text),
            other => Err(format!("expected html or text, got {other:?}")),
        }
    }
}

impl fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => f.write_str("html"),
            Self::Text => f.write_str("text"),
        }
    }
}

/// Rendering settings.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub format: RenderFormat,
    /// Page heading (HTML only).
    pub title: String,
    /// Escape entry text before interpolating it into HTML.
    pub escape_html: bool,
}

impl From<&OutputConfig> for RenderOptions {
    fn from(config: &OutputConfig) -> Self {
        Self {
            format: config.format,
            title: config.title.clone(),
            escape_html: config.escape_html,
        }
    }
}

/// A digest ready to be mailed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDigest {
    /// Plain-text rendering, always present.
    pub text: String,
    /// Inlined HTML document, only for [`RenderFormat::Html`].
    pub html: Option<String>,
}

impl RenderedDigest {
    pub fn text(text: String) -> Self {
        Self { text, html: None }
    }

    pub fn format(&self) -> RenderFormat {
        if self.html.is_some() {
            RenderFormat::Html
        } else {
            RenderFormat::Text
        }
    }

    /// The primary body: HTML when present, text otherwise.
    pub fn body(&self) -> &str {
        self.html.as_deref().unwrap_or(&self.text)
    }
}

/// Render the digest in the requested format.
pub fn render(digest: &Digest, options: &RenderOptions) -> Result<RenderedDigest, RenderError> {
    let text = render_text(digest);
    let html = match options.format {
        RenderFormat::Text => None,
        RenderFormat::Html => {
            let page = render_html(digest, &options.title, options.escape_html);
            Some(inline_css(&page)?)
        }
    };

    tracing::debug!(
        items = digest.len(),
        format = %options.format,
        "Rendered digest"
    );

    Ok(RenderedDigest { text, html })
}
