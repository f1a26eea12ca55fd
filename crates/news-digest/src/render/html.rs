//! HTML digest page.
//!
//! Produces a page with a `<style>` block; [`super::inline_css`] moves those
//! rules onto the elements before the page is mailed.

use std::fmt::Write;

use super::Digest;

const STYLESHEET: &str = r"
        body {
            font-family: Arial, sans-serif;
            background: #f4f4f9;
            padding: 20px;
            color: #333;
        }
        h2 {
            color: #2a9d8f;
        }
        .news-card {
            background: #fff;
            padding: 15px;
            margin-bottom: 15px;
            border-radius: 10px;
            box-shadow: 0px 2px 5px rgba(0,0,0,0.1);
        }
        .title {
            font-size: 24px;
            font-weight: bold;
            margin-bottom: 5px;
            color: #264653;
        }
        .summary {
            font-size: 14px;
            color: #555;
            margin-bottom: 8px;
        }
        .link {
            display: inline-block;
            margin-top: 8px;
            padding: 6px 12px;
            background: #2a9d8f;
            color: white;
            text-decoration: none;
            border-radius: 6px;
        }
        .link:hover {
            background: #21867a;
        }
        .news-image {
            max-width: 100%;
            height: auto;
            border-radius: 8px;
            margin-bottom: 10px;
        }
";

/// Render the digest as a styled HTML page.
///
/// Entry text is inserted verbatim unless `escape` is set; links and image
/// URLs are always inserted verbatim.
pub fn render_html(digest: &Digest, title: &str, escape: bool) -> String {
    let text = |s: &str| {
        if escape {
            html_escape(s)
        } else {
            s.to_string()
        }
    };

    let mut cards = String::new();
    for item in &digest.items {
        cards.push_str(r#"<div class="news-card">"#);
        if let Some(image_url) = &item.entry.image_url {
            let _ = write!(
                cards,
                r#"<img src="{image_url}" class="news-image" alt="News Image">"#
            );
        }
        let _ = write!(
            cards,
            r#"
              <div class="title">{title}</div>
              <div class="summary">{summary}</div>
              <a class="link" href="{link}">Read Full Article</a>
            </div>
"#,
            title = text(&item.entry.title),
            summary = text(item.rewritten_summary()),
            link = item.entry.link,
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <meta charset="utf-8">
        <style>{STYLESHEET}</style>
    </head>
    <body>
        <h2>🌍 {heading}</h2>
{cards}    </body>
</html>
"#,
        heading = text(title),
    )
}

/// Simple HTML escaping for entry text.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
