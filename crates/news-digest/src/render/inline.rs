//! CSS inlining for HTML email clients that strip `<style>` blocks.

use css_inline::CSSInliner;

use crate::error::RenderError;

/// Apply every `<style>` rule as a `style` attribute and drop the block.
pub fn inline_css(html: &str) -> Result<String, RenderError> {
    CSSInliner::options()
        .keep_style_tags(false)
        .build()
        .inline(html)
        .map_err(|e| RenderError(e.to_string()))
}
