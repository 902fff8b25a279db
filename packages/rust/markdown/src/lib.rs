//! HTML-to-Markdown conversion and document building.
//!
//! Converts article HTML fragments to Markdown using the `htmd` crate, then
//! applies cleanup passes. [`MarkdownDocument`] collects the converted pieces
//! into the single per-edition document.

mod cleanup;
mod document;

use tracing::{debug, instrument};
use url::Url;

use econpub_shared::{EconpubError, Result};

pub use document::{MarkdownDocument, PAGE_BREAK};

/// Tags whose content never belongs in a passage.
const SKIP_TAGS: [&str; 6] = ["script", "style", "nav", "iframe", "noscript", "svg"];

/// Convert a rich-text HTML fragment into Markdown.
///
/// Relative links are resolved against `base_url` when given. The result has
/// no leading or trailing blank lines.
#[instrument(skip_all, fields(len = html.len()))]
pub fn convert_fragment(html: &str, base_url: Option<&Url>) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();

    let raw_markdown = converter
        .convert(html)
        .map_err(|e| EconpubError::Conversion(format!("htmd conversion failed: {e}")))?;

    let cleaned = cleanup::run_pipeline(&raw_markdown, base_url);
    debug!(raw_len = raw_markdown.len(), final_len = cleaned.len(), "fragment converted");

    Ok(cleaned)
}
