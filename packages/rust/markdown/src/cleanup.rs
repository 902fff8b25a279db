//! Post-conversion cleanup for article passages.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! Passages end up as plain Markdown paragraphs: no stray tags, absolute
//! links, no trailing whitespace, single blank lines between paragraphs.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Run the full cleanup pipeline on a converted passage.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let mut result = md.replace("\r\n", "\n");

    result = strip_leftover_html(&result);
    result = resolve_links(&result, base_url);
    result = normalize_whitespace(&result);
    result = clean_blank_lines(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Strip leftover HTML tags
// ---------------------------------------------------------------------------

/// Remove inline/container tags that survived the conversion, keeping their text.
///
/// Drop caps (`<span data-caps="initial">T</span>he`) are the usual offender.
fn strip_leftover_html(md: &str) -> String {
    static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"</?(?:div|span|small|section|article|aside|header|footer|figure|figcaption|time)(?:\s[^>]*)?>",
        )
        .expect("valid regex")
    });

    HTML_TAG_RE.replace_all(md, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Resolve relative links
// ---------------------------------------------------------------------------

/// Resolve relative URLs in Markdown links against the publication origin.
fn resolve_links(md: &str, base_url: Option<&Url>) -> String {
    let Some(base) = base_url else {
        return md.to_string();
    };

    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

    LINK_RE
        .replace_all(md, |caps: &regex::Captures| {
            let text = &caps[1];
            let href = &caps[2];

            // Images keep their reference as written.
            let start = caps.get(0).map_or(0, |m| m.start());
            if start > 0 && md.as_bytes()[start - 1] == b'!' {
                return caps[0].to_string();
            }

            if href.starts_with("http://")
                || href.starts_with("https://")
                || href.starts_with('#')
                || href.starts_with("mailto:")
            {
                return caps[0].to_string();
            }

            match base.join(href) {
                Ok(resolved) => format!("[{text}]({resolved})"),
                Err(_) => caps[0].to_string(),
            }
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Normalize whitespace
// ---------------------------------------------------------------------------

/// Trim trailing whitespace on every line.
fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 4: Collapse blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines into a single blank line.
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_leftover_html_keeps_text() {
        let input = r#"<span data-caps="initial">W</span>hen the <small>IMF</small> met"#;
        assert_eq!(strip_leftover_html(input), "When the IMF met");
    }

    #[test]
    fn strip_leftover_html_leaves_markdown_alone() {
        let input = "Plain *text* with [a link](https://example.com)";
        assert_eq!(strip_leftover_html(input), input);
    }

    #[test]
    fn resolve_links_relative_resolved() {
        let base = Url::parse("https://www.economist.com/").unwrap();
        let input = "See [our briefing](/briefing/2024/08/29/story) for more";
        assert_eq!(
            resolve_links(input, Some(&base)),
            "See [our briefing](https://www.economist.com/briefing/2024/08/29/story) for more"
        );
    }

    #[test]
    fn resolve_links_absolute_and_anchor_untouched() {
        let base = Url::parse("https://www.economist.com/").unwrap();
        let input = "[x](https://other.org/p) and [y](#note)";
        assert_eq!(resolve_links(input, Some(&base)), input);
    }

    #[test]
    fn resolve_links_skips_images() {
        let base = Url::parse("https://www.economist.com/").unwrap();
        let input = "![](../2024-08-31/chart.png)";
        assert_eq!(resolve_links(input, Some(&base)), input);
    }

    #[test]
    fn resolve_links_without_base_is_noop() {
        let input = "[rel](/a/b)";
        assert_eq!(resolve_links(input, None), input);
    }

    #[test]
    fn clean_blank_lines_collapses_to_one() {
        assert_eq!(clean_blank_lines("One\n\n\n\nTwo"), "One\n\nTwo");
        assert_eq!(clean_blank_lines("One\n\nTwo"), "One\n\nTwo");
    }

    #[test]
    fn full_pipeline_trims_and_normalizes() {
        let input = "\n\nFirst line   \r\n\r\n\r\n\r\n<div>Second</div> line\t\n\n";
        assert_eq!(run_pipeline(input, None), "First line\n\nSecond line");
    }
}
