//! In-memory Markdown document builder.
//!
//! Every element is emitted as its own block followed by one blank line, so
//! element order in the builder is element order in the file.

use std::path::Path;

use tracing::debug;

use econpub_shared::{EconpubError, Result};

/// Marker emitted for a page break.
pub const PAGE_BREAK: &str = "{pagebreak}";

/// A Markdown document assembled block by block, rendered once at the end.
#[derive(Debug, Clone, Default)]
pub struct MarkdownDocument {
    title: Option<String>,
    body: String,
}

impl MarkdownDocument {
    /// Empty document with a YAML `title` metadata block.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: String::new(),
        }
    }

    /// ATX heading; levels outside 1..=6 are clamped.
    pub fn new_header(&mut self, level: u8, text: &str) -> &mut Self {
        let hashes = "#".repeat(usize::from(level.clamp(1, 6)));
        self.push_block(&format!("{hashes} {}", single_line(text)))
    }

    /// Plain paragraph. Multi-line text is kept as-is.
    pub fn new_paragraph(&mut self, text: &str) -> &mut Self {
        let text = text.trim();
        if text.is_empty() {
            return self;
        }
        self.push_block(text)
    }

    /// Italic line; nothing is emitted for empty text.
    pub fn new_emphasis_line(&mut self, text: &str) -> &mut Self {
        self.wrapped_line("*", text)
    }

    /// Bold-italic line; nothing is emitted for empty text.
    pub fn new_bold_italic_line(&mut self, text: &str) -> &mut Self {
        self.wrapped_line("***", text)
    }

    /// Inline image reference.
    pub fn new_inline_image(&mut self, alt: &str, path: &str) -> &mut Self {
        self.push_block(&format!("![{}]({})", single_line(alt), path.replace(' ', "%20")))
    }

    /// Page-break marker followed by a blank line.
    pub fn page_break(&mut self) -> &mut Self {
        self.push_block(PAGE_BREAK)
    }

    /// The rendered document.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(title) = &self.title {
            out.push_str("---\n");
            out.push_str(&format!("title: \"{}\"\n", escape_yaml_string(title)));
            out.push_str("---\n\n");
        }
        out.push_str(&self.body);
        out
    }

    /// Render and write to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EconpubError::io(parent, e))?;
        }

        let rendered = self.render();
        std::fs::write(path, &rendered).map_err(|e| EconpubError::io(path, e))?;
        debug!(path = %path.display(), bytes = rendered.len(), "wrote markdown document");
        Ok(())
    }

    fn wrapped_line(&mut self, marker: &str, text: &str) -> &mut Self {
        let text = single_line(text);
        if text.is_empty() {
            return self;
        }
        self.push_block(&format!("{marker}{text}{marker}"))
    }

    fn push_block(&mut self, block: &str) -> &mut Self {
        self.body.push_str(block);
        self.body.push_str("\n\n");
        self
    }
}

/// Collapse internal newlines so the text fits on one Markdown line.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape special characters in a YAML string value.
fn escape_yaml_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_title_metadata() {
        let doc = MarkdownDocument::new("Economist Weekly - 2024-08-31");
        assert_eq!(
            doc.render(),
            "---\ntitle: \"Economist Weekly - 2024-08-31\"\n---\n\n"
        );
    }

    #[test]
    fn title_is_yaml_escaped() {
        let doc = MarkdownDocument::new(r#"The "best" \ worst"#);
        assert!(doc.render().contains(r#"title: "The \"best\" \\ worst""#));
    }

    #[test]
    fn blocks_in_order_with_blank_lines() {
        let mut doc = MarkdownDocument::default();
        doc.new_header(1, "Headline")
            .new_bold_italic_line("A rubric")
            .new_emphasis_line("Leaders")
            .new_inline_image("", "../2024-08-31/pic.jpg.png")
            .new_header(2, "Part two")
            .new_paragraph("Some text.");

        assert_eq!(
            doc.render(),
            "# Headline\n\n***A rubric***\n\n*Leaders*\n\n![](../2024-08-31/pic.jpg.png)\n\n## Part two\n\nSome text.\n\n"
        );
    }

    #[test]
    fn page_break_is_marker_plus_blank_line() {
        let mut doc = MarkdownDocument::default();
        doc.new_paragraph("before").page_break().new_paragraph("after");
        assert_eq!(doc.render(), "before\n\n{pagebreak}\n\nafter\n\n");
    }

    #[test]
    fn empty_lines_are_omitted() {
        let mut doc = MarkdownDocument::default();
        doc.new_emphasis_line("  ")
            .new_bold_italic_line("")
            .new_paragraph("\n");
        assert_eq!(doc.render(), "");
    }

    #[test]
    fn header_level_clamped_and_single_line() {
        let mut doc = MarkdownDocument::default();
        doc.new_header(9, "Two\nlines");
        assert_eq!(doc.render(), "###### Two lines\n\n");
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("econpub-doc-test-{}", uuid::Uuid::now_v7()));
        let path = dir.join("markdown_editions").join("doc.md");

        let mut doc = MarkdownDocument::new("T");
        doc.new_header(1, "H");
        doc.write_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("# H\n\n"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
