//! Core domain types for econpub editions.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{EconpubError, Result};

/// Directory (under the editions root) holding assembled Markdown documents.
const MARKDOWN_DIR: &str = "markdown_editions";

/// Directory (under the editions root) holding compiled e-books.
const EPUB_DIR: &str = "epubs";

/// File name prefix shared by the Markdown document and the e-book.
const FILE_PREFIX: &str = "economist_weekly_";

/// Per-edition article index file name.
const ARTICLE_INDEX_FILE: &str = "articles.json";

// ---------------------------------------------------------------------------
// EditionId
// ---------------------------------------------------------------------------

/// Identifier of one weekly edition, e.g. `2024-08-31`.
///
/// Taken from the last path segment of the edition URL and used verbatim as a
/// directory name, so it never contains path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EditionId(String);

impl EditionId {
    /// Validate and wrap an edition token.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let token = token.trim();

        if token.is_empty() || token == "." || token == ".." {
            return Err(EconpubError::validation(format!(
                "invalid edition id '{token}'"
            )));
        }
        if token.contains(['/', '\\']) {
            return Err(EconpubError::validation(format!(
                "edition id '{token}' must not contain path separators"
            )));
        }

        Ok(Self(token.to_string()))
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EditionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for EditionId {
    type Err = EconpubError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for EditionId {
    type Error = EconpubError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<EditionId> for String {
    fn from(id: EditionId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// EditionPaths
// ---------------------------------------------------------------------------

/// Every on-disk location belonging to one edition.
///
/// ```text
/// <root>/
/// ├── <edition>/
/// │   ├── articles.json
/// │   ├── <article-slug>.html
/// │   └── <image-slug>.png
/// ├── markdown_editions/economist_weekly_<edition>.md
/// └── epubs/economist_weekly_<edition>.epub
/// ```
#[derive(Debug, Clone)]
pub struct EditionPaths {
    root: PathBuf,
    edition: EditionId,
}

impl EditionPaths {
    pub fn new(root: impl Into<PathBuf>, edition: EditionId) -> Self {
        Self {
            root: root.into(),
            edition,
        }
    }

    pub fn edition(&self) -> &EditionId {
        &self.edition
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for raw article pages and downloaded images.
    pub fn edition_dir(&self) -> PathBuf {
        self.root.join(self.edition.as_str())
    }

    /// Raw HTML file for an article slug.
    pub fn article_file(&self, slug: &str) -> PathBuf {
        self.edition_dir().join(format!("{slug}.html"))
    }

    /// Downloaded image file for an image slug. The `.png` suffix is fixed,
    /// whatever the source encoding.
    pub fn image_file(&self, slug: &str) -> PathBuf {
        self.edition_dir().join(format!("{slug}.png"))
    }

    /// Persisted landing-page order of the edition's articles.
    pub fn article_index_file(&self) -> PathBuf {
        self.edition_dir().join(ARTICLE_INDEX_FILE)
    }

    pub fn markdown_dir(&self) -> PathBuf {
        self.root.join(MARKDOWN_DIR)
    }

    pub fn markdown_file(&self) -> PathBuf {
        self.markdown_dir()
            .join(format!("{FILE_PREFIX}{}.md", self.edition))
    }

    pub fn epub_dir(&self) -> PathBuf {
        self.root.join(EPUB_DIR)
    }

    pub fn epub_file(&self) -> PathBuf {
        self.epub_dir()
            .join(format!("{FILE_PREFIX}{}.epub", self.edition))
    }

    /// Reference to an image in the edition dir, relative to the Markdown document.
    pub fn image_reference(&self, image_path: &Path) -> String {
        match image_path.file_name() {
            Some(name) => format!("../{}/{}", self.edition, name.to_string_lossy()),
            None => image_path.to_string_lossy().into_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// ArticleRef / ArticleIndex
// ---------------------------------------------------------------------------

/// One article listed on an edition's landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    /// Absolute article URL.
    pub url: String,
    /// Last path segment of the URL; names the saved `.html` file.
    pub slug: String,
    /// `position` from the structured data list, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl ArticleRef {
    /// Build a reference from a URL, deriving the slug from its last segment.
    pub fn from_url(url: &str, position: Option<u32>) -> Result<Self> {
        let slug = url_last_segment(url)
            .ok_or_else(|| EconpubError::parse(format!("article URL has no path segment: {url}")))?;
        Ok(Self {
            url: url.to_string(),
            slug,
            position,
        })
    }
}

/// The `articles.json` file: landing-page order of an edition's articles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleIndex {
    pub edition: EditionId,
    pub articles: Vec<ArticleRef>,
}

/// Last non-empty path segment of a URL (query and fragment ignored).
///
/// Percent-escapes are decoded so the segment is usable as a file name and
/// as a local Markdown reference. Decoded separators become `_`; a segment
/// that does not decode to UTF-8 or decodes to `.`/`..` is kept as written.
pub fn url_last_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let raw = parsed.path_segments()?.rev().find(|s| !s.is_empty())?;

    let decoded = match urlencoding::decode(raw) {
        Ok(decoded) => decoded.replace(['/', '\\'], "_"),
        Err(_) => return Some(raw.to_string()),
    };
    if decoded.is_empty() || decoded == "." || decoded == ".." {
        return Some(raw.to_string());
    }
    Some(decoded)
}
