//! Edition document assembler.
//!
//! Reads an edition's saved article pages, extracts each article, downloads
//! the images it references, and writes one Markdown document for the whole
//! edition.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use url::Url;

use econpub_fetcher::ImageSource;
use econpub_markdown::{MarkdownDocument, convert_fragment};
use econpub_shared::{ArticleIndex, EconpubError, EditionPaths, Result};

use crate::extract::{ArticleContent, ContentBlock, Extracted, extract_article};
use crate::pipeline::ProgressReporter;

/// Title prefix of the assembled document.
const DOCUMENT_TITLE_PREFIX: &str = "Economist Weekly - ";

/// Output from a successful assembly pass.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    /// Path of the written Markdown document.
    pub path: PathBuf,
    /// Number of article sections in the document.
    pub articles_written: usize,
    /// Saved pages skipped because they carry no article content.
    pub articles_skipped: Vec<PathBuf>,
}

/// Write the edition's Markdown document.
///
/// Articles are taken in landing-page order when `articles.json` exists,
/// otherwise in file-name order. The document is built in memory and only
/// written once every article has been processed: an unrecognized block or a
/// failed image download aborts the pass and leaves no document behind.
#[instrument(skip_all, fields(edition = %paths.edition()))]
pub async fn write_articles_to_markdown<S: ImageSource>(
    paths: &EditionPaths,
    images: &S,
    base_url: Option<&Url>,
    progress: &dyn ProgressReporter,
) -> Result<AssembledDocument> {
    let files = article_files(paths)?;
    let total = files.len();
    info!(count = total, "assembling edition document");

    let mut doc = MarkdownDocument::new(format!("{DOCUMENT_TITLE_PREFIX}{}", paths.edition()));
    let mut articles_written = 0;
    let mut articles_skipped = Vec::new();

    for (i, file) in files.iter().enumerate() {
        let html = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| EconpubError::io(file, e))?;

        let extracted = extract_article(&html).map_err(|e| match e {
            EconpubError::Parse { message } => {
                EconpubError::parse(format!("{}: {message}", file.display()))
            }
            other => other,
        })?;

        match extracted {
            Extracted::Unsupported => {
                warn!(file = %file.display(), "unsupported article type, skipping");
                articles_skipped.push(file.clone());
            }
            Extracted::Article(article) => {
                let name = file_label(file);
                render_article(&mut doc, &article, &name, paths, images, base_url).await?;
                articles_written += 1;
                progress.article_rendered(&article.headline, i + 1, total);
            }
        }
    }

    let path = paths.markdown_file();
    doc.write_to(&path)?;

    info!(
        path = %path.display(),
        articles_written,
        articles_skipped = articles_skipped.len(),
        "edition document written"
    );

    Ok(AssembledDocument {
        path,
        articles_written,
        articles_skipped,
    })
}

/// Append one article section to the document.
async fn render_article<S: ImageSource>(
    doc: &mut MarkdownDocument,
    article: &ArticleContent,
    name: &str,
    paths: &EditionPaths,
    images: &S,
    base_url: Option<&Url>,
) -> Result<()> {
    doc.new_header(1, &article.headline);
    doc.new_bold_italic_line(&article.rubric);
    if let Some(line) = article.section_line() {
        doc.new_emphasis_line(&line);
    }

    if let Some(url) = &article.lead_image {
        embed_image(doc, paths, images, url).await?;
    }

    for block in &article.body {
        match block {
            ContentBlock::Infobox => {
                info!(article = name, "skipping infobox");
            }
            ContentBlock::Crosshead { text } => {
                doc.new_header(2, text);
            }
            ContentBlock::Image { url } => {
                embed_image(doc, paths, images, url).await?;
            }
            ContentBlock::Infographic { fallback_url } => {
                embed_image(doc, paths, images, fallback_url).await?;
            }
            ContentBlock::Divider => {
                doc.page_break();
            }
            ContentBlock::GenericEmbed => {}
            ContentBlock::Text { html } => {
                let markdown = convert_fragment(html, base_url)?;
                doc.new_paragraph(&markdown);
            }
            ContentBlock::Unrecognized { kind } => {
                return Err(EconpubError::UnrecognizedBlock {
                    article: name.to_string(),
                    kind: kind.clone(),
                });
            }
        }
    }

    doc.page_break();
    debug!(article = name, blocks = article.body.len(), "article rendered");
    Ok(())
}

async fn embed_image<S: ImageSource>(
    doc: &mut MarkdownDocument,
    paths: &EditionPaths,
    images: &S,
    url: &str,
) -> Result<()> {
    let saved = images.fetch_image(paths.edition(), url).await?;
    doc.new_inline_image("", &paths.image_reference(&saved));
    Ok(())
}

/// Saved article pages of an edition, in document order.
///
/// Uses `articles.json` when present (duplicates dropped, missing files
/// skipped with a warning); otherwise every `*.html` file sorted by name.
pub fn article_files(paths: &EditionPaths) -> Result<Vec<PathBuf>> {
    let index_path = paths.article_index_file();

    if index_path.exists() {
        let content = std::fs::read_to_string(&index_path)
            .map_err(|e| EconpubError::io(&index_path, e))?;
        let index: ArticleIndex = serde_json::from_str(&content).map_err(|e| {
            EconpubError::parse(format!("invalid {}: {e}", index_path.display()))
        })?;

        let mut seen = HashSet::new();
        let mut files = Vec::with_capacity(index.articles.len());
        for article in &index.articles {
            if !seen.insert(article.slug.as_str()) {
                continue;
            }
            let file = paths.article_file(&article.slug);
            if file.exists() {
                files.push(file);
            } else {
                warn!(file = %file.display(), "indexed article missing on disk, skipping");
            }
        }
        return Ok(files);
    }

    let dir = paths.edition_dir();
    debug!(dir = %dir.display(), "no article index, listing directory");

    let entries = std::fs::read_dir(&dir).map_err(|e| EconpubError::io(&dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| EconpubError::io(&dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_label(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
