//! Edition landing page → article list → raw article pages on disk.

use std::path::PathBuf;

use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use econpub_shared::{ArticleIndex, ArticleRef, EconpubError, EditionId, Result};

use crate::EditionFetcher;

/// Container holding the edition's structured data.
const MAIN_CONTENT_SELECTOR: &str = r#"main[role="main"]#content"#;

/// The JSON-LD block listing the edition's articles.
const STRUCTURED_DATA_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Result of downloading every article of an edition.
#[derive(Debug, Clone)]
pub struct FetchedEdition {
    pub edition: EditionId,
    /// Articles in landing-page order.
    pub articles: Vec<ArticleRef>,
    /// Written `.html` files, one per article reference.
    pub files: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Structured data (schema.org ItemList)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemList {
    item_list_element: Option<Vec<ListItem>>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    #[serde(default)]
    position: Option<u32>,
    #[serde(default)]
    item: Option<ListItemTarget>,
}

#[derive(Debug, Deserialize)]
struct ListItemTarget {
    #[serde(default)]
    url: Option<String>,
}

/// Extract the article list from an edition landing page.
///
/// Relative item URLs are resolved against `page_url`. Items without a URL
/// are skipped.
pub fn parse_article_list(html: &str, page_url: &Url) -> Result<Vec<ArticleRef>> {
    let doc = Html::parse_document(html);

    let main_sel = Selector::parse(MAIN_CONTENT_SELECTOR).unwrap();
    let script_sel = Selector::parse(STRUCTURED_DATA_SELECTOR).unwrap();

    let main = doc
        .select(&main_sel)
        .next()
        .ok_or_else(|| EconpubError::parse(format!("{page_url}: no main content region")))?;

    let script = main.select(&script_sel).next().ok_or_else(|| {
        EconpubError::parse(format!("{page_url}: no structured data block in main content"))
    })?;

    let json: String = script.text().collect();
    let list: ItemList = serde_json::from_str(&json)
        .map_err(|e| EconpubError::parse(format!("{page_url}: invalid structured data: {e}")))?;

    let items = list
        .item_list_element
        .ok_or_else(|| EconpubError::parse(format!("{page_url}: structured data has no itemListElement")))?;

    let mut articles = Vec::with_capacity(items.len());
    for item in items {
        let Some(raw_url) = item.item.and_then(|t| t.url) else {
            debug!(position = ?item.position, "list item without URL, skipping");
            continue;
        };

        let resolved = page_url
            .join(&raw_url)
            .map_err(|e| EconpubError::parse(format!("invalid article URL '{raw_url}': {e}")))?;

        articles.push(ArticleRef::from_url(resolved.as_str(), item.position)?);
    }

    Ok(articles)
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

impl EditionFetcher {
    /// Resolve the latest edition and download all of its articles.
    #[instrument(skip_all)]
    pub async fn fetch_all_articles_in_edition(&self) -> Result<FetchedEdition> {
        let edition = self.get_latest_edition().await?;
        self.fetch_edition(&edition).await
    }

    /// Download every article listed on an edition's landing page.
    ///
    /// Articles are fetched one at a time; the first failure aborts the whole
    /// operation. Files already written stay on disk. Re-running overwrites
    /// the same files.
    #[instrument(skip_all, fields(edition = %edition))]
    pub async fn fetch_edition(&self, edition: &EditionId) -> Result<FetchedEdition> {
        let landing_url = self.edition_landing_url(edition)?;
        let landing_html = self.get_text(&landing_url).await?;
        let articles = parse_article_list(&landing_html, &landing_url)?;

        if articles.is_empty() {
            warn!(url = %landing_url, "edition landing page lists no articles");
        }
        info!(count = articles.len(), "fetching articles");

        let paths = self.paths(edition);
        let dir = paths.edition_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| EconpubError::io(&dir, e))?;

        let mut files = Vec::with_capacity(articles.len());
        for (i, article) in articles.iter().enumerate() {
            debug!(url = %article.url, current = i + 1, total = articles.len(), "fetching article");

            let body = self.get_bytes(&article.url).await?;
            let file = paths.article_file(&article.slug);
            tokio::fs::write(&file, &body)
                .await
                .map_err(|e| EconpubError::io(&file, e))?;

            files.push(file);
        }

        let index = ArticleIndex {
            edition: edition.clone(),
            articles: articles.clone(),
        };
        let index_path = paths.article_index_file();
        let json = serde_json::to_string_pretty(&index)
            .map_err(|e| EconpubError::validation(format!("JSON serialization failed: {e}")))?;
        tokio::fs::write(&index_path, json)
            .await
            .map_err(|e| EconpubError::io(&index_path, e))?;

        info!(count = files.len(), dir = %dir.display(), "edition articles saved");

        Ok(FetchedEdition {
            edition: edition.clone(),
            articles,
            files,
        })
    }

    async fn get_text(&self, url: &Url) -> Result<String> {
        let response = self.send(url.as_str()).await?;
        response
            .text()
            .await
            .map_err(|e| EconpubError::Network(format!("{url}: body read failed: {e}")))
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| EconpubError::Network(format!("{url}: body read failed: {e}")))?;
        Ok(body.to_vec())
    }

    /// GET with redirects followed; non-success statuses are errors.
    pub(crate) async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EconpubError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EconpubError::Network(format!("{url}: HTTP {status}")));
        }

        Ok(response)
    }
}
