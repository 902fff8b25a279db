//! End-to-end pipeline: edition lookup → article download → Markdown → EPUB.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use econpub_fetcher::{EditionFetcher, FetchedEdition};
use econpub_shared::{EditionId, EditionPaths, PipelineConfig, Result};

use crate::assembler::{self, AssembledDocument};
use crate::compiler;

/// Result of a full "latest edition to EPUB" run.
#[derive(Debug)]
pub struct PipelineResult {
    /// Edition that was built.
    pub edition: EditionId,
    /// Path of the assembled Markdown document.
    pub markdown_path: PathBuf,
    /// Path of the compiled EPUB.
    pub epub_path: PathBuf,
    /// Number of article pages downloaded.
    pub articles_fetched: usize,
    /// Number of article sections in the document.
    pub articles_written: usize,
    /// Saved pages skipped because they carry no article content.
    pub articles_skipped: Vec<PathBuf>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after an article section is added to the document.
    fn article_rendered(&self, headline: &str, current: usize, total: usize);
    /// Called when the full pipeline completes.
    fn done(&self, result: &PipelineResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn article_rendered(&self, _headline: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &PipelineResult) {}
}

/// The edition pipeline, bound to one configuration and one HTTP session.
///
/// Each stage is also callable on its own.
pub struct Pipeline {
    config: PipelineConfig,
    fetcher: EditionFetcher,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let fetcher = EditionFetcher::new(&config)?;
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Filesystem layout for an edition.
    pub fn paths(&self, edition: &EditionId) -> EditionPaths {
        self.fetcher.paths(edition)
    }

    /// Identifier of the edition currently served as "this week".
    pub async fn get_latest_edition(&self) -> Result<EditionId> {
        self.fetcher.get_latest_edition().await
    }

    /// Download every article of the latest edition.
    pub async fn fetch_all_articles_in_edition(&self) -> Result<FetchedEdition> {
        self.fetcher.fetch_all_articles_in_edition().await
    }

    /// Download every article of a given edition.
    pub async fn fetch_edition(&self, edition: &EditionId) -> Result<FetchedEdition> {
        self.fetcher.fetch_edition(edition).await
    }

    /// Assemble the Markdown document from an edition's saved pages.
    pub async fn write_articles_to_markdown(
        &self,
        edition: &EditionId,
        progress: &dyn ProgressReporter,
    ) -> Result<AssembledDocument> {
        let paths = self.paths(edition);
        assembler::write_articles_to_markdown(
            &paths,
            &self.fetcher,
            Some(&self.config.base_url),
            progress,
        )
        .await
    }

    /// Compile an already assembled edition document into an EPUB.
    pub fn create_epub(&self, edition: &EditionId) -> Result<PathBuf> {
        compiler::create_epub(&self.paths(edition), &self.config.compiler)
    }

    /// Resolve the latest edition, download it, assemble it, and compile it.
    ///
    /// The edition is resolved once and every later stage works on that
    /// identifier. Any stage failing stops the run.
    #[instrument(skip_all, fields(root = %self.config.editions_root.display()))]
    pub async fn create_latest_edition_epub(
        &self,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineResult> {
        let start = Instant::now();

        // --- Phase 1: Edition lookup ---
        progress.phase("Resolving latest edition");
        let edition = self.get_latest_edition().await?;
        info!(%edition, "building edition");

        // --- Phase 2: Download articles ---
        progress.phase("Downloading articles");
        let fetched = self.fetch_edition(&edition).await?;

        // --- Phase 3: Assemble Markdown ---
        progress.phase("Assembling Markdown");
        let document = self.write_articles_to_markdown(&edition, progress).await?;

        // --- Phase 4: Compile EPUB ---
        progress.phase("Compiling EPUB");
        let epub_path = self.create_epub(&edition)?;

        let result = PipelineResult {
            edition,
            markdown_path: document.path,
            epub_path,
            articles_fetched: fetched.files.len(),
            articles_written: document.articles_written,
            articles_skipped: document.articles_skipped,
            elapsed: start.elapsed(),
        };

        info!(
            edition = %result.edition,
            articles = result.articles_written,
            skipped = result.articles_skipped.len(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "edition pipeline complete"
        );

        progress.done(&result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use econpub_shared::{CompilerConfig, EconpubError};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, compiler: &str) -> PipelineConfig {
        PipelineConfig {
            editions_root: std::env::temp_dir()
                .join(format!("econpub-pipeline-test-{}", uuid::Uuid::now_v7())),
            base_url: Url::parse(&server.uri()).unwrap(),
            user_agent: "econpub-test/1.0".into(),
            cookie: "economist_session=abc123".into(),
            request_timeout: None,
            compiler: CompilerConfig {
                program: compiler.into(),
                ..Default::default()
            },
        }
    }

    fn landing_page(urls: &[String]) -> String {
        let items: Vec<_> = urls
            .iter()
            .enumerate()
            .map(|(i, url)| json!({ "position": i + 1, "item": { "url": url } }))
            .collect();
        let list = json!({ "@type": "ItemList", "itemListElement": items });
        format!(
            r#"<html><body><main role="main" id="content"><script type="application/ld+json">{list}</script></main></body></html>"#
        )
    }

    fn article_page(content: serde_json::Value) -> String {
        let state = json!({ "props": { "pageProps": { "cp2Content": content } } });
        format!(r#"<html><body><script id="__NEXT_DATA__" type="application/json">{state}</script></body></html>"#)
    }

    struct Recording(std::sync::Mutex<Vec<String>>);

    impl ProgressReporter for Recording {
        fn phase(&self, name: &str) {
            self.0.lock().unwrap().push(name.to_string());
        }
        fn article_rendered(&self, headline: &str, _current: usize, _total: usize) {
            self.0.lock().unwrap().push(format!("article:{headline}"));
        }
        fn done(&self, result: &PipelineResult) {
            self.0.lock().unwrap().push(format!("done:{}", result.edition));
        }
    }

    async fn mount_edition(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/weeklyedition"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "/weeklyedition/2024-08-31"),
            )
            .expect(1)
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/weeklyedition/2024-08-31"))
            .respond_with(ResponseTemplate::new(200).set_body_string(landing_page(&[
                format!("{}/leaders/2024/08/29/a", server.uri()),
                "/culture/2024/08/29/b".to_string(),
            ])))
            .expect(1)
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/leaders/2024/08/29/a"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page(json!({
                "headline": "Test",
                "body": [
                    { "type": "CROSSHEAD", "text": "Part Two" },
                    { "type": "IMAGE", "url": format!("{}/media/chart.jpg", server.uri()) }
                ]
            }))))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/culture/2024/08/29/b"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>Podcast</body></html>"),
            )
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/media/chart.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
            .mount(server)
            .await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn latest_edition_end_to_end() {
        let server = MockServer::start().await;
        mount_edition(&server).await;

        let pipeline = Pipeline::new(config_for(&server, "true")).unwrap();
        let progress = Recording(Default::default());
        let result = pipeline.create_latest_edition_epub(&progress).await.unwrap();

        let paths = pipeline.paths(&result.edition);
        assert_eq!(result.edition.as_str(), "2024-08-31");
        assert_eq!(result.articles_fetched, 2);
        assert_eq!(result.articles_written, 1);
        assert_eq!(result.articles_skipped, vec![paths.article_file("b")]);
        assert_eq!(result.markdown_path, paths.markdown_file());
        assert_eq!(result.epub_path, paths.epub_file());

        let rendered = std::fs::read_to_string(&result.markdown_path).unwrap();
        assert_eq!(rendered.matches("\n# ").count(), 1);
        assert!(rendered.contains(
            "# Test\n\n## Part Two\n\n![](../2024-08-31/chart.jpg.png)\n\n{pagebreak}\n\n"
        ));
        assert_eq!(
            std::fs::read(paths.image_file("chart.jpg")).unwrap(),
            vec![0x89, b'P', b'N', b'G']
        );

        let events = progress.0.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "Resolving latest edition",
                "Downloading articles",
                "Assembling Markdown",
                "article:Test",
                "Compiling EPUB",
                "done:2024-08-31",
            ]
        );

        let _ = std::fs::remove_dir_all(&pipeline.config().editions_root);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn compiler_failure_keeps_markdown() {
        let server = MockServer::start().await;
        mount_edition(&server).await;

        let pipeline = Pipeline::new(config_for(&server, "false")).unwrap();
        let err = pipeline
            .create_latest_edition_epub(&SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, EconpubError::Compiler { status: 1, .. }));

        let edition = EditionId::new("2024-08-31").unwrap();
        assert!(pipeline.paths(&edition).markdown_file().is_file());

        let _ = std::fs::remove_dir_all(&pipeline.config().editions_root);
    }

    #[tokio::test]
    async fn rejected_session_stops_before_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weeklyedition"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let pipeline = Pipeline::new(config_for(&server, "true")).unwrap();
        let err = pipeline
            .create_latest_edition_epub(&SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, EconpubError::SessionRejected { status: 200 }));
        assert!(!pipeline.config().editions_root.exists());
    }

    #[tokio::test]
    async fn assemble_stage_runs_alone() {
        let server = MockServer::start().await;
        let pipeline = Pipeline::new(config_for(&server, "true")).unwrap();
        let edition = EditionId::new("2024-09-07").unwrap();
        let paths = pipeline.paths(&edition);

        std::fs::create_dir_all(paths.edition_dir()).unwrap();
        std::fs::write(
            paths.article_file("saved"),
            article_page(json!({
                "headline": "Saved",
                "body": [ { "type": "PARAGRAPH", "textHtml": "<p>See <a href=\"/a/b\">here</a>.</p>" } ]
            })),
        )
        .unwrap();

        let document = pipeline
            .write_articles_to_markdown(&edition, &SilentProgress)
            .await
            .unwrap();
        let rendered = std::fs::read_to_string(&document.path).unwrap();
        assert!(rendered.contains(&format!("See [here]({}/a/b).", server.uri())));

        let _ = std::fs::remove_dir_all(&pipeline.config().editions_root);
    }
}
