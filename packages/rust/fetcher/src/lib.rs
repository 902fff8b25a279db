//! HTTP side of the pipeline: edition lookup, article download, image download.
//!
//! This crate provides:
//! - [`EditionFetcher`]: session-authenticated client for the publication
//! - [`parse_article_list`]: landing-page structured data → article references
//! - [`ImageSource`]: the image download seam used by the document assembler
//!
//! All requests run one after another; nothing here spawns tasks.

mod articles;
mod edition;
mod images;

use std::path::PathBuf;

use reqwest::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use url::Url;

use econpub_shared::{EconpubError, EditionId, EditionPaths, PipelineConfig, Result};

pub use articles::{FetchedEdition, parse_article_list};
pub use edition::edition_from_location;
pub use images::ImageSource;

/// Path of the "current weekly edition" endpoint, relative to the base URL.
const WEEKLY_EDITION_PATH: &str = "weeklyedition";

// ---------------------------------------------------------------------------
// EditionFetcher
// ---------------------------------------------------------------------------

/// Session-authenticated client for one publication.
///
/// Holds two HTTP clients sharing the same headers: one that never follows
/// redirects (edition lookup reads the redirect itself) and one that does.
pub struct EditionFetcher {
    base_url: Url,
    editions_root: PathBuf,
    client: Client,
    lookup_client: Client,
}

impl EditionFetcher {
    /// Build a fetcher from the runtime pipeline configuration.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let headers = session_headers(&config.cookie)?;

        let client = build_client(config, headers.clone(), reqwest::redirect::Policy::default())?;
        let lookup_client = build_client(config, headers, reqwest::redirect::Policy::none())?;

        Ok(Self {
            base_url: config.base_url.clone(),
            editions_root: config.editions_root.clone(),
            client,
            lookup_client,
        })
    }

    /// Filesystem layout for an edition under this fetcher's editions root.
    pub fn paths(&self, edition: &EditionId) -> EditionPaths {
        EditionPaths::new(&self.editions_root, edition.clone())
    }

    /// Resolve a path against the publication base URL.
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| EconpubError::config(format!("cannot build URL for '{path}': {e}")))
    }

    fn weekly_edition_url(&self) -> Result<Url> {
        self.endpoint(WEEKLY_EDITION_PATH)
    }

    fn edition_landing_url(&self, edition: &EditionId) -> Result<Url> {
        self.endpoint(&format!("{WEEKLY_EDITION_PATH}/{edition}"))
    }
}

/// Cookie header attached to every request; marked sensitive so it never shows in debug output.
fn session_headers(cookie: &str) -> Result<HeaderMap> {
    let mut value = HeaderValue::from_str(cookie)
        .map_err(|e| EconpubError::config(format!("session cookie is not a valid header value: {e}")))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, value);
    Ok(headers)
}

fn build_client(
    config: &PipelineConfig,
    headers: HeaderMap,
    redirect: reqwest::redirect::Policy,
) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .redirect(redirect);

    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| EconpubError::Network(format!("failed to build HTTP client: {e}")))
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use econpub_shared::{CompilerConfig, PipelineConfig};
    use url::Url;

    pub(crate) const TEST_COOKIE: &str = "economist_session=abc123";
    pub(crate) const TEST_UA: &str = "econpub-test/1.0";

    pub(crate) fn temp_root(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{prefix}-{}", uuid::Uuid::now_v7()))
    }

    pub(crate) fn config_for(server_uri: &str, root: PathBuf) -> PipelineConfig {
        PipelineConfig {
            editions_root: root,
            base_url: Url::parse(server_uri).expect("mock server uri"),
            user_agent: TEST_UA.into(),
            cookie: TEST_COOKIE.into(),
            request_timeout: None,
            compiler: CompilerConfig::default(),
        }
    }
}
