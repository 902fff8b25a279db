//! Latest-edition lookup.
//!
//! The weekly edition endpoint answers an authenticated request with a
//! redirect to `/weeklyedition/<edition>`. Anything other than a redirect means
//! the session was not accepted.

use reqwest::header::LOCATION;
use tracing::{debug, info, instrument};
use url::Url;

use econpub_shared::{EconpubError, EditionId, Result, url_last_segment};

use crate::EditionFetcher;

impl EditionFetcher {
    /// Identifier of the current weekly edition.
    ///
    /// Fails with [`EconpubError::SessionRejected`] when the endpoint does not
    /// redirect. Never retried.
    #[instrument(skip_all)]
    pub async fn get_latest_edition(&self) -> Result<EditionId> {
        let url = self.weekly_edition_url()?;
        debug!(%url, "looking up latest edition");

        let response = self
            .lookup_client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| EconpubError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_redirection() {
            return Err(EconpubError::SessionRejected {
                status: status.as_u16(),
            });
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                EconpubError::parse(format!("{url}: HTTP {status} without a Location header"))
            })?;

        let edition = edition_from_location(&url, location)?;
        info!(%edition, "resolved latest edition");
        Ok(edition)
    }
}

/// Edition id from a redirect target: the final non-empty path segment,
/// with relative targets resolved against the request URL.
pub fn edition_from_location(request_url: &Url, location: &str) -> Result<EditionId> {
    let target = request_url
        .join(location)
        .map_err(|e| EconpubError::parse(format!("invalid redirect target '{location}': {e}")))?;

    let segment = url_last_segment(target.as_str()).ok_or_else(|| {
        EconpubError::parse(format!("redirect target '{location}' has no path segment"))
    })?;

    EditionId::new(segment)
}
