//! Streaming image download into the edition directory.

use std::future::Future;
use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use econpub_shared::{EconpubError, EditionId, Result, url_last_segment};

use crate::EditionFetcher;

/// Somewhere images referenced by an article can be materialized on disk.
///
/// Returns the path of the written file.
pub trait ImageSource {
    fn fetch_image(
        &self,
        edition: &EditionId,
        url: &str,
    ) -> impl Future<Output = Result<PathBuf>> + Send;
}

impl EditionFetcher {
    /// Download an image to `<edition>/<last-segment>.png`.
    ///
    /// The suffix is always `.png`, whatever the source encoding. Repeated
    /// URLs download again and overwrite.
    #[instrument(skip(self), fields(edition = %edition))]
    pub async fn download_image(&self, edition: &EditionId, url: &str) -> Result<PathBuf> {
        let slug = url_last_segment(url)
            .ok_or_else(|| EconpubError::parse(format!("image URL has no path segment: {url}")))?;

        let paths = self.paths(edition);
        let dir = paths.edition_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| EconpubError::io(&dir, e))?;

        let target = paths.image_file(&slug);
        let mut response = self.send(url).await?;

        let mut file = tokio::fs::File::create(&target)
            .await
            .map_err(|e| EconpubError::io(&target, e))?;

        let mut written = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| EconpubError::Network(format!("{url}: body read failed: {e}")))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| EconpubError::io(&target, e))?;
            written += chunk.len();
        }
        file.flush().await.map_err(|e| EconpubError::io(&target, e))?;

        debug!(path = %target.display(), bytes = written, "image saved");
        Ok(target)
    }
}

impl ImageSource for EditionFetcher {
    fn fetch_image(
        &self,
        edition: &EditionId,
        url: &str,
    ) -> impl Future<Output = Result<PathBuf>> + Send {
        self.download_image(edition, url)
    }
}
