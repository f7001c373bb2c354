//! Image downloads into the per-entry asset directory.

use std::path::{Path, PathBuf};

use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};
use url::Url;

use enricher_shared::{EntryPaths, MAX_SITE_IMAGES};

/// Streams images to disk. Failures are reported as `false`, never raised.
#[derive(Debug, Clone)]
pub struct AssetDownloader {
    client: Client,
}

impl AssetDownloader {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download `image_url` to `dest`.
    ///
    /// Returns `true` only on HTTP 200 with the body fully written. The body
    /// goes to a hidden `.part` sibling first and is renamed into place, so a
    /// failed download never leaves a file at `dest`.
    #[instrument(skip_all, fields(url = %image_url, dest = %dest.display()))]
    pub async fn download(&self, image_url: &Url, dest: &Path) -> bool {
        let part = part_path(dest);
        match self.stream_to(image_url, &part).await {
            Ok(bytes) => match tokio::fs::rename(&part, dest).await {
                Ok(()) => {
                    debug!(bytes, "image saved");
                    true
                }
                Err(e) => {
                    warn!(error = %e, "failed to move image into place");
                    let _ = tokio::fs::remove_file(&part).await;
                    false
                }
            },
            Err(cause) => {
                warn!(%cause, "image download failed");
                let _ = tokio::fs::remove_file(&part).await;
                false
            }
        }
    }

    /// Download up to [`MAX_SITE_IMAGES`] of `candidates`, in order.
    ///
    /// Failed candidates are skipped. Files are numbered `site_image_1..` in
    /// the order they were saved, and the returned paths are relative to the
    /// entry's markdown file.
    pub async fn download_site_images(&self, candidates: &[Url], paths: &EntryPaths) -> Vec<String> {
        let mut saved = Vec::new();

        for candidate in candidates {
            if saved.len() >= MAX_SITE_IMAGES {
                break;
            }
            let file_name = EntryPaths::site_image_file_name(saved.len() + 1, candidate);
            if self.download(candidate, &paths.asset(&file_name)).await {
                saved.push(paths.asset_markdown_ref(&file_name));
            }
        }

        debug!(
            saved = saved.len(),
            candidates = candidates.len(),
            "site images collected"
        );
        saved
    }

    async fn stream_to(&self, image_url: &Url, part: &Path) -> Result<u64, String> {
        let mut response = self
            .client
            .get(image_url.as_str())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if response.status() != StatusCode::OK {
            return Err(format!("HTTP {}", response.status()));
        }

        if let Some(parent) = part.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("create {}: {e}", parent.display()))?;
        }

        let mut file = tokio::fs::File::create(part)
            .await
            .map_err(|e| format!("create {}: {e}", part.display()))?;

        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
            file.write_all(&chunk)
                .await
                .map_err(|e| format!("write {}: {e}", part.display()))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| format!("flush {}: {e}", part.display()))?;

        Ok(written)
    }
}

/// `<dir>/.<name>.part` next to the final destination.
fn part_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.part"))
}
