//! Atomic, at-most-once file downloads.
//!
//! A download is written to `{target}_tmp` and renamed into place only once
//! the whole body has been received, so the archive never holds a partially
//! written file at a canonical path. A file that already exists is never
//! fetched again, which makes re-runs against the same store resume where the
//! previous run stopped.

use std::borrow::Cow;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

use crate::crawler::Crawler;
use crate::error::{FetchError, NamingCollision};
use crate::models::DownloadTask;
use crate::outputs::Claim;
use crate::transport::{BodyMode, Transport};
use crate::utils::{fit_file_name, split_extension, tmp_path};

impl<T: Transport> Crawler<T> {
    /// Persist `task.source_url` at `task.target`.
    ///
    /// Returns `Ok(true)` when the file is archived (now or by an earlier
    /// run), skipped as a repeat request, or planned in a dry run, and
    /// `Ok(false)` when the fetch or the write failed. Only a naming collision
    /// is returned as an error.
    #[instrument(level = "debug", skip_all, fields(url = %task.source_url))]
    pub async fn download(&self, task: DownloadTask) -> Result<bool, NamingCollision> {
        let url = task.source_url.as_str();
        let target = fit_file_name(&task.target);
        if self.history.claim(&target, url)? == Claim::Repeat {
            debug!(target = %target.display(), "Repeated request; already handled");
            self.stats.skipped.bump();
            return Ok(true);
        }
        if let Cow::Owned(short) = &target {
            info!(
                original = %task.target.display(),
                truncated = %short.display(),
                "Name too long; truncated"
            );
        }

        match fs::try_exists(&target).await {
            Ok(true) => {
                info!(target = %target.display(), "Already archived; skipping");
                self.stats.skipped.bump();
                return Ok(true);
            }
            Ok(false) => {}
            Err(e) => warn!(
                target = %target.display(),
                error = %e,
                "Cannot check for an archived copy; downloading"
            ),
        }

        if self.settings.dry_run {
            info!(%url, target = %target.display(), "Dry run: would download");
            self.stats.planned.bump();
            return Ok(true);
        }

        match self.persist(url, &target).await {
            Ok(bytes) => {
                info!(%url, target = %target.display(), bytes, "Saved");
                self.stats.saved.bump();
                Ok(true)
            }
            Err(e) => {
                error!(%url, target = %target.display(), error = %e, "Download failed; invalid link?");
                self.stats.failed.bump();
                Ok(false)
            }
        }
    }

    /// Fetch into the temp file, then rename it onto `target`.
    async fn persist(&self, url: &str, target: &Path) -> Result<u64, FetchError> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        let ext = target
            .file_name()
            .and_then(|n| n.to_str())
            .map_or("", |n| split_extension(n).1);
        let mode = BodyMode::for_extension(ext);
        let tmp = tmp_path(target);

        let written = {
            let _permit = self.limiter.acquire().await?;
            info!(%url, ?mode, "Downloading");
            self.write_tmp(url, mode, &tmp).await
        };

        let result = match written {
            Ok(bytes) => fs::rename(&tmp, target).await.map(|_| bytes).map_err(FetchError::from),
            Err(e) => Err(e),
        };
        if result.is_err() {
            let _ = fs::remove_file(&tmp).await;
        }
        result
    }

    async fn write_tmp(&self, url: &str, mode: BodyMode, tmp: &Path) -> Result<u64, FetchError> {
        let mut file = fs::File::create(tmp).await?;
        let bytes = self.transport.get_into(url, mode, &mut file).await?;
        file.sync_all().await?;
        Ok(bytes)
    }
}
