use futures_util::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::{Quality, SelectionConfig};
use crate::fetcher::{join_url, FetchError, Fetcher};
use crate::models::{DownloadResult, Outcome};

/// Errors that end a single episode's attempt.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("file error: {0}")]
    FileSystem(#[source] io::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("stream error: {0}")]
    Stream(#[source] io::Error),
}

enum SkipCheck {
    Proceed,
    /// Carries the stat error when the file's state could not be determined.
    Skip(Option<DownloadError>),
}

/// Downloads single episodes into the save directory. Shared by every worker.
pub struct EpisodeDownloader<F: ?Sized> {
    fetcher: Arc<F>,
    media_base_url: String,
    save_dir: PathBuf,
    quality: Quality,
    overwrite: bool,
}

impl<F: Fetcher + ?Sized> EpisodeDownloader<F> {
    pub fn new(fetcher: Arc<F>, cfg: &SelectionConfig) -> Self {
        Self {
            fetcher,
            media_base_url: cfg.media_base_url.clone(),
            save_dir: cfg.save_dir.clone(),
            quality: cfg.quality,
            overwrite: cfg.overwrite,
        }
    }

    /// Makes one attempt at an episode. Never returns early without a result;
    /// every error ends up inside the returned value.
    pub async fn download(&self, episode: u32) -> DownloadResult {
        let file_name = self.quality.file_name(episode);
        let path = self.save_dir.join(&file_name);
        debug!(episode, file = %file_name, "download");

        if let SkipCheck::Skip(check_error) = self.skip_check(&path).await {
            return DownloadResult {
                episode,
                file_name,
                path,
                bytes_written: 0,
                outcome: Outcome::Skipped { check_error },
            };
        }

        let url = join_url(&self.media_base_url, &file_name);
        let mut bytes_written = 0;
        let outcome = match self.transfer(&url, &path, &mut bytes_written).await {
            Ok(()) => Outcome::Completed,
            Err(e) => Outcome::Failed(e),
        };

        DownloadResult {
            episode,
            file_name,
            path,
            bytes_written,
            outcome,
        }
    }

    /// A stat failure other than "not found" counts as an existing file.
    async fn skip_check(&self, path: &Path) -> SkipCheck {
        if self.overwrite {
            return SkipCheck::Proceed;
        }
        match tokio::fs::metadata(path).await {
            Ok(_) => SkipCheck::Skip(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => SkipCheck::Proceed,
            Err(e) => SkipCheck::Skip(Some(DownloadError::FileSystem(e))),
        }
    }

    /// Streams `url` into `path`, truncating whatever was there.
    /// `written` is kept up to date so a failure still reports partial bytes.
    async fn transfer(
        &self,
        url: &str,
        path: &Path,
        written: &mut u64,
    ) -> Result<(), DownloadError> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(DownloadError::FileSystem)?;

        let mut body = self.fetcher.get(url).await?;
        while let Some(chunk) = body.next().await {
            let bytes = chunk.map_err(DownloadError::Stream)?;
            if bytes.is_empty() {
                continue;
            }
            file.write_all(&bytes).await.map_err(DownloadError::Stream)?;
            *written += bytes.len() as u64;
        }
        file.flush().await.map_err(DownloadError::Stream)?;
        Ok(())
    }
}
