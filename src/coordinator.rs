// src/coordinator.rs

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{clamp_concurrency, SelectionConfig};
use crate::downloader::EpisodeDownloader;
use crate::fetcher::{FetchError, Fetcher, HttpFetcher};
use crate::models::{DownloadResult, Outcome, Report};
use crate::range::EpisodeRange;

/// Fans episode numbers out to a fixed pool of workers and gathers one
/// result per episode.
pub struct DownloadCoordinator<F: ?Sized> {
    downloader: Arc<EpisodeDownloader<F>>,
    concurrency: usize,
}

impl DownloadCoordinator<HttpFetcher> {
    /// Coordinator that downloads over HTTP.
    pub fn new(cfg: &SelectionConfig) -> Result<Self, FetchError> {
        Ok(Self::with_fetcher(Arc::new(HttpFetcher::new()?), cfg))
    }
}

impl<F: Fetcher + ?Sized + 'static> DownloadCoordinator<F> {
    pub fn with_fetcher(fetcher: Arc<F>, cfg: &SelectionConfig) -> Self {
        Self {
            downloader: Arc::new(EpisodeDownloader::new(fetcher, cfg)),
            concurrency: clamp_concurrency(cfg.concurrency),
        }
    }

    /// Downloads every episode in `range` and returns the results in the
    /// order they finished. Per-episode failures are recorded, never raised.
    pub async fn run(&self, range: EpisodeRange) -> Report {
        // A single slot keeps the feeder in lock-step with the workers.
        let (work_tx, work_rx) = mpsc::channel::<u32>(1);
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<DownloadResult>(self.concurrency);

        let mut workers = JoinSet::new();
        for worker_id in 0..self.concurrency {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let downloader = self.downloader.clone();
            workers.spawn(async move {
                loop {
                    let next = { work_rx.lock().await.recv().await };
                    let Some(episode) = next else {
                        debug!(worker_id, "work queue closed, worker exiting");
                        break;
                    };
                    let result = downloader.download(episode).await;
                    if result_tx.send(result).await.is_err() {
                        break;
                    }
                }
            });
        }
        // Only the workers hold these now: the result channel closes once they
        // are all gone, and so does the work queue, unblocking the feeder.
        drop(result_tx);
        drop(work_rx);

        let feeder = tokio::spawn(async move {
            for episode in range.episodes() {
                if work_tx.send(episode).await.is_err() {
                    break;
                }
            }
            // work_tx is dropped here, closing the queue.
        });

        info!(
            start = range.start(),
            stop = range.stop(),
            workers = self.concurrency,
            "downloading..."
        );
        let expected = range.len();
        let mut results = Vec::with_capacity(expected);
        while results.len() < expected {
            debug!("waiting for result {}", results.len() + 1);
            let Some(result) = result_rx.recv().await else {
                warn!(
                    received = results.len(),
                    expected, "all workers stopped before every episode was reported"
                );
                break;
            };
            log_result(&result);
            results.push(result);
        }

        if let Err(e) = feeder.await {
            warn!("episode feeder task failed: {}", e);
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!("download worker failed: {}", e);
            }
        }
        debug!("complete...");

        Report::new(results)
    }
}

fn log_result(result: &DownloadResult) {
    match &result.outcome {
        Outcome::Completed | Outcome::Skipped { check_error: None } => {
            info!(episode = result.episode, "{}", result)
        }
        Outcome::Skipped { check_error: Some(_) } | Outcome::Failed(_) => {
            warn!(episode = result.episode, "{}", result)
        }
    }
}
