use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use snow::fetcher::ByteStream;
use snow::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const ARCHIVE: &str = "https://archive.example/securitynow.htm";
const MEDIA: &str = "https://media.example/sn/";

/// Serves a small archive page listing episodes 1..=12 and a fixed body for
/// every media URL.
#[derive(Default)]
struct FakeSite {
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl Fetcher for FakeSite {
    async fn get(&self, url: &str) -> Result<ByteStream, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());

        let body = if url == ARCHIVE {
            let anchors: String = (1..=12)
                .rev()
                .map(|n| format!("<a name=\"{n}\"></a><p>Episode #{n}</p>\n"))
                .collect();
            format!("<html><body><a name=\"top\"></a>{anchors}</body></html>")
        } else if url.starts_with(MEDIA) {
            "0123456789".to_string()
        } else {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: "404 Not Found".to_string(),
            });
        };
        Ok(stream::iter(vec![Ok(Bytes::from(body))]).boxed())
    }
}

fn selection(dir: &TempDir) -> SelectionConfig {
    SelectionConfig {
        save_dir: dir.path().to_path_buf(),
        archive_url: ARCHIVE.to_string(),
        media_base_url: MEDIA.to_string(),
        ..Default::default()
    }
    .with_concurrency(3)
}

#[tokio::test]
async fn test_last_n_end_to_end() {
    let dir = TempDir::new().unwrap();
    let cfg = SelectionConfig {
        last_n: 4,
        ..selection(&dir)
    };
    let site = Arc::new(FakeSite::default());

    let latest = discover_latest_episode(site.as_ref(), &cfg.archive_url).await.unwrap();
    assert_eq!(latest, 12);

    let range = resolve_range(latest, &cfg).unwrap();
    assert_eq!(range, EpisodeRange::new(9, 12).unwrap());

    let report = DownloadCoordinator::with_fetcher(site.clone(), &cfg).run(range).await;

    let episodes: HashSet<u32> = report.results.iter().map(|r| r.episode).collect();
    assert_eq!(episodes, (9..=12).collect::<HashSet<_>>());
    assert_eq!(
        report.summary,
        Summary {
            processed: 4,
            succeeded: 4,
            skipped: 0,
            errored: 0,
            bytes: 40,
        }
    );
    // One archive fetch plus one per episode.
    assert_eq!(site.calls.load(Ordering::SeqCst), 5);
    assert!(dir.path().join("sn-012.mp3").exists());
    assert!(dir.path().join("sn-009.mp3").exists());
}

#[tokio::test]
async fn test_second_run_skips_everything() {
    let dir = TempDir::new().unwrap();
    let cfg = SelectionConfig {
        start_episode: 10,
        quality: Quality::Low,
        ..selection(&dir)
    };
    let site = Arc::new(FakeSite::default());
    let range = resolve_range(12, &cfg).unwrap();
    let coordinator = DownloadCoordinator::with_fetcher(site.clone(), &cfg);

    let first = coordinator.run(range).await;
    assert_eq!(first.summary.succeeded, 3);

    let second = coordinator.run(range).await;
    assert_eq!(second.summary.skipped, 3);
    assert_eq!(second.summary.bytes, 0);
    assert!(second.results.iter().all(|r| r.is_skipped() && r.error().is_none()));

    // The second run made no requests.
    assert_eq!(site.calls.load(Ordering::SeqCst), 3);
    let requested = site.requested.lock().unwrap();
    assert!(requested.iter().all(|url| url.ends_with("-lq.mp3")));
}

#[tokio::test]
async fn test_start_beyond_archive_is_fatal() {
    let dir = TempDir::new().unwrap();
    let cfg = SelectionConfig {
        start_episode: 13,
        ..selection(&dir)
    };
    let site = FakeSite::default();

    let latest = discover_latest_episode(&site, &cfg.archive_url).await.unwrap();
    let err = resolve_range(latest, &cfg).unwrap_err();
    assert_eq!(err, RangeError::StartNotPublished { start: 13, latest: 12 });
}

#[tokio::test]
async fn test_missing_archive_is_fatal() {
    let site = FakeSite::default();
    let err = discover_latest_episode(&site, "https://archive.example/moved.htm")
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::Fetch(FetchError::Status { .. })));
}
