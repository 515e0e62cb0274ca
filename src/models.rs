// src/models.rs

use indicatif::HumanBytes;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::downloader::DownloadError;

/// How a single episode's attempt ended.
#[derive(Debug)]
pub enum Outcome {
    Completed,
    /// The destination already existed (or could not be checked) and
    /// overwriting was not requested.
    Skipped { check_error: Option<DownloadError> },
    Failed(DownloadError),
}

/// The result of one episode download attempt. Built by a worker and
/// never changed after it is handed to the collector.
#[derive(Debug)]
pub struct DownloadResult {
    pub episode: u32,
    pub file_name: String,
    pub path: PathBuf,
    /// Bytes written to `path`, including those written before a failure.
    pub bytes_written: u64,
    pub outcome: Outcome,
}

impl DownloadResult {
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped { .. })
    }

    /// The error attached to this attempt, if any. Skips may carry one too.
    pub fn error(&self) -> Option<&DownloadError> {
        match &self.outcome {
            Outcome::Completed => None,
            Outcome::Skipped { check_error } => check_error.as_ref(),
            Outcome::Failed(err) => Some(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Completed)
    }
}

impl fmt::Display for DownloadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.outcome {
            Outcome::Completed => write!(
                f,
                "{}: {} downloaded as {}",
                self.file_name,
                HumanBytes(self.bytes_written),
                path
            ),
            Outcome::Skipped { check_error: None } => {
                write!(f, "{}: skipped, episode exists as {}", self.file_name, path)
            }
            Outcome::Skipped { check_error: Some(err) } => {
                write!(f, "{}: skipped: check file error: {}", self.file_name, err)
            }
            Outcome::Failed(err) if self.bytes_written == 0 => {
                write!(f, "{}: download error: {}", self.file_name, err)
            }
            Outcome::Failed(err) => write!(
                f,
                "{}: {} downloaded as {} with an error: {}",
                self.file_name,
                HumanBytes(self.bytes_written),
                path,
                err
            ),
        }
    }
}

/// Totals over every result of a run.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Summary {
    pub processed: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub errored: usize,
    /// Bytes of the successful downloads only.
    pub bytes: u64,
}

impl Summary {
    pub fn from_results(results: &[DownloadResult]) -> Self {
        let mut summary = Summary {
            processed: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.outcome {
                Outcome::Skipped { .. } => summary.skipped += 1,
                Outcome::Failed(_) => summary.errored += 1,
                Outcome::Completed => {
                    summary.succeeded += 1;
                    summary.bytes += result.bytes_written;
                }
            }
        }
        summary
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} episodes processed", self.processed)?;
        if self.errored > 0 {
            write!(f, "\n{} downloads resulted in an error", self.errored)?;
        }
        if self.skipped > 0 {
            write!(f, "\n{} episodes were skipped", self.skipped)?;
        }
        if self.succeeded > 0 {
            write!(
                f,
                "\n{} episodes totalling {} were downloaded",
                self.succeeded,
                HumanBytes(self.bytes)
            )?;
        }
        Ok(())
    }
}

/// Everything a coordinator run produced. `results` are in arrival order.
#[derive(Debug)]
pub struct Report {
    pub results: Vec<DownloadResult>,
    pub summary: Summary,
}

impl Report {
    pub fn new(results: Vec<DownloadResult>) -> Self {
        let summary = Summary::from_results(&results);
        Self { results, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;
    use std::io;

    fn result(episode: u32, bytes_written: u64, outcome: Outcome) -> DownloadResult {
        let file_name = format!("sn-{episode:03}.mp3");
        DownloadResult {
            episode,
            path: PathBuf::from("/tmp/sn").join(&file_name),
            file_name,
            bytes_written,
            outcome,
        }
    }

    fn not_found() -> DownloadError {
        DownloadError::Fetch(FetchError::Status {
            url: "https://media.example/sn-003.mp3".to_string(),
            status: "404 Not Found".to_string(),
        })
    }

    #[test]
    fn test_summary_counts_and_bytes() {
        let results = vec![
            result(1, 1_000, Outcome::Completed),
            result(2, 2_500, Outcome::Completed),
            result(3, 0, Outcome::Failed(not_found())),
            result(
                4,
                700,
                Outcome::Failed(DownloadError::Stream(io::Error::other("reset"))),
            ),
            result(5, 0, Outcome::Skipped { check_error: None }),
            result(
                6,
                0,
                Outcome::Skipped {
                    check_error: Some(DownloadError::FileSystem(io::Error::from(
                        io::ErrorKind::PermissionDenied,
                    ))),
                },
            ),
        ];
        let summary = Summary::from_results(&results);
        assert_eq!(
            summary,
            Summary {
                processed: 6,
                succeeded: 2,
                skipped: 2,
                errored: 2,
                bytes: 3_500,
            }
        );
    }

    #[test]
    fn test_result_accessors() {
        let skipped_with_error = result(
            6,
            0,
            Outcome::Skipped {
                check_error: Some(DownloadError::FileSystem(io::Error::from(
                    io::ErrorKind::PermissionDenied,
                ))),
            },
        );
        assert!(skipped_with_error.is_skipped());
        assert!(skipped_with_error.error().is_some());
        assert!(!skipped_with_error.is_success());

        let done = result(1, 10, Outcome::Completed);
        assert!(done.is_success());
        assert!(done.error().is_none());
    }

    #[test]
    fn test_result_messages() {
        let done = result(1, 3 * 1024 * 1024, Outcome::Completed);
        assert_eq!(
            done.to_string(),
            "sn-001.mp3: 3.00 MiB downloaded as /tmp/sn/sn-001.mp3"
        );

        let skipped = result(2, 0, Outcome::Skipped { check_error: None });
        assert_eq!(
            skipped.to_string(),
            "sn-002.mp3: skipped, episode exists as /tmp/sn/sn-002.mp3"
        );

        let failed = result(3, 0, Outcome::Failed(not_found()));
        assert!(failed.to_string().starts_with("sn-003.mp3: download error: "));

        let reset = DownloadError::Stream(io::Error::other("reset"));
        let partial = result(4, 700, Outcome::Failed(reset));
        assert!(partial
            .to_string()
            .contains("700 B downloaded as /tmp/sn/sn-004.mp3 with an error"));
    }

    #[test]
    fn test_summary_message() {
        let summary = Summary {
            processed: 3,
            succeeded: 2,
            skipped: 1,
            errored: 0,
            bytes: 83 * 1024 * 1024,
        };
        assert_eq!(
            summary.to_string(),
            "3 episodes processed\n\
             1 episodes were skipped\n\
             2 episodes totalling 83.00 MiB were downloaded"
        );
    }
}
