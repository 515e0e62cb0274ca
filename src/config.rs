// src/config.rs

use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Archive page listing every published episode.
pub const ARCHIVE_URL: &str = "https://www.grc.com/securitynow.htm";
/// Base URL the audio files are served from.
pub const MEDIA_BASE_URL: &str = "https://media.grc.com/sn/";
pub const USER_AGENT: &str = "snow";

pub const DEFAULT_CONCURRENCY: usize = 1;
/// Requests above this are lowered to it.
pub const MAX_CONCURRENCY: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("must specify a save directory; to use the default do not set --savedir")]
    EmptySaveDir,
    #[error(
        "episode at which to stop downloading, {stop}, must be either greater than \
         the start episode, {start}, or 0"
    )]
    StopBeforeStart { start: u32, stop: u32 },
}

/// Which audio encoding of an episode to fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Quality {
    /// 64Kbps mp3.
    #[default]
    High,
    /// 16Kbps mp3.
    Low,
}

impl Quality {
    /// Returns the remote (and local) file name of an episode.
    pub fn file_name(self, episode: u32) -> String {
        match self {
            Quality::High => format!("sn-{episode:03}.mp3"),
            Quality::Low => format!("sn-{episode:03}-lq.mp3"),
        }
    }
}

/// Everything the user asked for, resolved once at startup.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Download the most recent `last_n` episodes; 0 means all of them.
    /// Ignored when `start_episode` is set.
    pub last_n: u32,
    /// First episode to download, 0 when unset.
    pub start_episode: u32,
    /// Last episode to download, 0 for "up to the latest".
    pub stop_episode: u32,
    pub quality: Quality,
    pub overwrite: bool,
    /// Number of episodes downloaded at once. Always within `1..=MAX_CONCURRENCY`
    /// when built through [`SelectionConfig::with_concurrency`].
    pub concurrency: usize,
    pub save_dir: PathBuf,
    pub archive_url: String,
    pub media_base_url: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            last_n: 1,
            start_episode: 0,
            stop_episode: 0,
            quality: Quality::High,
            overwrite: false,
            concurrency: DEFAULT_CONCURRENCY,
            save_dir: default_save_dir(),
            archive_url: ARCHIVE_URL.to_string(),
            media_base_url: MEDIA_BASE_URL.to_string(),
        }
    }
}

impl SelectionConfig {
    /// Sets the concurrency, pulling out-of-range requests back into bounds.
    pub fn with_concurrency(mut self, requested: usize) -> Self {
        self.concurrency = clamp_concurrency(requested);
        self
    }

    /// Checks the flag combinations that can be rejected before any network access.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.save_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptySaveDir);
        }
        let stop_set = self.stop_episode != 0;
        if self.start_episode > 0 && stop_set && self.stop_episode < self.start_episode {
            return Err(ConfigError::StopBeforeStart {
                start: self.start_episode,
                stop: self.stop_episode,
            });
        }
        Ok(())
    }
}

/// Maps a requested concurrency onto `1..=MAX_CONCURRENCY`.
pub fn clamp_concurrency(requested: usize) -> usize {
    if requested == 0 {
        info!(
            "invalid download concurrency, {} was specified, using the default value: {}",
            requested, DEFAULT_CONCURRENCY
        );
        return DEFAULT_CONCURRENCY;
    }
    if requested > MAX_CONCURRENCY {
        info!(
            "invalid download concurrency, {} was specified, using the maximum value: {}",
            requested, MAX_CONCURRENCY
        );
        return MAX_CONCURRENCY;
    }
    requested
}

/// `$HOME/Downloads/security-now`, or a relative `security-now` when no home
/// directory can be determined.
pub fn default_save_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join("Downloads").join("security-now"),
        None => PathBuf::from("security-now"),
    }
}
