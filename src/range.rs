// src/range.rs

use std::ops::RangeInclusive;
use thiserror::Error;

use crate::config::SelectionConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error(
        "nothing to do: the start episode, {start}, does not yet exist; \
         the last episode was {latest}"
    )]
    StartNotPublished { start: u32, latest: u32 },
    #[error("invalid episode range: {start} to {stop}")]
    Invalid { start: u32, stop: u32 },
}

/// An inclusive, non-empty span of episode numbers starting at 1 or later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeRange {
    start: u32,
    stop: u32,
}

impl EpisodeRange {
    /// Builds a range, rejecting episode 0 and a stop before the start.
    pub fn new(start: u32, stop: u32) -> Result<Self, RangeError> {
        if start == 0 || stop < start {
            return Err(RangeError::Invalid { start, stop });
        }
        Ok(Self { start, stop })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn stop(&self) -> u32 {
        self.stop
    }

    /// Number of episodes in the range.
    pub fn len(&self) -> usize {
        (self.stop - self.start) as usize + 1
    }

    /// Always false; `new` refuses empty ranges.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, episode: u32) -> bool {
        self.episodes().contains(&episode)
    }

    /// The episode numbers in ascending order.
    pub fn episodes(&self) -> RangeInclusive<u32> {
        self.start..=self.stop
    }
}

/// Turns the user's selection into a concrete range, given the latest
/// published episode (`latest >= 1`).
///
/// An explicit start wins over `last_n`; a stop that is unset or beyond
/// `latest` is pulled back to `latest`. A stop below an explicit start is
/// rejected as [`RangeError::Invalid`].
pub fn resolve_range(latest: u32, cfg: &SelectionConfig) -> Result<EpisodeRange, RangeError> {
    if cfg.start_episode > 0 {
        if cfg.start_episode > latest {
            return Err(RangeError::StartNotPublished {
                start: cfg.start_episode,
                latest,
            });
        }
        let stop = if cfg.stop_episode > 0 && cfg.stop_episode <= latest {
            cfg.stop_episode
        } else {
            latest
        };
        return EpisodeRange::new(cfg.start_episode, stop);
    }

    // Selecting by count always runs up to the latest episode.
    let start = match cfg.last_n {
        1 => latest,
        0 => 1,
        n if n >= latest => 1,
        n => latest - n + 1,
    };
    EpisodeRange::new(start, latest)
}
