pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod downloader;
pub mod fetcher;
pub mod models;
pub mod range;

/// Convenient type alias exposing common structs.
pub mod prelude {
    pub use crate::config::{Quality, SelectionConfig};
    pub use crate::coordinator::DownloadCoordinator;
    pub use crate::discovery::{discover_latest_episode, DiscoveryError};
    pub use crate::downloader::DownloadError;
    pub use crate::fetcher::{FetchError, Fetcher, HttpFetcher};
    pub use crate::models::{DownloadResult, Outcome, Report, Summary};
    pub use crate::range::{resolve_range, EpisodeRange, RangeError};
}
