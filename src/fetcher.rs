// src/fetcher.rs

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use std::io;
use thiserror::Error;

use crate::config::USER_AGENT;

/// Errors raised while issuing a GET request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("GET of {url:?} resulted in an unexpected status: {status:?}")]
    Status { url: String, status: String },
}

/// A response body as a stream of chunks. Stream errors are plain IO errors so
/// the copy loop does not care where the bytes come from.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// The "GET a URL and hand back its body" primitive.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues a GET request. Non-success statuses are errors.
    async fn get(&self, url: &str) -> Result<ByteStream, FetchError>;
}

/// `Fetcher` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<ByteStream, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.to_string(),
            });
        }
        Ok(resp.bytes_stream().map(|chunk| chunk.map_err(io::Error::other)).boxed())
    }
}

/// Joins a base URL and a file name with exactly one slash between them.
pub fn join_url(base: &str, file_name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), file_name)
}
