// src/discovery.rs

use futures_util::StreamExt;
use scraper::{Html, Node};
use std::io;
use thiserror::Error;
use tracing::debug;

use crate::fetcher::{FetchError, Fetcher};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("error reading archive page: {0}")]
    Body(#[source] io::Error),
    #[error("no episode numbers found")]
    NoEpisodes,
}

/// A flattened piece of markup, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        /// Attribute key/value pairs, in the order the tokenizer reports them.
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

/// Returns the number of the most recent episode, the upper bound for any range.
pub async fn discover_latest_episode<F>(
    fetcher: &F,
    archive_url: &str,
) -> Result<u32, DiscoveryError>
where
    F: Fetcher + ?Sized,
{
    let mut body = fetcher.get(archive_url).await?;
    let mut page = Vec::new();
    while let Some(chunk) = body.next().await {
        page.extend_from_slice(&chunk.map_err(DiscoveryError::Body)?);
    }
    debug!(url = archive_url, bytes = page.len(), "fetched archive page");

    let tokens = tokenize(&String::from_utf8_lossy(&page));
    let latest = last_episode_from_tokens(&tokens)?;
    debug!(latest, "latest episode discovered");
    Ok(latest)
}

/// Tokenizes an HTML document into start tags and text runs.
pub fn tokenize(html: &str) -> Vec<Token> {
    let document = Html::parse_document(html);
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Element(element) => Some(Token::StartTag {
                name: element.name().to_string(),
                attrs: element
                    .attrs()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            }),
            Node::Text(text) => Some(Token::Text(text.to_string())),
            _ => None,
        })
        .collect()
}

/// Scans every anchor's `name` attribute and returns the largest numeric one.
/// The latest episode is normally the first such anchor, but the whole stream
/// is checked anyway.
pub fn last_episode_from_tokens(tokens: &[Token]) -> Result<u32, DiscoveryError> {
    let latest = tokens
        .iter()
        .filter_map(|token| match token {
            Token::StartTag { name, attrs } if name == "a" => Some(attrs),
            _ => None,
        })
        .flatten()
        .filter(|(key, _)| key == "name")
        .filter_map(|(_, value)| value.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    if latest == 0 {
        return Err(DiscoveryError::NoEpisodes);
    }
    Ok(latest)
}
