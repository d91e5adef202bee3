//! Remote candidate feed
//!
//! The feed uses the same `name,url` layout as the template but lists many
//! more channels and several URLs per channel. Only lines whose normalized
//! name is a template key are kept.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::errors::{SourceError, SourceResult};
use crate::sources::template::GENRE_MARKER;
use crate::utils::url::UrlUtils;
use crate::utils::{ChannelKey, normalize};

/// Candidate URLs per channel key, in feed encounter order
pub type CandidateMap = HashMap<ChannelKey, Vec<String>>;

/// Anything that can produce the raw feed text
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> SourceResult<String>;

    /// Human-readable origin for logs
    fn describe(&self) -> String;
}

/// Fetches the feed with a single HTTP GET
pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> SourceResult<Self> {
        let url = url.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                SourceError::feed_fetch(UrlUtils::obfuscate_credentials(&url), e.to_string())
            })?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> SourceResult<String> {
        let safe_url = UrlUtils::obfuscate_credentials(&self.url);
        debug!("Fetching candidate feed from: {}", safe_url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                SourceError::feed_fetch(&safe_url, UrlUtils::obfuscate_credentials(&e.to_string()))
            })?;

        if !response.status().is_success() {
            return Err(SourceError::Http {
                status: response.status().as_u16(),
                url: safe_url,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| SourceError::feed_fetch(&safe_url, format!("Failed to read body: {e}")))?;

        debug!("Fetched {} bytes of feed content", text.len());
        Ok(text)
    }

    fn describe(&self) -> String {
        UrlUtils::obfuscate_credentials(&self.url)
    }
}

/// Join feed lines against the template key set.
///
/// Marker lines and lines without a comma are ignored. Empty URLs and repeats
/// of a URL already collected for the same key are skipped. A byte order mark
/// on the first line is dropped.
pub fn merge<'a, I>(feed_lines: I, keys: &HashSet<ChannelKey>) -> CandidateMap
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidates = CandidateMap::new();

    for (index, line) in feed_lines.into_iter().enumerate() {
        let line = if index == 0 {
            line.trim_start_matches('\u{feff}')
        } else {
            line
        };
        if line.contains(GENRE_MARKER) {
            continue;
        }
        let Some((name, url)) = line.split_once(',') else {
            continue;
        };
        let url = url.trim();
        if url.is_empty() {
            continue;
        }

        let key = normalize(name);
        if !keys.contains(&key) {
            continue;
        }

        let urls = candidates.entry(key).or_default();
        if !urls.iter().any(|existing| existing == url) {
            urls.push(url.to_string());
        }
    }

    candidates
}

/// Fetch and merge, degrading any fetch failure to an empty candidate set.
pub async fn fetch_candidates(source: &dyn FeedSource, keys: &HashSet<ChannelKey>) -> CandidateMap {
    match source.fetch().await {
        Ok(text) => {
            let candidates = merge(text.lines(), keys);
            info!(
                "Feed {} matched {} of {} template channels ({} candidate URLs)",
                source.describe(),
                candidates.len(),
                keys.len(),
                candidates.values().map(Vec::len).sum::<usize>()
            );
            candidates
        }
        Err(e) => {
            warn!("Error fetching channel list, continuing without candidates: {}", e);
            CandidateMap::new()
        }
    }
}
