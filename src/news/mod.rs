//! Keyword news search over the Google News RSS feed.

pub mod rss;

use reqwest::Url;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::NewsSettings;
pub use rss::{parse_items, NewsEntry};

#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error("news request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("news feed is not valid XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid news feed url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "entries", rename_all = "snake_case")]
pub enum NewsOutcome {
    Entries(Vec<NewsEntry>),
    Empty,          // feed answered with no items
    Unavailable,    // transport or parse failure; already logged
}

/// `{base}?q=<query>&hl=..&gl=..&ceid=..`; the query is percent-encoded.
pub fn feed_url(settings: &NewsSettings, query: &str) -> Result<Url, NewsError> {
    Url::parse_with_params(
        &settings.base_url,
        &[
            ("q", query),
            ("hl", settings.locale.as_str()),
            ("gl", settings.region.as_str()),
            ("ceid", settings.edition.as_str()),
        ],
    )
    .map_err(|e| NewsError::InvalidUrl(e.to_string()))
}

pub struct NewsClient {
    client: reqwest::Client,
    settings: NewsSettings,
}

impl NewsClient {
    pub fn new(client: reqwest::Client, settings: NewsSettings) -> Self {
        Self { client, settings }
    }

    pub async fn fetch(&self, query: &str) -> Result<Vec<NewsEntry>, NewsError> {
        let url = feed_url(&self.settings, query)?;
        let body = self.client.get(url).send().await?.error_for_status()?.text().await?;
        Ok(parse_items(&body, self.settings.max_entries)?)
    }

    // Never fails; the dashboard renders whatever comes back.
    pub async fn search(&self, query: &str) -> NewsOutcome {
        let query = query.trim();
        if query.is_empty() {
            return NewsOutcome::Empty;
        }
        match self.fetch(query).await {
            Ok(entries) if entries.is_empty() => {
                debug!(query, "news feed returned no items");
                NewsOutcome::Empty
            }
            Ok(entries) => NewsOutcome::Entries(entries),
            Err(e) => {
                warn!(query, error = %e, "news search failed");
                NewsOutcome::Unavailable
            }
        }
    }
}
