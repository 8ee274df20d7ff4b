// Shared trait + construction for quote provider adapters

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::config::HttpSettings;
use crate::quote::types::RawQuote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Library, // section-based client (Yahoo chart meta + quote entry)
    Yahoo,   // direct v7 quote JSON endpoint
    Twse,    // exchange-internal getStockInfo endpoint
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Library => "library",
            ProviderKind::Yahoo => "yahoo",
            ProviderKind::Twse => "twse",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One upstream quote source.
///
/// `fetch` never fails: transport errors, timeouts, bad payloads and missing
/// fields all come back as [`RawQuote::absent`] (after being logged).
#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn fetch(&self, symbol: &str) -> RawQuote;
}

// Client shared by every adapter: bounded timeout, browser-like UA, no retries.
pub fn http_client(settings: &HttpSettings) -> anyhow::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_str(&settings.user_agent)?);
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;
    Ok(client)
}

pub fn build_provider(kind: ProviderKind, settings: &HttpSettings) -> anyhow::Result<Arc<dyn QuoteProvider>> {
    let client = http_client(settings)?;
    let provider: Arc<dyn QuoteProvider> = match kind {
        ProviderKind::Yahoo => Arc::new(yahoo::YahooQuoteAdapter::new(client, &settings.yahoo_base_url)),
        ProviderKind::Twse => Arc::new(twse::TwseAdapter::new(client, &settings.twse_base_url)),
        ProviderKind::Library => {
            let source = library::YahooChartSource::new(client, &settings.yahoo_base_url);
            Arc::new(library::LibraryAdapter::new(source))
        }
    };
    Ok(provider)
}

pub fn build_providers(kinds: &[ProviderKind], settings: &HttpSettings) -> anyhow::Result<Vec<Arc<dyn QuoteProvider>>> {
    kinds.iter().map(|k| build_provider(*k, settings)).collect()
}

pub(crate) fn record_fetch(kind: ProviderKind, raw: &RawQuote) {
    let outcome = if raw.is_complete() {
        "complete"
    } else if raw.latest.is_some() || raw.previous_close.is_some() {
        "partial"
    } else {
        "absent"
    };
    metrics::counter!("stockwatch_provider_fetch_total", "provider" => kind.as_str(), "outcome" => outcome)
        .increment(1);
}

pub mod library;
pub mod twse;
pub mod twse_types;
pub mod yahoo;
pub mod yahoo_types;
