// Section-based adapter: reads a `fast_info` section and, only when that is
// incomplete, an `info` section. Either may come back missing, null, or as
// something other than an object; those are skipped before indexing.

use serde_json::Value;
use tracing::{debug, warn};

use super::yahoo_types::{ChartEnvelope, QuoteEnvelope};
use super::{record_fetch, ProviderKind, QuoteProvider};
use crate::market_data::normaliser::Normaliser;
use crate::quote::types::RawQuote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    FastInfo,
    Info,
}

const FAST_LATEST: &[&str] = &["regularMarketPrice", "lastPrice", "last_price"];
const FAST_PREVIOUS: &[&str] = &["previousClose", "previous_close", "chartPreviousClose"];
const INFO_LATEST: &[&str] = &["regularMarketPrice", "currentPrice"];
const INFO_PREVIOUS: &[&str] = &["regularMarketPreviousClose", "previousClose"];

/// Something that hands out loosely-typed dictionaries per symbol.
#[async_trait::async_trait]
pub trait SectionSource: Send + Sync {
    async fn section(&self, symbol: &str, section: Section) -> anyhow::Result<Option<Value>>;
}

pub struct LibraryAdapter<S> {
    source: S,
    normaliser: Normaliser,
}

impl<S: SectionSource> LibraryAdapter<S> {
    pub fn new(source: S) -> Self {
        Self { source, normaliser: Normaliser::default() }
    }

    async fn load(&self, symbol: &str, section: Section) -> Option<Value> {
        match self.source.section(symbol, section).await {
            // only dictionaries are worth indexing
            Ok(Some(v)) if v.is_object() => Some(v),
            Ok(Some(other)) => {
                debug!(symbol, ?section, kind = value_kind(&other), "section is not an object");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(provider = "library", symbol, ?section, error = %e, "section fetch failed");
                None
            }
        }
    }

    fn pick(&self, section: Option<&Value>, keys: &[&str]) -> Option<rust_decimal::Decimal> {
        section.and_then(|s| self.normaliser.first_price(s, keys))
    }
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait::async_trait]
impl<S: SectionSource> QuoteProvider for LibraryAdapter<S> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Library
    }

    async fn fetch(&self, symbol: &str) -> RawQuote {
        let fast = self.load(symbol, Section::FastInfo).await;
        let mut latest = self.pick(fast.as_ref(), FAST_LATEST);
        let mut previous = self.pick(fast.as_ref(), FAST_PREVIOUS);

        if latest.is_none() || previous.is_none() {
            let info = self.load(symbol, Section::Info).await;
            latest = latest.or_else(|| self.pick(info.as_ref(), INFO_LATEST));
            previous = previous.or_else(|| self.pick(info.as_ref(), INFO_PREVIOUS));
        }

        let raw = RawQuote::new(latest, previous);
        if !raw.is_complete() {
            warn!(provider = "library", symbol, ?raw, "incomplete quote");
        }
        record_fetch(ProviderKind::Library, &raw);
        raw
    }
}

// Default source: chart `meta` as fast_info, the v7 quote entry as info.
pub struct YahooChartSource {
    client: reqwest::Client,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_string() }
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> anyhow::Result<Value> {
        let res = self.client.get(url).query(query).send().await?.error_for_status()?;
        Ok(res.json::<Value>().await?)
    }
}

#[async_trait::async_trait]
impl SectionSource for YahooChartSource {
    async fn section(&self, symbol: &str, section: Section) -> anyhow::Result<Option<Value>> {
        match section {
            Section::FastInfo => {
                let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
                let body = self.get_json(&url, &[("range", "1d"), ("interval", "1d")]).await?;
                let envelope: ChartEnvelope = serde_json::from_value(body)?;
                let meta = envelope
                    .chart
                    .and_then(|c| c.result)
                    .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
                    .and_then(|first| first.get("meta").cloned());
                Ok(meta)
            }
            Section::Info => {
                let url = format!("{}/v7/finance/quote", self.base_url);
                let body = self.get_json(&url, &[("symbols", symbol)]).await?;
                let envelope: QuoteEnvelope = serde_json::from_value(body)?;
                let entry = envelope
                    .quote_response
                    .and_then(|q| q.result)
                    .unwrap_or_default()
                    .into_iter()
                    .find(|e| e.get("symbol").and_then(Value::as_str) == Some(symbol));
                Ok(entry)
            }
        }
    }
}
