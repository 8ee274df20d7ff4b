// Direct HTTP JSON adapter for Yahoo's v7 quote endpoint.
// Accepts a comma-joined symbol list, so the refresher can batch a whole run.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use super::yahoo_types::{QuoteEnvelope, LATEST_KEYS, PREVIOUS_KEYS};
use super::{record_fetch, ProviderKind, QuoteProvider};
use crate::market_data::normaliser::Normaliser;
use crate::quote::types::RawQuote;

pub struct YahooQuoteAdapter {
    client: reqwest::Client,
    pub quote_url: String, // "{base}/v7/finance/quote"
    normaliser: Normaliser,
}

impl YahooQuoteAdapter {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            quote_url: format!("{}/v7/finance/quote", base_url.trim_end_matches('/')),
            normaliser: Normaliser::default(),
        }
    }

    /// One request for every symbol. Symbols the upstream did not return are
    /// simply missing from the map. Transport errors, non-2xx statuses and
    /// non-JSON bodies are returned as errors.
    pub async fn try_fetch_batch(&self, symbols: &[&str]) -> anyhow::Result<HashMap<String, RawQuote>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        let body = self.request(symbols).await?;
        Ok(quotes_from_body(&self.normaliser, &body))
    }

    // Same as `try_fetch_batch`, but a failed request is logged and yields an empty map.
    pub async fn fetch_batch(&self, symbols: &[&str]) -> HashMap<String, RawQuote> {
        match self.try_fetch_batch(symbols).await {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!(provider = "yahoo", symbols = %symbols.join(","), error = %e, "quote request failed");
                HashMap::new()
            }
        }
    }

    async fn request(&self, symbols: &[&str]) -> anyhow::Result<Value> {
        let joined = symbols.join(",");
        let res = self
            .client
            .get(&self.quote_url)
            .query(&[("symbols", joined.as_str())])
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json::<Value>().await?)
    }
}

// Pure mapping from a response body to per-symbol pairs
pub fn quotes_from_body(normaliser: &Normaliser, body: &Value) -> HashMap<String, RawQuote> {
    let envelope: QuoteEnvelope = match serde_json::from_value(body.clone()) {
        Ok(env) => env,
        Err(e) => {
            debug!(error = %e, "unexpected yahoo payload shape");
            return HashMap::new();
        }
    };
    let Some(response) = envelope.quote_response else {
        return HashMap::new();
    };
    if let Some(err) = response.error.as_ref().filter(|e| !e.is_null()) {
        debug!(error = %err, "yahoo reported an error");
    }

    let mut by_symbol = HashMap::new();
    for entry in response.result.unwrap_or_default() {
        let Some(symbol) = entry.get("symbol").and_then(Value::as_str) else {
            continue;
        };
        let raw = RawQuote::new(
            normaliser.first_price(&entry, LATEST_KEYS),
            normaliser.first_price(&entry, PREVIOUS_KEYS),
        );
        by_symbol.insert(symbol.to_string(), raw);
    }
    by_symbol
}

#[async_trait::async_trait]
impl QuoteProvider for YahooQuoteAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Yahoo
    }

    async fn fetch(&self, symbol: &str) -> RawQuote {
        let raw = self
            .fetch_batch(&[symbol])
            .await
            .remove(symbol)
            .unwrap_or_else(RawQuote::absent);
        if !raw.is_complete() {
            warn!(provider = "yahoo", symbol, ?raw, "incomplete quote");
        }
        record_fetch(ProviderKind::Yahoo, &raw);
        raw
    }
}
