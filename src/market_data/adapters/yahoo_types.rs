// Source: GET https://query1.finance.yahoo.com/v7/finance/quote?symbols=2330.TW,0050.TW
// Prices stay as raw JSON values; the Normaliser decides what is usable.
use serde_json::Value;

#[derive(Debug, Default, serde::Deserialize)]
pub struct QuoteEnvelope {
    #[serde(rename = "quoteResponse", default)]
    pub quote_response: Option<QuoteResponse>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct QuoteResponse {
    #[serde(default)]
    pub result: Option<Vec<Value>>, // entries are objects; kept loose to survive odd shapes
    #[serde(default)]
    pub error: Option<Value>,
}

pub const LATEST_KEYS: &[&str] = &["regularMarketPrice"];
pub const PREVIOUS_KEYS: &[&str] = &["regularMarketPreviousClose", "previousClose"];

// Source: GET https://query1.finance.yahoo.com/v8/finance/chart/{symbol}
#[derive(Debug, Default, serde::Deserialize)]
pub struct ChartEnvelope {
    #[serde(default)]
    pub chart: Option<ChartBody>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<Value>>, // [{ "meta": {...}, "timestamp": [...], ... }]
}
