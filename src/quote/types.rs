use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Adapter output: (latest, previous_close). Either side may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawQuote {
    pub latest: Option<Decimal>,
    pub previous_close: Option<Decimal>,
}

impl RawQuote {
    pub fn new(latest: Option<Decimal>, previous_close: Option<Decimal>) -> Self {
        Self { latest, previous_close }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.latest.is_some() && self.previous_close.is_some()
    }
}

/// A quote for one symbol as the dashboard sees it.
///
/// `None` prices mean "unavailable" and are never read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedQuote {
    pub symbol: String,
    pub display_name: String,
    pub latest_price: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    pub fetched_at: DateTime<Utc>,
}

impl NormalizedQuote {
    pub fn from_raw(cfg: &SymbolConfig, raw: RawQuote, fetched_at: DateTime<Utc>) -> Self {
        Self {
            symbol: cfg.symbol.clone(),
            display_name: cfg.display_name.clone(),
            latest_price: raw.latest,
            previous_close: raw.previous_close,
            fetched_at,
        }
    }

    // Derived metrics, only when both prices are known
    pub fn change(&self) -> Option<PriceChange> {
        PriceChange::compute(self.latest_price?, self.previous_close?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Positive,
    Negative,
    Flat,
}

impl Sign {
    pub fn of(value: Decimal) -> Self {
        if value.is_zero() {
            Sign::Flat
        } else if value.is_sign_negative() {
            Sign::Negative
        } else {
            Sign::Positive
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceChange {
    pub latest: Decimal,
    pub previous: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub sign: Sign,
}

impl PriceChange {
    /// `change_percent` is defined as zero when `previous` is zero.
    /// Returns `None` only if the arithmetic overflows.
    pub fn compute(latest: Decimal, previous: Decimal) -> Option<Self> {
        let change = latest.checked_sub(previous)?;
        let change_percent = if previous.is_zero() {
            Decimal::ZERO
        } else {
            change.checked_div(previous)?.checked_mul(Decimal::ONE_HUNDRED)?
        };
        Some(Self {
            latest,
            previous,
            change,
            change_percent,
            sign: Sign::of(change),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolConfig {
    pub symbol: String,       // e.g. "2330.TW"
    pub display_name: String, // e.g. "台積電 2330"
    pub news_query: String,
    pub widget_ticker: String, // e.g. "TWSE:2330"
}

impl SymbolConfig {
    pub fn new(symbol: &str, display_name: &str, news_query: &str, widget_ticker: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            news_query: news_query.to_string(),
            widget_ticker: widget_ticker.to_string(),
        }
    }
}

pub fn default_symbols() -> Vec<SymbolConfig> {
    vec![
        SymbolConfig::new("2330.TW", "台積電 2330", "台積電 2330", "TWSE:2330"),
        SymbolConfig::new("0050.TW", "0050 元大台灣50", "0050 元大台灣50", "TWSE:0050"),
    ]
}

// Fixed for the lifetime of the process; cheap to clone into handlers.
#[derive(Debug, Clone)]
pub struct SymbolSet(Arc<[SymbolConfig]>);

impl SymbolSet {
    pub fn new(symbols: Vec<SymbolConfig>) -> Self {
        Self(symbols.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolConfig> {
        self.0.iter()
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolConfig> {
        self.0.iter().find(|s| s.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn first(&self) -> Option<&SymbolConfig> {
        self.0.first()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.symbol.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
