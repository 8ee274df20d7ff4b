use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::quote::types::NormalizedQuote;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("snapshot path has no file name: {0}")]
    InvalidPath(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// A batch of quotes written wholesale by one refresher run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub items: BTreeMap<String, NormalizedQuote>,
}

impl Snapshot {
    pub fn new(fetched_at: DateTime<Utc>) -> Self {
        Self { fetched_at, items: BTreeMap::new() }
    }

    pub fn insert(&mut self, quote: NormalizedQuote) {
        self.items.insert(quote.symbol.clone(), quote);
    }

    pub fn get(&self, symbol: &str) -> Option<&NormalizedQuote> {
        self.items.get(symbol)
    }
}

// On-disk shape: { "fetched_at": "...", "items": { "2330.TW": { "name", "latest", "prev_close" } } }
#[derive(Serialize)]
pub struct SnapshotDocument<'a> {
    pub fetched_at: String,
    pub items: BTreeMap<&'a str, SnapshotItem<'a>>,
}

#[derive(Serialize)]
pub struct SnapshotItem<'a> {
    pub name: &'a str,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub latest: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub prev_close: Option<Decimal>,
}
