//! Pure conversions between `Snapshot` and its JSON document.
//!
//! No file access here; `file.rs` owns the disk side.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::warn;

use crate::market_data::normaliser::Normaliser;
use crate::persist::types::{PersistResult, Snapshot, SnapshotDocument, SnapshotItem};
use crate::quote::types::NormalizedQuote;

// Format written by older refresher runs, e.g. "2025年01月06日 13:30"
const LEGACY_TIMESTAMP: &str = "%Y年%m月%d日 %H:%M";

/// Build the serializable document. Timestamps are written in `offset`.
pub fn to_document(snapshot: &Snapshot, offset: FixedOffset) -> SnapshotDocument<'_> {
    let items = snapshot
        .items
        .iter()
        .map(|(symbol, q)| {
            let item = SnapshotItem {
                name: q.display_name.as_str(),
                latest: q.latest_price,
                prev_close: q.previous_close,
            };
            (symbol.as_str(), item)
        })
        .collect();
    SnapshotDocument {
        fetched_at: snapshot.fetched_at.with_timezone(&offset).to_rfc3339(),
        items,
    }
}

pub fn to_json(snapshot: &Snapshot, offset: FixedOffset) -> PersistResult<String> {
    Ok(serde_json::to_string_pretty(&to_document(snapshot, offset))?)
}

/// Parse a snapshot document.
///
/// `Ok(None)` means "no usable snapshot yet": a missing `fetched_at` or
/// `items`, or a timestamp that cannot be read. Only invalid JSON is an error.
pub fn from_json(text: &str, offset: FixedOffset) -> PersistResult<Option<Snapshot>> {
    let doc: Value = serde_json::from_str(text)?;
    Ok(from_value(&doc, offset))
}

pub fn from_value(doc: &Value, offset: FixedOffset) -> Option<Snapshot> {
    let fetched_at = doc.get("fetched_at")?.as_str()?;
    let items = doc.get("items")?.as_object()?;
    let Some(fetched_at) = parse_timestamp(fetched_at, offset) else {
        warn!(fetched_at, "snapshot timestamp is unreadable");
        return None;
    };

    let normaliser = Normaliser::default();
    let mut snapshot = Snapshot::new(fetched_at);
    for (symbol, item) in items {
        if !item.is_object() {
            continue;
        }
        let display_name = item
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(symbol)
            .to_string();
        let price = |key: &str| item.get(key).and_then(|v| normaliser.price_from_value(v));
        snapshot.insert(NormalizedQuote {
            symbol: symbol.clone(),
            display_name,
            latest_price: price("latest"),
            previous_close: price("prev_close"),
            fetched_at,
        });
    }
    Some(snapshot)
}

fn parse_timestamp(s: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, LEGACY_TIMESTAMP).ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|ts| ts.with_timezone(&Utc))
}
