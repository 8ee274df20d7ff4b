// Snapshot refresher: one batched upstream call, one whole-file write.
// Scheduling is somebody else's job (cron, CI schedule, systemd timer).

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::market_data::adapters::yahoo::YahooQuoteAdapter;
use crate::persist::{Snapshot, SnapshotStore};
use crate::quote::types::{NormalizedQuote, RawQuote, SymbolSet};

/// Build the snapshot for `symbols` from a single batched request.
/// Symbols the upstream left out are recorded with absent prices; a failed
/// request is an error so the previous snapshot stays in place.
pub async fn build_snapshot(
    adapter: &YahooQuoteAdapter,
    symbols: &SymbolSet,
    now: DateTime<Utc>,
) -> anyhow::Result<Snapshot> {
    let mut by_symbol = adapter
        .try_fetch_batch(&symbols.symbols())
        .await
        .context("batched quote request failed")?;
    let mut snapshot = Snapshot::new(now);
    for cfg in symbols.iter() {
        let raw = by_symbol.remove(&cfg.symbol).unwrap_or_else(RawQuote::absent);
        if !raw.is_complete() {
            warn!(symbol = %cfg.symbol, ?raw, "refresh produced an incomplete quote");
        }
        snapshot.insert(NormalizedQuote::from_raw(cfg, raw, now));
    }
    Ok(snapshot)
}

#[instrument(skip_all, fields(symbols = symbols.len()))]
pub async fn refresh_snapshot(
    adapter: &YahooQuoteAdapter,
    symbols: &SymbolSet,
    store: &dyn SnapshotStore,
    now: DateTime<Utc>,
) -> anyhow::Result<Snapshot> {
    let snapshot = build_snapshot(adapter, symbols, now).await?;
    store.save_snapshot(&snapshot).await?;
    let complete = snapshot
        .items
        .values()
        .filter(|q| q.latest_price.is_some() && q.previous_close.is_some())
        .count();
    info!(complete, total = snapshot.items.len(), "snapshot refreshed");
    metrics::gauge!("stockwatch_snapshot_complete_items").set(complete as f64);
    Ok(snapshot)
}
