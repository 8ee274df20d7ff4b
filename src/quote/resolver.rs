// Resolver: one data-source strategy per deployment, live providers or the
// snapshot file. Never mixes the two and never merges fields across providers.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::market_data::adapters::QuoteProvider;
use crate::persist::{Snapshot, SnapshotStore};
use crate::quote::cache::QuoteCache;
use crate::quote::types::{NormalizedQuote, PriceChange, SymbolConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    Incomplete,          // every live provider came back without both prices
    AwaitingSnapshot,    // no usable snapshot file yet
    MissingFromSnapshot, // snapshot exists, entry absent or incomplete
}

impl UnavailableReason {
    pub fn message(&self) -> &'static str {
        match self {
            UnavailableReason::Incomplete => "quote data is currently unavailable",
            UnavailableReason::AwaitingSnapshot => "awaiting the first snapshot refresh",
            UnavailableReason::MissingFromSnapshot => "missing from the latest snapshot; waiting for the next refresh",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Available {
        quote: NormalizedQuote,
        change: PriceChange,
    },
    Unavailable {
        symbol: String,
        display_name: String,
        reason: UnavailableReason,
    },
}

impl Resolution {
    fn from_quote(quote: NormalizedQuote, missing: UnavailableReason) -> Self {
        match quote.change() {
            Some(change) => Resolution::Available { quote, change },
            None => Resolution::Unavailable {
                symbol: quote.symbol,
                display_name: quote.display_name,
                reason: missing,
            },
        }
    }

    fn unavailable(cfg: &SymbolConfig, reason: UnavailableReason) -> Self {
        Resolution::Unavailable {
            symbol: cfg.symbol.clone(),
            display_name: cfg.display_name.clone(),
            reason,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Resolution::Available { quote, .. } => &quote.symbol,
            Resolution::Unavailable { symbol, .. } => symbol,
        }
    }
}

pub enum SourceStrategy {
    // tried in order; the first complete pair wins
    Live { providers: Vec<Arc<dyn QuoteProvider>> },
    Snapshot { store: Arc<dyn SnapshotStore> },
}

impl SourceStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            SourceStrategy::Live { .. } => "live",
            SourceStrategy::Snapshot { .. } => "snapshot",
        }
    }
}

pub struct QuoteResolver {
    strategy: SourceStrategy,
    cache: QuoteCache,
}

impl QuoteResolver {
    pub fn new(strategy: SourceStrategy, cache: QuoteCache) -> Self {
        Self { strategy, cache }
    }

    #[instrument(skip(self, cfg), fields(symbol = %cfg.symbol, strategy = self.strategy.name()))]
    pub async fn resolve(&self, cfg: &SymbolConfig) -> Resolution {
        let now = Instant::now();
        if let Some(hit) = self.cache.get(&cfg.symbol, now) {
            return hit;
        }
        let resolution = match &self.strategy {
            SourceStrategy::Live { providers } => resolve_live(providers, cfg).await,
            SourceStrategy::Snapshot { store } => match load(store.as_ref()).await {
                Some(snap) => resolve_from_snapshot(&snap, cfg),
                None => Resolution::unavailable(cfg, UnavailableReason::AwaitingSnapshot),
            },
        };
        self.cache.evict_expired(now);
        self.cache.insert(&cfg.symbol, resolution.clone(), now);
        resolution
    }

    // Sequential on purpose: a page has a couple of symbols at most.
    pub async fn resolve_all<'a, I>(&self, symbols: I) -> Vec<Resolution>
    where
        I: IntoIterator<Item = &'a SymbolConfig>,
    {
        let mut out = Vec::new();
        for cfg in symbols {
            out.push(self.resolve(cfg).await);
        }
        out
    }

    // Snapshot timestamp for the page caption; None in live mode or before the first refresh.
    pub async fn snapshot_time(&self) -> Option<chrono::DateTime<Utc>> {
        match &self.strategy {
            SourceStrategy::Snapshot { store } => load(store.as_ref()).await.map(|s| s.fetched_at),
            SourceStrategy::Live { .. } => None,
        }
    }
}

async fn resolve_live(providers: &[Arc<dyn QuoteProvider>], cfg: &SymbolConfig) -> Resolution {
    for provider in providers {
        let raw = provider.fetch(&cfg.symbol).await;
        if raw.is_complete() {
            debug!(provider = %provider.kind(), "provider returned a complete quote");
            let quote = NormalizedQuote::from_raw(cfg, raw, Utc::now());
            return Resolution::from_quote(quote, UnavailableReason::Incomplete);
        }
        info!(provider = %provider.kind(), "provider incomplete, trying next");
    }
    Resolution::unavailable(cfg, UnavailableReason::Incomplete)
}

pub fn resolve_from_snapshot(snap: &Snapshot, cfg: &SymbolConfig) -> Resolution {
    match snap.get(&cfg.symbol) {
        Some(quote) => Resolution::from_quote(quote.clone(), UnavailableReason::MissingFromSnapshot),
        None => Resolution::unavailable(cfg, UnavailableReason::MissingFromSnapshot),
    }
}

async fn load(store: &dyn SnapshotStore) -> Option<Snapshot> {
    match store.load_snapshot().await {
        Ok(snap) => snap,
        Err(e) => {
            warn!(error = %e, "snapshot unreadable, treating as absent");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::adapters::ProviderKind;
    use crate::persist::{PersistError, PersistResult};
    use crate::quote::types::{default_symbols, RawQuote, Sign};
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedProvider {
        kind: ProviderKind,
        raw: RawQuote,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn new(kind: ProviderKind, raw: RawQuote) -> Arc<Self> {
            Arc::new(Self { kind, raw, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait::async_trait]
    impl QuoteProvider for FixedProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn fetch(&self, _symbol: &str) -> RawQuote {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.raw
        }
    }

    struct MemoryStore(Mutex<Option<Snapshot>>);

    #[async_trait::async_trait]
    impl SnapshotStore for MemoryStore {
        async fn load_snapshot(&self) -> PersistResult<Option<Snapshot>> {
            Ok(self.0.lock().clone())
        }

        async fn save_snapshot(&self, snapshot: &Snapshot) -> PersistResult<()> {
            *self.0.lock() = Some(snapshot.clone());
            Ok(())
        }
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl SnapshotStore for BrokenStore {
        async fn load_snapshot(&self) -> PersistResult<Option<Snapshot>> {
            Err(PersistError::InvalidPath("broken".into()))
        }

        async fn save_snapshot(&self, _snapshot: &Snapshot) -> PersistResult<()> {
            Ok(())
        }
    }

    fn tsmc() -> SymbolConfig {
        default_symbols().remove(0)
    }

    fn live(providers: Vec<Arc<dyn QuoteProvider>>) -> QuoteResolver {
        QuoteResolver::new(SourceStrategy::Live { providers }, QuoteCache::disabled())
    }

    #[tokio::test]
    async fn test_live_available_with_change() {
        let p = FixedProvider::new(ProviderKind::Yahoo, RawQuote::new(Some(dec!(103.50)), Some(dec!(100.00))));
        let res = live(vec![p as Arc<dyn QuoteProvider>]).resolve(&tsmc()).await;
        let Resolution::Available { quote, change } = res else { panic!("expected available") };
        assert_eq!(quote.symbol, "2330.TW");
        assert_eq!(change.change, dec!(3.50));
        assert_eq!(change.change_percent, dec!(3.50));
        assert_eq!(change.sign, Sign::Positive);
    }

    #[tokio::test]
    async fn test_live_empty_upstream_is_unavailable() {
        let p = FixedProvider::new(ProviderKind::Yahoo, RawQuote::absent());
        let res = live(vec![p as Arc<dyn QuoteProvider>]).resolve(&tsmc()).await;
        assert_eq!(
            res,
            Resolution::Unavailable {
                symbol: "2330.TW".into(),
                display_name: "台積電 2330".into(),
                reason: UnavailableReason::Incomplete,
            }
        );
    }

    #[tokio::test]
    async fn test_fallback_order_first_complete_wins() {
        let twse = FixedProvider::new(ProviderKind::Twse, RawQuote::new(None, Some(dec!(100))));
        let yahoo = FixedProvider::new(ProviderKind::Yahoo, RawQuote::new(Some(dec!(101)), Some(dec!(99))));
        let library = FixedProvider::new(ProviderKind::Library, RawQuote::new(Some(dec!(1)), Some(dec!(1))));
        let resolver = live(vec![
            twse.clone() as Arc<dyn QuoteProvider>,
            yahoo.clone() as Arc<dyn QuoteProvider>,
            library.clone() as Arc<dyn QuoteProvider>,
        ]);

        let Resolution::Available { quote, .. } = resolver.resolve(&tsmc()).await else {
            panic!("expected available")
        };
        // values come from yahoo alone; twse's previous close is not merged in
        assert_eq!(quote.latest_price, Some(dec!(101)));
        assert_eq!(quote.previous_close, Some(dec!(99)));
        assert_eq!(twse.calls.load(Ordering::SeqCst), 1);
        assert_eq!(yahoo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(library.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_avoids_refetch() {
        let p = FixedProvider::new(ProviderKind::Yahoo, RawQuote::new(Some(dec!(10)), Some(dec!(10))));
        let resolver = QuoteResolver::new(
            SourceStrategy::Live { providers: vec![p.clone() as Arc<dyn QuoteProvider>] },
            QuoteCache::new(Duration::from_secs(30)),
        );
        resolver.resolve(&tsmc()).await;
        resolver.resolve(&tsmc()).await;
        assert_eq!(p.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_snapshot_mode() {
        let at = Utc.with_ymd_and_hms(2025, 1, 6, 5, 30, 0).unwrap();
        let mut snap = Snapshot::new(at);
        snap.insert(NormalizedQuote::from_raw(&tsmc(), RawQuote::new(Some(dec!(5.00)), Some(dec!(0))), at));
        let store = Arc::new(MemoryStore(Mutex::new(Some(snap))));
        let resolver = QuoteResolver::new(SourceStrategy::Snapshot { store }, QuoteCache::disabled());

        let Resolution::Available { change, quote } = resolver.resolve(&tsmc()).await else {
            panic!("expected available")
        };
        assert_eq!(quote.fetched_at, at);
        assert_eq!(change.change, dec!(5.00));
        assert_eq!(change.change_percent, dec!(0));

        let etf = default_symbols().remove(1);
        let missing = resolver.resolve(&etf).await;
        assert!(matches!(missing, Resolution::Unavailable { reason: UnavailableReason::MissingFromSnapshot, .. }));
        assert_eq!(resolver.snapshot_time().await, Some(at));
    }

    #[tokio::test]
    async fn test_snapshot_absent_or_broken_is_awaiting() {
        for store in [
            Arc::new(MemoryStore(Mutex::new(None))) as Arc<dyn SnapshotStore>,
            Arc::new(BrokenStore) as Arc<dyn SnapshotStore>,
        ] {
            let resolver = QuoteResolver::new(SourceStrategy::Snapshot { store }, QuoteCache::disabled());
            let res = resolver.resolve(&tsmc()).await;
            assert!(matches!(res, Resolution::Unavailable { reason: UnavailableReason::AwaitingSnapshot, .. }));
        }
    }

    #[tokio::test]
    async fn test_resolve_all_keeps_order() {
        let p = FixedProvider::new(ProviderKind::Yahoo, RawQuote::absent());
        let symbols = default_symbols();
        let out = live(vec![p as Arc<dyn QuoteProvider>]).resolve_all(&symbols).await;
        let names: Vec<_> = out.iter().map(Resolution::symbol).collect();
        assert_eq!(names, vec!["2330.TW", "0050.TW"]);
    }
}
