// Wiring from `Settings` to the runtime pieces, shared by every subcommand.

use std::sync::Arc;

use tracing::info;

use crate::config::{Settings, SourceMode};
use crate::dashboard::AppState;
use crate::market_data::adapters::{build_providers, http_client, yahoo::YahooQuoteAdapter};
use crate::news::NewsClient;
use crate::persist::file::JsonFileSnapshotStore;
use crate::quote::cache::QuoteCache;
use crate::quote::resolver::{QuoteResolver, SourceStrategy};

pub fn snapshot_store(settings: &Settings) -> anyhow::Result<JsonFileSnapshotStore> {
    Ok(JsonFileSnapshotStore::new(
        settings.source.snapshot_path.clone(),
        settings.display.offset()?,
    ))
}

pub fn build_resolver(settings: &Settings) -> anyhow::Result<QuoteResolver> {
    let strategy = match settings.source.mode {
        SourceMode::Live => {
            info!(providers = ?settings.source.providers, "live quote mode");
            SourceStrategy::Live { providers: build_providers(&settings.source.providers, &settings.http)? }
        }
        SourceMode::Snapshot => {
            info!(path = %settings.source.snapshot_path.display(), "snapshot quote mode");
            SourceStrategy::Snapshot { store: Arc::new(snapshot_store(settings)?) }
        }
    };
    Ok(QuoteResolver::new(strategy, QuoteCache::new(settings.cache.ttl())))
}

pub fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    Ok(AppState {
        resolver: build_resolver(settings)?,
        news: NewsClient::new(http_client(&settings.http)?, settings.news.clone()),
        symbols: settings.symbol_set(),
        dashboard: settings.dashboard.clone(),
        mode: settings.source.mode,
        offset: settings.display.offset()?,
        cache_ttl_secs: settings.cache.ttl_secs,
    })
}

pub fn refresh_adapter(settings: &Settings) -> anyhow::Result<YahooQuoteAdapter> {
    Ok(YahooQuoteAdapter::new(http_client(&settings.http)?, &settings.http.yahoo_base_url))
}
