//! Browser dashboard.
//!
//! - `GET /`            quote panel + news search + chart widget (`?tab=`, `?q=`)
//! - `GET /api/quotes`  resolutions for every configured symbol as JSON
//! - `GET /health`

pub mod handlers;
pub mod render;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use chrono::FixedOffset;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{DashboardSettings, SourceMode};
use crate::news::NewsClient;
use crate::quote::resolver::QuoteResolver;
use crate::quote::types::SymbolSet;

/// Application state shared across handlers
pub struct AppState {
    pub resolver: QuoteResolver,
    pub news: NewsClient,
    pub symbols: SymbolSet,
    pub dashboard: DashboardSettings,
    pub mode: SourceMode,
    pub offset: FixedOffset,
    pub cache_ttl_secs: u64,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/quotes", get(handlers::quotes))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    info!("Starting dashboard at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
