use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use serde::Deserialize;
use tracing::instrument;

use super::render::{render_page, Page};
use super::AppState;
use crate::config::SourceMode;
use crate::quote::resolver::Resolution;

#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    pub tab: Option<String>,
    pub q: Option<String>, // news keyword override
}

pub async fn health() -> &'static str {
    "ok"
}

#[instrument(skip(state))]
pub async fn index(State(state): State<Arc<AppState>>, Query(params): Query<IndexParams>) -> Html<String> {
    Html(render_index(&state, params).await)
}

pub async fn render_index(state: &AppState, params: IndexParams) -> String {
    let symbols: Vec<_> = state.symbols.iter().cloned().collect();
    // validated non-empty at startup; fall back to an empty page otherwise
    let Some(selected) = params
        .tab
        .as_deref()
        .and_then(|t| state.symbols.get(t))
        .or_else(|| state.symbols.first())
        .cloned()
    else {
        return String::from("<!DOCTYPE html><p>No symbols configured.</p>");
    };

    let resolution = state.resolver.resolve(&selected).await;
    let news_query = params
        .q
        .map(|q| q.trim().to_string())
        .unwrap_or_else(|| selected.news_query.clone());
    let news = state.news.search(&news_query).await;
    let caption = caption(state).await;

    render_page(&Page {
        settings: &state.dashboard,
        symbols: &symbols,
        selected: &selected,
        resolution: &resolution,
        caption,
        news_query: &news_query,
        news: &news,
    })
}

async fn caption(state: &AppState) -> String {
    match state.mode {
        SourceMode::Snapshot => match state.resolver.snapshot_time().await {
            Some(ts) => format!(
                "Data fetched at {} (refreshed by the scheduled snapshot job)",
                ts.with_timezone(&state.offset).format("%Y-%m-%d %H:%M")
            ),
            None => "No snapshot yet; waiting for the scheduled refresh job to run.".to_string(),
        },
        SourceMode::Live => format!("Live quotes, cached for up to {} s", state.cache_ttl_secs),
    }
}

pub async fn quotes(State(state): State<Arc<AppState>>) -> Json<Vec<Resolution>> {
    Json(state.resolver.resolve_all(state.symbols.iter()).await)
}
