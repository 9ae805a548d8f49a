use std::{sync::Arc, time::Instant};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};

use super::{
    models::{ErrorResponse, SearchRequest, SearchResponse},
    AppState,
};

/// Simple health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "geosearch",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Query cache metrics endpoint
pub async fn cache_stats_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let metrics = app_state.cache.metrics();
    Json(serde_json::json!({
        "hits": metrics.hits,
        "misses": metrics.misses,
        "evictions": metrics.evictions,
        "size": metrics.size,
        "hit_rate": metrics.hit_rate(),
        "ttl_secs": metrics.ttl_secs,
        "sweep_interval_secs": metrics.sweep_interval_secs,
    }))
}

/// Handler for POST /search - translate the query and return matching rows
pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ErrorResponse>)> {
    let start_time = Instant::now();

    log::debug!("Search handler called with query: {}", payload.query);

    match app_state.pipeline.search(&payload.query).await {
        Ok(rows) => {
            log::info!(
                "Search succeeded: {} rows in {:.2}ms",
                rows.len(),
                start_time.elapsed().as_secs_f64() * 1000.0
            );
            Ok(Json(SearchResponse { postgres: rows }))
        }
        Err(e) => {
            log::error!("Search failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
