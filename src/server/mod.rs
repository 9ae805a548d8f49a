use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};

use handlers::{cache_stats_handler, health_check, search_handler};

use crate::config::ServerConfig;
use crate::db::{Database, PgDatabase};
use crate::llm::{GeminiClient, GenerationOptions, TextModel};

pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod query_cache;

/// Process-wide shared state: constructed once at startup, torn down at exit.
pub struct AppState {
    pub pipeline: pipeline::SearchPipeline,
    pub cache: Arc<query_cache::QueryCache>,
    pub config: ServerConfig,
}

pub async fn run() {
    dotenv().ok();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    run_with_config(config).await;
}

pub async fn run_with_config(config: ServerConfig) {
    dotenv().ok();

    log::info!(
        "Server configuration: http={}:{}, schema={}, model={}",
        config.http_host,
        config.http_port,
        config.schema,
        config.model
    );

    let db: Arc<dyn Database> = match PgDatabase::connect_from_env().await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            log::error!("Failed to connect to postgres: {}", e);
            log::error!("  Set PG_HOST, PG_PORT, PG_USER, PG_PASS and PG_DB.");
            std::process::exit(1);
        }
    };

    let generation_options = GenerationOptions {
        timeout: Duration::from_secs(config.request_timeout_secs),
        retries: config.generation_retries,
    };
    let model: Arc<dyn TextModel> =
        match GeminiClient::from_env(config.model.clone(), &generation_options) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                log::error!("Failed to create model client: {}", e);
                std::process::exit(1);
            }
        };

    let cache = Arc::new(query_cache::QueryCache::from_env());
    let metrics = cache.metrics();
    log::info!(
        "Initializing query cache: ttl={}s, sweep_interval={}s",
        metrics.ttl_secs,
        metrics.sweep_interval_secs
    );

    // Background sweep of expired cache entries
    let sweeper = cache.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweeper.sweep_interval());
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            let evicted = sweeper.sweep();
            if evicted > 0 {
                log::debug!("Cache sweep evicted {} expired entries", evicted);
            }
        }
    });

    let app_state = Arc::new(AppState {
        pipeline: pipeline::SearchPipeline::new(
            db,
            model,
            cache.clone(),
            config.schema.clone(),
        ),
        cache,
        config: config.clone(),
    });

    let http_bind_address = format!("{}:{}", config.http_host, config.http_port);
    log::info!("Starting HTTP server on {}", http_bind_address);

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/search", post(search_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(CatchPanicLayer::new())
        .with_state(app_state);

    let http_listener = match TcpListener::bind(&http_bind_address).await {
        Ok(listener) => {
            log::info!("Successfully bound HTTP listener to {}", http_bind_address);
            listener
        }
        Err(e) => {
            log::error!(
                "Failed to bind HTTP listener to {}: {}",
                http_bind_address,
                e
            );
            log::error!("  Is another process using port {}?", config.http_port);
            std::process::exit(1);
        }
    };

    println!("Geosearch server is running");
    println!("  HTTP API: http://{}", http_bind_address);

    if let Err(e) = axum::serve(http_listener, app).await {
        log::error!("HTTP server fatal error: {:?}", e);
        std::process::exit(1);
    }
}
