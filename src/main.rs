use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pancake_lab::api::{self, AppState, RateLimiter};
use pancake_lab::audit::TracingAuditLog;
use pancake_lab::config::{load_config, AppConfig};
use pancake_lab::metrics::Metrics;
use pancake_lab::services::{OrderService, PancakeService};
use pancake_lab::utils::RetryConfig;

const DEFAULT_LOG_FILTER: &str = "info,pancake_lab=debug";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // === 1. Load configuration ===
    // First CLI argument wins over PANCAKE_CONFIG; without either only
    // defaults and PANCAKE_* variables apply
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PANCAKE_CONFIG").ok())
        .map(PathBuf::from);
    let config = load_config(config_path.as_deref()).context("failed to load configuration")?;

    // === 2. Structured logging ===
    // RUST_LOG overrides the configured filter
    init_tracing(&config);

    tracing::info!("🥞 Starting pancake lab");
    if let Some(path) = &config_path {
        tracing::info!(path = %path.display(), "Configuration loaded");
    }

    // === 3. Metrics and services ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    let retry = RetryConfig::from(&config.retry);
    tracing::info!(
        max_attempts = retry.max_attempts,
        backoff_step_ms = retry.backoff_step.as_millis() as u64,
        "Optimistic update retry policy"
    );

    let orders = Arc::new(OrderService::new(
        retry,
        Arc::new(TracingAuditLog),
        Arc::clone(&metrics),
    ));
    let pancakes = Arc::new(PancakeService::new(Arc::clone(&orders)));
    let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));

    // === 4. Forget idle rate limit windows ===
    let purge_every = config.rate_limit.window();
    let purged_limiter = Arc::clone(&limiter);
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(purge_every);
        loop {
            interval.tick().await;
            let removed = purged_limiter.purge_expired();
            if removed > 0 {
                tracing::debug!(removed = removed, "Purged expired rate limit windows");
            }
        }
    });

    // === 5. HTTP server ===
    let state = web::Data::new(AppState {
        orders,
        pancakes,
        metrics,
        limiter,
    });
    let server_config = &config.server;

    tracing::info!(
        "🚀 Listening on http://{}:{} ({} workers)",
        server_config.host,
        server_config.port,
        server_config.workers
    );

    HttpServer::new(move || App::new().app_data(state.clone()).configure(api::configure))
        .workers(server_config.workers)
        .backlog(server_config.backlog)
        .client_request_timeout(server_config.request_timeout())
        .shutdown_timeout(server_config.shutdown_timeout_secs)
        .bind((server_config.host, server_config.port))
        .with_context(|| {
            format!(
                "failed to bind {}:{}",
                server_config.host, server_config.port
            )
        })?
        .run()
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let fallback = config
        .log
        .filter
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&fallback))
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();
}

