use std::sync::Arc;

use anyhow::{Context, Result};
use reporting_service::{
    config::AppConfig,
    http::{create_router, AppState},
    metrics_server, observability, sources,
    store::ReadingStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let source = Arc::new(sources::from_config(&cfg)?);
    let max_age = time::Duration::seconds(i64::try_from(cfg.store.max_age_secs).unwrap_or(i64::MAX));
    let store = Arc::new(ReadingStore::new(max_age));

    // Warm the cache so the first request does not pay for the fetch.
    let snapshot = store.refresh(source.as_ref()).await;
    tracing::info!(readings = snapshot.readings.len(), "initial readings loaded");

    let state = AppState {
        source,
        store,
        api: cfg.api_client()?,
        offset: cfg.report.offset()?,
        currency: cfg.report.currency(),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.server.bind_addr))?;
    tracing::info!(addr = %cfg.server.bind_addr, "reporting service listening");

    axum::serve(listener, app).await?;

    Ok(())
}
