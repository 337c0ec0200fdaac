use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use expensetrend_core::AppConfig;
use expensetrend_server::{router, AppState};
use expensetrend_storage::{QueryService, SqliteStore};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    Registry::default()
        .with(filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new("expensetrend-server".into(), std::io::stdout))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load(None).context("loading configuration")?;
    if let Some(parent) = config.database.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let store = SqliteStore::open(&config.database)
        .await
        .with_context(|| format!("opening database {}", config.database.display()))?;
    let state = AppState::new(QueryService::new(Arc::new(store)));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    info!(addr = %config.server.bind, db = %config.database.display(), "dashboard listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
