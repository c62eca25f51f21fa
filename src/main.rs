use std::sync::Arc;

use anyhow::Context;
use postbox::config::Config;
use postbox::http;
use postbox::http::router::AppState;
use postbox::relay;
use postbox::server::Listener;
use postbox::storage::MongoStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Arc::new(Config::load().context("Failed to load configuration")?);

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.log_level())
        .init();

    tracing::info!(role = ?cfg.role, "Starting postbox");

    tokio::select! {
        res = run_http(cfg.clone()), if cfg.role.runs_http() => {
            res?;
        }

        res = run_storage(cfg.clone()), if cfg.role.runs_storage() => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

async fn run_http(cfg: Arc<Config>) -> anyhow::Result<()> {
    let listener = Listener::bind(&cfg.http.listen_addr, cfg.http.max_connections).await?;
    let app = Arc::new(AppState::new(cfg));
    http::serve(listener, app).await
}

async fn run_storage(cfg: Arc<Config>) -> anyhow::Result<()> {
    let listener = Listener::bind(&cfg.relay.listen_addr, cfg.relay.max_connections).await?;
    let store = Arc::new(MongoStore::from_config(&cfg.storage));
    relay::server::serve(listener, store, cfg.relay.max_message_bytes).await
}
