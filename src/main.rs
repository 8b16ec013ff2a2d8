#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use researchd::{AppCore, api, config::ServerConfig};
use std::sync::Arc;
use std::time::Duration;

const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(900);

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,researchd=debug".into()),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting researchd server");

    let config = ServerConfig::load().expect("Failed to load configuration");
    if config.auth.api_keys.is_empty() {
        tracing::warn!("no API keys configured, only bearer tokens will be accepted");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let core = Arc::new(AppCore::new(config).expect("Failed to initialize app core"));

    // Periodic sweep so expired cache entries do not pile up on disk between
    // reads; read-time lazy expiry remains the correctness mechanism.
    let sweep_core = core.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = sweep_core.cache.clear_expired();
            if removed > 0 {
                tracing::info!(removed, "purged expired cache entries");
            }
        }
    });

    let app = api::router(core);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {addr}"));

    tracing::info!("researchd running on http://{addr}");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
