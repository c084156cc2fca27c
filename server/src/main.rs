use std::sync::Arc;
use std::time::Duration;

use alchemy_core::{resolver::AlchemyTransferResolver, transfers::AlchemyTransfersServiceBuilder};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use watchtower_engine::{
    config,
    http::server::{EngineServer, EngineServerState},
    session::WatchManager,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::get_config();

    let subscriber = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to debug level if RUST_LOG environment variable is not set
            "watchtower_engine=debug,tower_http=debug,axum=debug,watchtower_reconciler=debug,alchemy_core=debug"
                .into()
        }),
    );

    match config.server.log_format {
        config::LogFormat::Json => subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        config::LogFormat::Pretty => subscriber.with(tracing_subscriber::fmt::layer()).init(),
    }

    let transfers = Arc::new(
        AlchemyTransfersServiceBuilder::new(config.alchemy.api_key.clone())
            .with_base_domain(config.alchemy.base_domain.clone())
            .with_cache_ttl(Duration::from_secs(config.alchemy.cache_ttl_seconds))
            .with_cache_capacity(config.alchemy.cache_capacity)
            .build()?,
    );
    tracing::info!("Transfers service initialized");

    let watch_manager = Arc::new(WatchManager::new(
        Arc::new(AlchemyTransferResolver::new(transfers.clone())),
        config.watcher.default_network,
        Duration::from_millis(config.watcher.resolve_timeout_ms),
    ));

    let mut server = EngineServer::new(EngineServerState {
        watch_manager,
        transfers,
    })
    .await;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    server.start(listener)?;

    tracing::info!("Server started, waiting for shutdown signal");
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
    }
    tracing::info!("Shutdown signal received");

    if let Err(e) = server.shutdown().await {
        tracing::error!("Error during shutdown: {}", e);
    } else {
        tracing::info!("Server shut down successfully");
    }

    Ok(())
}
