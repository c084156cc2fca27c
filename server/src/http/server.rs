use std::sync::Arc;

use alchemy_core::transfers::AlchemyTransfersService;
use axum::{
    Router,
    response::Json,
    routing::{get, post},
};
use tokio::{sync::watch, task::JoinHandle};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::session::WatchManager;

use super::routes::{
    events::{ingest_mined, ingest_pending},
    get_transaction::get_transaction,
    notifications::notification_stream,
    transactions::list_transactions,
    watch::{current_watch, start_watch, stop_watch},
};

#[derive(Clone)]
pub struct EngineServerState {
    pub watch_manager: Arc<WatchManager>,
    pub transfers: Arc<AlchemyTransfersService>,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Watchtower Engine",
        description = "Per-nonce reconciliation of pending/mined wallet activity"
    ),
    paths(
        super::routes::watch::start_watch,
        super::routes::watch::current_watch,
        super::routes::watch::stop_watch,
        super::routes::events::ingest_pending,
        super::routes::events::ingest_mined,
        super::routes::transactions::list_transactions,
        super::routes::notifications::notification_stream,
        super::routes::get_transaction::get_transaction,
    ),
    components(schemas(
        watchtower_core::record::TransactionRecord,
        watchtower_core::record::TransactionStatus,
        watchtower_core::resolver::TransferCategory,
        watchtower_core::error::WatcherError,
        watchtower_core::error::ResolutionErrorKind,
        watchtower_reconciler::TransactionNotification,
        alchemy_core::transfers::AssetTransfersResult,
        alchemy_core::transfers::AssetTransfer,
        alchemy_core::transfers::TransferMetadata,
    ))
)]
struct ApiDoc;

async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full route tree over the given state. Split out of
/// [`EngineServer`] so tests can drive the router directly.
pub fn build_router(state: EngineServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route(
            "/watch",
            post(start_watch).get(current_watch).delete(stop_watch),
        )
        .route("/events/pending", post(ingest_pending))
        .route("/events/mined", post(ingest_mined))
        .route("/transactions", get(list_transactions))
        .route("/notifications", get(notification_stream))
        .route("/getTransaction", post(get_transaction))
        .route("/api-docs/openapi.json", get(openapi_document))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct EngineServer {
    handle: Option<JoinHandle<Result<(), std::io::Error>>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    app: Router,
}

impl EngineServer {
    pub async fn new(state: EngineServerState) -> Self {
        Self {
            handle: None,
            shutdown_tx: None,
            app: build_router(state),
        }
    }

    pub fn start(&mut self, listener: tokio::net::TcpListener) -> Result<(), std::io::Error> {
        // Create a shutdown channel
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let app = self.app.clone();

        // Start the HTTP server in a background task
        let handle = tokio::spawn(async move {
            match listener.local_addr() {
                Ok(addr) => tracing::info!("HTTP server starting on {}", addr),
                Err(e) => tracing::warn!("HTTP server starting on unknown address: {}", e),
            }

            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let mut rx = shutdown_rx;
                    while !*rx.borrow() {
                        if rx.changed().await.is_err() {
                            break;
                        }
                    }
                    tracing::info!("HTTP server shutting down");
                })
                .await
        });

        self.handle = Some(handle);
        self.shutdown_tx = Some(shutdown_tx);

        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), std::io::Error> {
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(true).is_err() {
                tracing::error!("Failed to send shutdown signal to HTTP server");
            }
        }

        if let Some(handle) = self.handle.take() {
            match handle.await {
                Ok(result) => {
                    if let Err(e) = result {
                        tracing::error!("HTTP server error during shutdown: {}", e);
                        return Err(e);
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to join HTTP server task: {}", e);
                    return Err(std::io::Error::other(format!("Task join error: {}", e)));
                }
            }
        }

        Ok(())
    }
}
