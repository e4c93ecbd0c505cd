/// Axum HTTP server setup and routing

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::chain::ChainQuery;
use crate::config::ProxyConfig;
use crate::handlers::*;

/// GET only; HEAD is routed explicitly since axum would otherwise answer it
/// with the GET handler and hit the node.
pub fn create_router(chain: Arc<ChainQuery>) -> Router {
    Router::new()
        // Block endpoints
        .route(
            "/blocks/tip/height",
            get(get_tip_height)
                .head(method_not_found)
                .fallback(method_not_found),
        )
        // Address endpoints
        .route(
            "/address/:address/utxo",
            get(get_address_utxos)
                .head(method_not_found)
                .fallback(method_not_found),
        )
        .route(
            "/address/:address",
            get(get_address_stats)
                .head(method_not_found)
                .fallback(method_not_found),
        )
        .fallback(fallback)
        // Shared state
        .with_state(chain)
        // Middleware
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: &ProxyConfig) -> anyhow::Result<()> {
    let chain = Arc::new(ChainQuery::from_config(config)?);
    let node_url = chain.rpc().url().to_string();
    let app = create_router(chain);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("🚀 Esplora proxy listening on http://{}", addr);
    log::info!("📡 Forwarding to Bitcoin Core RPC at {}", node_url);
    if config.serialize_scans {
        log::info!("🔒 scantxoutset calls are queued one at a time");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            log::info!("Received SIGTERM signal");
        },
    }

    log::info!("Shutdown signal received, draining in-flight requests...");
}
