//! Listener lifecycle: bind, serve until a shutdown signal, close the store

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use nq_core::{ServerConfig, SharedQueryStore};

use crate::ServerError;
use crate::rest::{RouterOptions, create_router_with_options};
use crate::state::AppState;

/// Serve the API until Ctrl-C or SIGTERM, then close the store
pub async fn run(config: &ServerConfig, store: SharedQueryStore) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Server running on {}", listener.local_addr()?);
    serve(listener, config, store, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    config: &ServerConfig,
    store: SharedQueryStore,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(AppState::new(store.clone()));
    let router = create_router_with_options(state, &RouterOptions::from(config));

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Shutting down, closing store");
    store.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
