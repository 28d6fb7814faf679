//! Health and metrics endpoints.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::Registry;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::metrics;

pub fn router(registry: Registry) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .with_state(registry)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn metrics_handler(State(registry): State<Registry>) -> Response {
    match metrics::export(&registry) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Expands a host-less `:PORT` address to every IPv4 interface.
pub fn bind_address(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => addr.to_string(),
    }
}

/// Binds `addr` and serves until `stop` is cancelled, then releases the socket.
///
/// `addr` may omit the host (`:8080`) to listen on all interfaces.
pub async fn serve(addr: &str, registry: Registry, stop: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(bind_address(addr))
        .await
        .map_err(|source| Error::Listen {
            addr: addr.to_string(),
            source,
        })?;
    serve_on(listener, registry, stop).await
}

/// Serves on an already bound listener until `stop` is cancelled.
pub async fn serve_on(
    listener: TcpListener,
    registry: Registry,
    stop: CancellationToken,
) -> Result<()> {
    match listener.local_addr() {
        Ok(local) => log::info!("Serving health and metrics on {}", local),
        Err(e) => log::debug!("Listener address unavailable: {}", e),
    }

    axum::serve(listener, router(registry))
        .with_graceful_shutdown(async move { stop.cancelled().await })
        .await
        .map_err(Error::Server)?;

    log::info!("Health and metrics server stopped");
    Ok(())
}
