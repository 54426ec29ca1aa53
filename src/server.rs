//! Liveness HTTP endpoint

use axum::{routing::get, Json, Router};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

/// Body returned by `GET /`
pub const STATUS_MESSAGE: &str = "Auto mail service is running";

pub fn router() -> Router {
    Router::new()
        .route("/", get(status))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[instrument(name = "status")]
async fn status() -> Json<&'static str> {
    Json(STATUS_MESSAGE)
}

/// Serve the router on `0.0.0.0:port` until `cancel` fires
pub async fn serve(port: u16, cancel: CancellationToken) -> crate::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router())
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}
