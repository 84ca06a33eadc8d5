//! TCP transport for the REST adapter

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tracing::info;

/// Serve the router on TCP until `shutdown` resolves
///
/// Open connections are dropped on shutdown rather than drained: log streams never end on
/// their own, and a dropped start request only cancels its readiness wait.
pub async fn serve_on_tcp<F>(
    addr: SocketAddr,
    app: Router,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let server = axum::Server::try_bind(&addr)?.serve(app.into_make_service());
    info!("REST API server listening on TCP {}", server.local_addr());

    tokio::select! {
        result = server => result?,
        _ = shutdown => info!("Shutdown requested, closing REST API server"),
    }

    Ok(())
}
