#[path = "daemon/config.rs"]
mod config;

use config::DaemonConfig;
use devsvc_engine::adapters::rest::{build_router, serve_on_tcp};
use devsvc_engine::domain::ports::ConfigStore;
use devsvc_engine::infrastructure::{production_adapters, FileConfigStore};
use devsvc_engine::ServiceManager;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DaemonConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    info!(
        config_file = %config.config_file.display(),
        log_dir = %config.log_dir.display(),
        port_wait_ms = config.port_wait_ms,
        "Starting dev service daemon"
    );

    let config_store = Arc::new(FileConfigStore::new(&config.config_file));
    match config_store.load().await {
        Ok(catalog) => info!(services = catalog.services.len(), "Catalog loaded"),
        Err(e) => warn!(error = %e, "Catalog is not loadable yet, requests will fail until it is"),
    }

    let manager = Arc::new(ServiceManager::new(
        production_adapters(config_store, &config.log_dir),
        config.manager_settings(),
    ));

    let addr = config.listen_addr()?;
    serve_on_tcp(addr, build_router(manager), shutdown_signal()).await?;

    // Managed services are left running; the next daemon frees their ports on start
    info!("Daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
