//! agrd-proxy - Catalog search proxy
//!
//! Holds the catalog credentials server-side and exposes `POST /search` to the
//! client. Default port: 5780.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use agrd_proxy::config::{ConfigOverrides, ProxyConfig};
use agrd_proxy::services::{CredentialBroker, IgdbCatalogClient, SearchProxy, TwitchIdentityProvider};
use agrd_proxy::{build_router, AppState};

/// Command-line arguments for agrd-proxy
#[derive(Parser, Debug)]
#[command(name = "agrd-proxy")]
#[command(about = "Catalog search proxy for Achievagrad")]
#[command(version)]
struct Args {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(short, long, env = "AGRD_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "AGRD_PROXY_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "AGRD_PROXY_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = agrd_common::config::load_toml_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    agrd_common::logging::init(&toml_config.logging).context("Failed to initialize logging")?;

    info!(
        "Starting Achievagrad search proxy (agrd-proxy) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = ProxyConfig::resolve(
        &toml_config,
        ConfigOverrides {
            host: args.host,
            port: args.port,
        },
    )
    .context("Invalid proxy configuration")?;

    info!("Token endpoint: {}", config.token_url);
    info!("Catalog endpoint: {}", config.catalog_url);

    let identity = TwitchIdentityProvider::new(
        config.token_url.clone(),
        config.client_id.clone(),
        config.client_secret.clone(),
    )
    .context("Failed to create identity provider client")?;
    let catalog = IgdbCatalogClient::new(&config.catalog_url, config.client_id.clone())
        .context("Failed to create catalog client")?;

    let broker = CredentialBroker::new(Arc::new(identity));
    let proxy = SearchProxy::new(broker, Arc::new(catalog));
    let app = build_router(AppState::new(proxy));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
