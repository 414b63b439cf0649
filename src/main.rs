//! Media upload server binary.
//!
//! Authenticated clients post a file under a category and get back a public
//! URL; anyone can then fetch the file from `/media/<category>/<name>`.
//! The main entry point loads configuration, prepares the storage root and
//! serves the Axum router until a shutdown signal arrives.

mod app;
mod atomic;
mod auth;
mod config;
mod error;
mod http;
mod logging;
mod media;
mod naming;
mod storage;
mod upload;

use axum_server::Handle;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use crate::auth::AuthConfig;
use crate::config::Args;
use crate::http::build_cors_layer;
use crate::storage::Storage;
use crate::upload::UploadConfig;

/// Starts the media server and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    dotenvy::dotenv().ok();
    logging::init_logging();

    let args = Args::parse();
    let storage = Arc::new(Storage::new(PathBuf::from(&args.storage_dir)));
    storage.ensure_root().await?;
    info!(root = %storage.root_path().display(), "storage ready");

    let auth_config = Arc::new(AuthConfig::new(
        args.auth_user.clone(),
        args.auth_pass.clone(),
    ));
    if !auth_config.is_configured() {
        warn!("BASIC_AUTH_USER or BASIC_AUTH_PASS is not set; every upload will be rejected");
    }
    let upload_config = Arc::new(UploadConfig {
        public_base_url: args.public_base_url(),
    });

    let mut app = app::build_router(storage, auth_config, upload_config.clone());
    if let Some(cors_layer) = build_cors_layer(args.cors_origins.as_deref()) {
        app = app.layer(cors_layer);
    }

    let host = args
        .bind
        .parse::<IpAddr>()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);

    info!("🚀 Server running at {} (listening on {})", upload_config.public_base_url, addr);
    app::serve(app, addr, Handle::new(), shutdown_signal()).await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received termination signal, shutting down");
}
