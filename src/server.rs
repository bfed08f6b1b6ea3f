use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;

use crate::apis::huggingface::HfClient;
use crate::config::Config;
use crate::routes;
use crate::storage::{self, SWEEP_MAX_AGE, StorageMode};
use crate::upload::MAX_UPLOAD_SIZE;

const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

// headroom for the multipart framing and the text fields next to the image
const BODY_LIMIT: usize = MAX_UPLOAD_SIZE + 64 * 1024;

pub struct AppState {
    pub hf: HfClient,
    pub storage_mode: StorageMode,
    pub upload_dir: PathBuf,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/edit/process", post(routes::edit::process))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

pub async fn run(config: Config) -> io::Result<()> {
    if config.huggingface_api_key.is_none() {
        log::warn!("HUGGINGFACE_API_KEY is not set, every edit request will fail");
    }

    let http_client = reqwest::Client::new();
    let hf = HfClient::new(http_client, config.huggingface_api_key);

    if config.storage_mode == StorageMode::Disk {
        tokio::fs::create_dir_all(&config.upload_dir).await?;
        tokio::spawn(sweep_loop(config.upload_dir.clone()));
    }

    let state = Arc::new(AppState {
        hf,
        storage_mode: config.storage_mode,
        upload_dir: config.upload_dir,
    });

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    log::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await
}

async fn sweep_loop(dir: PathBuf) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        interval.tick().await;
        match storage::sweep_old_files(&dir, SWEEP_MAX_AGE).await {
            Ok(0) => (),
            Ok(removed) => log::info!("swept {removed} stale uploads"),
            Err(err) => log::error!("failed to sweep {}: {err}", dir.display()),
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for the shutdown signal: {err}");
    }

    log::info!("shutting down");
}
