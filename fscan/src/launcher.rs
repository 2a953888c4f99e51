use crate::rest::{serve, RequestState};
use crate::settings::{AppConfig, HttpSettings};
use crate::storage::Storage;
use crate::{error, info, logger, AppError};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tower_http::cors;
use tower_http::cors::CorsLayer;
use utoipa_axum::router::OpenApiRouter;

pub async fn maybe_run_server(
    http_conf: HttpSettings,
    state: RequestState,
    extras: Option<OpenApiRouter<RequestState>>,
    cors: Option<CorsLayer>,
    shutdown: watch::Receiver<bool>,
) {
    if http_conf.enable {
        info!("Starting http server at {}", http_conf.bind_address);
        let cors = cors.unwrap_or_else(|| CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods(cors::Any)
            .allow_headers(cors::Any));
        if let Err(e) = serve(state, http_conf.bind_address, extras, Some(cors), shutdown).await {
            error!("Http server failed: {}", e);
        }
    } else {
        info!("HTTP server is disabled, skipping");
    }
}

/// Runs `task` until it finishes or the process receives SIGINT/SIGTERM, in which case
/// shutdown is broadcast and the task is awaited to drain gracefully.
pub async fn until_signal<F>(task: F, shutdown_tx: watch::Sender<bool>) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut handle = tokio::spawn(task);

    tokio::select! {
        finished = &mut handle => {
            return Ok(finished?);
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down...");
            let _ = shutdown_tx.send(true);
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            let _ = shutdown_tx.send(true);
        }
    }
    Ok(handle.await?)
}

pub async fn launch(extras: Option<OpenApiRouter<RequestState>>, cors: Option<CorsLayer>) -> Result<(), AppError> {
    let config = AppConfig::new("config/settings")?;
    logger::init(config.log.level);
    let (created, storage) = Storage::init(PathBuf::from(&config.storage.db_path), config.storage.db_cache_size_mb)?;
    if created {
        info!("Created new database at {}", config.storage.db_path);
    }
    if config.webhook.secret.is_none() {
        info!("Webhook secret not configured, ingestion endpoints are open");
    }
    let state = RequestState::new(Arc::clone(&storage), config.webhook.secret.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server_f = maybe_run_server(config.http, state, extras, cors, shutdown_rx);
    until_signal(server_f, shutdown_tx).await
}
