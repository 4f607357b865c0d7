#![forbid(unsafe_code)]

//! Tiny HTTP trigger: every `POST /` runs one reconciliation.
//!
//! Tube Archivist (or anything else) can call this after new downloads land.
//! Runs happen on a blocking worker and never overlap; a request that arrives
//! mid-run waits for the current one to finish and then starts its own.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use clap::Parser;
use parking_lot::Mutex;
use tokio::signal;
use tracing::{error, info};
use tubefin::{
    app::run_once,
    cli::ConfigArgs,
    config::{Config, resolve_config},
    logging::init_tracing,
};

/// Serve a webhook that triggers a Jellyfin sync.
#[derive(Debug, Parser)]
#[command(name = "webhook")]
struct WebhookArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    run_lock: Arc<Mutex<()>>,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let WebhookArgs { config, host, port } = WebhookArgs::parse();
    let mut overrides = config.into_overrides();
    overrides.webhook_host = host;
    overrides.webhook_port = port;
    let config = resolve_config(overrides)?;

    let addr = (config.webhook_host.clone(), config.webhook_port);
    let state = AppState {
        config: Arc::new(config),
        run_lock: Arc::new(Mutex::new(())),
    };

    let listener = tokio::net::TcpListener::bind((addr.0.as_str(), addr.1))
        .await
        .with_context(|| format!("binding to {}:{}", addr.0, addr.1))?;
    info!("webhook listening on http://{}:{}", addr.0, addr.1);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running webhook server")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new().route("/", post(trigger)).with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("failed to install Ctrl+C handler: {err}");
    }
}

async fn trigger(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    info!("sync triggered");
    let outcome = tokio::task::spawn_blocking(move || {
        let _guard = state.run_lock.lock();
        run_once(&state.config)
    })
    .await;

    match outcome {
        Ok(Ok(_)) => Ok("success"),
        Ok(Err(err)) => {
            error!("sync failed: {err:#}");
            Err(ApiError::internal(format!("{err:#}")))
        }
        Err(err) => Err(ApiError::internal(format!("sync task panicked: {err}"))),
    }
}
