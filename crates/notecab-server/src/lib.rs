pub mod datastore;
pub mod error;
pub mod routes;
pub mod state;

use std::future::Future;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::state::AppState;

pub const DEFAULT_BIND: &str = "127.0.0.1:5001";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub data_dir: PathBuf,
    pub cors_origin: String,
    pub seed_default_cabinet: bool,
}

impl ServerConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            data_dir: data_dir.into(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            seed_default_cabinet: true,
        }
    }
}

pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(home.join(".notecab").join("server"))
}

/// Builds the full HTTP application: API routes, CORS and request tracing.
pub fn app(state: Arc<AppState>, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = HeaderValue::from_str(cors_origin)
        .with_context(|| format!("invalid CORS origin: {cors_origin}"))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    Ok(routes::api_routes()
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Binds `cfg.bind` and serves until `shutdown` resolves.
#[tracing::instrument(skip(shutdown))]
pub async fn serve<F>(cfg: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(&cfg.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind))?;
    serve_on(listener, cfg, shutdown).await
}

/// Opens the datastore and serves on an already bound listener.
pub async fn serve_on<F>(listener: TcpListener, cfg: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = Arc::new(AppState::open(&cfg.data_dir, cfg.seed_default_cabinet)?);
    let router = app(state, &cfg.cors_origin)?;

    info!(
        addr = %listener.local_addr()?,
        data_dir = %cfg.data_dir.display(),
        cors_origin = %cfg.cors_origin,
        "notecabd listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server terminated abnormally")?;

    info!("notecabd stopped");
    Ok(())
}

/// Installs the global subscriber. The returned guard must stay alive for the
/// file appender to keep flushing.
pub fn init_tracing(
    verbose: u8,
    quiet: u8,
    log_dir: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 2 {
        "trace"
    } else if verbose == 1 {
        "debug"
    } else {
        "info,notecab_server=debug"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "notecabd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let init_result = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(guard)
}
