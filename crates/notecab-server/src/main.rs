use std::path::PathBuf;

use clap::{ArgAction, Parser};
use notecab_server::{DEFAULT_BIND, DEFAULT_CORS_ORIGIN, ServerConfig};
use tracing::{error, info, warn};

#[derive(Parser, Debug, Clone)]
#[command(name = "notecabd", version, about = "REST backend for notecab cabinets and notes")]
struct ServerCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    quiet: u8,

    #[arg(long, env = "NOTECAB_BIND", default_value = DEFAULT_BIND)]
    bind: String,

    #[arg(long = "data", env = "NOTECAB_DATA")]
    data: Option<PathBuf>,

    #[arg(long = "cors-origin", env = "NOTECAB_CORS_ORIGIN", default_value = DEFAULT_CORS_ORIGIN)]
    cors_origin: String,

    /// Do not create "Default Cabinet" in an empty store.
    #[arg(long = "no-seed")]
    no_seed: bool,

    #[arg(long = "log-dir", env = "NOTECAB_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = ServerCli::parse();

    let _log_guard = match notecab_server::init_tracing(cli.verbose, cli.quiet, cli.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    };

    let data_dir = match cli.data.clone() {
        Some(dir) => dir,
        None => match notecab_server::default_data_dir() {
            Ok(dir) => dir,
            Err(err) => {
                error!(error = %err, "cannot resolve data directory");
                std::process::exit(1);
            }
        },
    };

    let cfg = ServerConfig {
        bind: cli.bind,
        data_dir,
        cors_origin: cli.cors_origin,
        seed_default_cabinet: !cli.no_seed,
    };
    info!(?cfg, "starting notecabd");

    if let Err(err) = notecab_server::serve(cfg, wait_for_shutdown_signal()).await {
        error!(error = %err, "notecabd failed");
        std::process::exit(1);
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(stream) => stream,
        Err(error) => {
            error!(%error, "failed to register SIGINT handler; falling back to ctrl_c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(error) => {
            error!(%error, "failed to register SIGTERM handler; falling back to ctrl_c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    warn!("received shutdown signal; draining connections");
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed waiting for ctrl_c signal");
    }
    warn!("received shutdown signal; draining connections");
}
