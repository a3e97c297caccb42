pub mod api;
pub mod cabinets;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod dialogs;
pub mod editor;
pub mod error;
pub mod local_storage;
pub mod notes;
pub mod ordering;
pub mod render;
pub mod sanitize;

use std::ffi::OsString;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use crate::api::{
  HttpApi,
  NotesApi
};
pub use crate::cabinets::CabinetStore;
pub use crate::error::{
  ApiError,
  StoreError
};
pub use crate::notes::{
  NoteListStore,
  ReorderOutcome
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting notecab CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.notecabrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;
  let storage =
    local_storage::LocalStorage::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open local storage \
         at {}",
        data_dir.display()
      )
    })?;

  let renderer =
    render::Renderer::new(&cfg)?;
  let autosave_delay =
    cfg.autosave_delay()?;
  let api_url = cfg.api_url();

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;

  runtime.block_on(async move {
    let api: Arc<dyn NotesApi> = Arc::new(
      HttpApi::new(&api_url)
        .context("failed to build HTTP client")?
    );
    debug!(api_url = %api_url, "connecting");

    let notes = NoteListStore::new(
      Arc::clone(&api)
    );
    let session = commands::Session {
      cabinets: CabinetStore::new(
        api, notes, storage
      ),
      autosave_delay,
      renderer
    };

    let mut out = std::io::stdout();
    commands::dispatch(
      &session,
      &mut out,
      cli.command
    )
    .await
  })?;

  info!("done");
  Ok(())
}
