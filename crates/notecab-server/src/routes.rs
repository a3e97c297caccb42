use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use notecab_shared::{
  Cabinet,
  CabinetCreate,
  Note,
  NoteCreate,
  NotePatch,
  NotesQuery,
  OrderUpdate
};
use anyhow::anyhow;
use tracing::{
  Span,
  error,
  info,
  instrument
};
use uuid::Uuid;

use crate::error::ServerError;
use crate::state::AppState;

pub type SharedState = Arc<AppState>;

pub fn api_routes() -> Router<SharedState> {
  Router::new()
    .route(
      "/api/cabinets",
      get(cabinets_list).post(cabinet_create)
    )
    .route(
      "/api/cabinets/{id}",
      axum::routing::delete(cabinet_delete)
    )
    .route(
      "/api/notes",
      get(notes_list).post(note_create)
    )
    .route(
      "/api/notes/batch-update-order",
      post(notes_batch_update_order)
    )
    .route(
      "/api/notes/{id}",
      put(note_update).delete(note_delete)
    )
}

fn log_failure<T>(
  operation: &'static str,
  result: &Result<T, ServerError>
) {
  if let Err(err) = result {
    if err.status().is_server_error() {
      error!(operation, error = %err, "request failed");
    } else {
      info!(operation, error = %err, status = %err.status(), "request rejected");
    }
  }
}

/// Runs a datastore operation on the
/// blocking pool; the JSONL files are
/// read and written under the state lock.
async fn run_blocking<T, F>(
  operation: &'static str,
  state: SharedState,
  job: F
) -> Result<T, ServerError>
where
  T: Send + 'static,
  F: FnOnce(&AppState) -> Result<T, ServerError>
    + Send
    + 'static
{
  let span = Span::current();
  let result = tokio::task::spawn_blocking(
    move || span.in_scope(|| job(&state))
  )
  .await
  .unwrap_or_else(|err| {
    Err(ServerError::Internal(anyhow!(
      "{operation} did not complete: {err}"
    )))
  });
  log_failure(operation, &result);
  result
}

#[instrument(skip(state))]
async fn cabinets_list(
  State(state): State<SharedState>
) -> Result<Json<Vec<Cabinet>>, ServerError>
{
  run_blocking("cabinets_list", state, |s| {
    s.list_cabinets()
  })
  .await
  .map(Json)
}

#[instrument(skip(state), fields(name_len = args.name.len()))]
async fn cabinet_create(
  State(state): State<SharedState>,
  Json(args): Json<CabinetCreate>
) -> Result<
  (StatusCode, Json<Cabinet>),
  ServerError
> {
  info!(
    name = %args.name,
    "cabinet_create invoked"
  );
  run_blocking("cabinet_create", state, |s| {
    s.create_cabinet(args)
  })
  .await
  .map(|cabinet| {
    (StatusCode::CREATED, Json(cabinet))
  })
}

#[instrument(skip(state), fields(id = %id))]
async fn cabinet_delete(
  State(state): State<SharedState>,
  Path(id): Path<Uuid>
) -> Result<StatusCode, ServerError> {
  info!(id = %id, "cabinet_delete invoked");
  run_blocking("cabinet_delete", state, move |s| {
    s.delete_cabinet(id)
  })
  .await
  .map(|()| StatusCode::NO_CONTENT)
}

#[instrument(skip(state), fields(cabinet_id = ?query.cabinet_id))]
async fn notes_list(
  State(state): State<SharedState>,
  Query(query): Query<NotesQuery>
) -> Result<Json<Vec<Note>>, ServerError> {
  run_blocking("notes_list", state, move |s| {
    s.list_notes(query.cabinet_id)
  })
  .await
  .map(Json)
}

#[instrument(skip(state, args), fields(cabinet_id = %args.cabinet_id, kind = args.kind.as_str(), order = args.order))]
async fn note_create(
  State(state): State<SharedState>,
  Json(args): Json<NoteCreate>
) -> Result<
  (StatusCode, Json<Note>),
  ServerError
> {
  run_blocking("note_create", state, |s| {
    s.create_note(args)
  })
  .await
  .map(|note| {
    (StatusCode::CREATED, Json(note))
  })
}

#[instrument(skip(state, patch), fields(id = %id))]
async fn note_update(
  State(state): State<SharedState>,
  Path(id): Path<Uuid>,
  Json(patch): Json<NotePatch>
) -> Result<Json<Note>, ServerError> {
  if patch.is_empty() {
    return Err(ServerError::BadRequest(
      "No data provided".to_string()
    ));
  }
  run_blocking("note_update", state, move |s| {
    s.update_note(id, patch)
  })
  .await
  .map(Json)
}

#[instrument(skip(state), fields(id = %id))]
async fn note_delete(
  State(state): State<SharedState>,
  Path(id): Path<Uuid>
) -> Result<StatusCode, ServerError> {
  run_blocking("note_delete", state, move |s| {
    s.delete_note(id)
  })
  .await
  .map(|()| StatusCode::NO_CONTENT)
}

#[instrument(skip(state, updates), fields(count = updates.len()))]
async fn notes_batch_update_order(
  State(state): State<SharedState>,
  Json(updates): Json<Vec<OrderUpdate>>
) -> Result<Json<Vec<Note>>, ServerError> {
  run_blocking(
    "notes_batch_update_order",
    state,
    |s| s.batch_update_order(updates)
  )
  .await
  .map(Json)
}
