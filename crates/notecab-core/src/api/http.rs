use std::time::Duration;

use async_trait::async_trait;
use notecab_shared::{
  Cabinet,
  CabinetCreate,
  ErrorBody,
  Note,
  NoteCreate,
  NotePatch,
  OrderUpdate
};
use reqwest::{
  Method,
  RequestBuilder,
  Response
};
use serde::de::DeserializeOwned;
use tracing::{
  debug,
  instrument,
  warn
};
use uuid::Uuid;

use super::NotesApi;
use crate::error::ApiError;

const REQUEST_TIMEOUT: Duration =
  Duration::from_secs(30);

/// `NotesApi` over HTTP against a
/// notecabd instance.
#[derive(Debug, Clone)]
pub struct HttpApi {
  client:   reqwest::Client,
  base_url: String
}

impl HttpApi {
  pub fn new(
    base_url: &str
  ) -> Result<Self, ApiError> {
    let client =
      reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    Ok(Self {
      client,
      base_url: base_url
        .trim_end_matches('/')
        .to_string()
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn request(
    &self,
    method: Method,
    path: &str
  ) -> RequestBuilder {
    self.client.request(
      method,
      format!(
        "{}{}",
        self.base_url, path
      )
    )
  }
}

/// Turns a non-success response into
/// `ApiError::Status`, preferring the
/// server's `{error}` message.
async fn check(
  response: Response
) -> Result<Response, ApiError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let body =
    response.text().await.unwrap_or_default();
  let message =
    match serde_json::from_str::<ErrorBody>(
      &body
    ) {
      | Ok(parsed) => parsed.error,
      | Err(_) => format!(
        "HTTP error! status: {}",
        status.as_u16()
      )
    };
  warn!(
    status = status.as_u16(),
    message = %message,
    "request rejected by server"
  );
  Err(ApiError::Status {
    status: status.as_u16(),
    message
  })
}

async fn json<T: DeserializeOwned>(
  request: RequestBuilder
) -> Result<T, ApiError> {
  let response =
    check(request.send().await?).await?;
  Ok(response.json::<T>().await?)
}

async fn empty(
  request: RequestBuilder
) -> Result<(), ApiError> {
  check(request.send().await?).await?;
  Ok(())
}

#[async_trait]
impl NotesApi for HttpApi {
  #[instrument(skip(self))]
  async fn list_cabinets(
    &self
  ) -> Result<Vec<Cabinet>, ApiError> {
    json(
      self.request(
        Method::GET,
        "/api/cabinets"
      )
    )
    .await
  }

  #[instrument(skip(self))]
  async fn create_cabinet(
    &self,
    name: &str
  ) -> Result<Cabinet, ApiError> {
    json(
      self
        .request(
          Method::POST,
          "/api/cabinets"
        )
        .json(&CabinetCreate {
          name: name.to_string()
        })
    )
    .await
  }

  #[instrument(skip(self))]
  async fn delete_cabinet(
    &self,
    id: Uuid
  ) -> Result<(), ApiError> {
    empty(self.request(
      Method::DELETE,
      &format!("/api/cabinets/{id}")
    ))
    .await
  }

  #[instrument(skip(self))]
  async fn list_notes(
    &self,
    cabinet_id: Uuid
  ) -> Result<Vec<Note>, ApiError> {
    let notes: Vec<Note> = json(
      self.request(
        Method::GET,
        &format!(
          "/api/notes?cabinet_id={cabinet_id}"
        )
      )
    )
    .await?;
    debug!(
      count = notes.len(),
      "fetched notes"
    );
    Ok(notes)
  }

  #[instrument(skip(self, create), fields(kind = create.kind.as_str(), order = create.order))]
  async fn create_note(
    &self,
    create: &NoteCreate
  ) -> Result<Note, ApiError> {
    json(
      self
        .request(
          Method::POST,
          "/api/notes"
        )
        .json(create)
    )
    .await
  }

  #[instrument(skip(self, patch))]
  async fn update_note(
    &self,
    id: Uuid,
    patch: &NotePatch
  ) -> Result<Note, ApiError> {
    json(
      self
        .request(
          Method::PUT,
          &format!("/api/notes/{id}")
        )
        .json(patch)
    )
    .await
  }

  #[instrument(skip(self))]
  async fn delete_note(
    &self,
    id: Uuid
  ) -> Result<(), ApiError> {
    empty(self.request(
      Method::DELETE,
      &format!("/api/notes/{id}")
    ))
    .await
  }

  #[instrument(skip(self, updates), fields(count = updates.len()))]
  async fn batch_update_order(
    &self,
    updates: &[OrderUpdate]
  ) -> Result<Vec<Note>, ApiError> {
    json(
      self
        .request(
          Method::POST,
          "/api/notes/batch-update-order"
        )
        .json(updates)
    )
    .await
  }
}
