mod http;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use notecab_shared::{Cabinet, Note, NoteCreate, NotePatch, OrderUpdate};
use uuid::Uuid;

pub use self::http::HttpApi;
use crate::error::ApiError;

/// The REST surface the client stores are written against.
#[async_trait]
pub trait NotesApi: Send + Sync {
    async fn list_cabinets(&self) -> Result<Vec<Cabinet>, ApiError>;

    async fn create_cabinet(&self, name: &str) -> Result<Cabinet, ApiError>;

    async fn delete_cabinet(&self, id: Uuid) -> Result<(), ApiError>;

    async fn list_notes(&self, cabinet_id: Uuid) -> Result<Vec<Note>, ApiError>;

    async fn create_note(&self, create: &NoteCreate) -> Result<Note, ApiError>;

    /// Partial update; only fields set in `patch` are sent.
    async fn update_note(&self, id: Uuid, patch: &NotePatch) -> Result<Note, ApiError>;

    async fn delete_note(&self, id: Uuid) -> Result<(), ApiError>;

    /// Returns the updated notes in the same order as `updates`.
    async fn batch_update_order(&self, updates: &[OrderUpdate]) -> Result<Vec<Note>, ApiError>;
}
