//! In-memory `NotesApi` with call recording and failure injection.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use notecab_shared::{
    Cabinet, Note, NoteCreate, NotePatch, OrderUpdate, validate_cabinet_name,
};
use parking_lot::Mutex;
use tokio::sync::Notify;
use uuid::Uuid;

use super::NotesApi;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    ListCabinets,
    CreateCabinet,
    DeleteCabinet,
    ListNotes,
    CreateNote,
    UpdateNote,
    DeleteNote,
    BatchUpdateOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListCabinets,
    CreateCabinet(String),
    DeleteCabinet(Uuid),
    ListNotes(Uuid),
    CreateNote(NoteCreate),
    UpdateNote(Uuid, NotePatch),
    DeleteNote(Uuid),
    BatchUpdateOrder(Vec<OrderUpdate>),
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::ListCabinets => CallKind::ListCabinets,
            Call::CreateCabinet(_) => CallKind::CreateCabinet,
            Call::DeleteCabinet(_) => CallKind::DeleteCabinet,
            Call::ListNotes(_) => CallKind::ListNotes,
            Call::CreateNote(_) => CallKind::CreateNote,
            Call::UpdateNote(..) => CallKind::UpdateNote,
            Call::DeleteNote(_) => CallKind::DeleteNote,
            Call::BatchUpdateOrder(_) => CallKind::BatchUpdateOrder,
        }
    }
}

#[derive(Default)]
struct Inner {
    cabinets: Vec<Cabinet>,
    notes: Vec<Note>,
    calls: Vec<Call>,
    failing: HashSet<CallKind>,
    order_offset: i64,
    batch_gate: Option<Arc<Notify>>,
}

#[derive(Default)]
pub struct FakeApi {
    inner: Mutex<Inner>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cabinets(names: &[&str]) -> Self {
        let api = Self::new();
        {
            let mut inner = api.inner.lock();
            for name in names {
                inner.cabinets.push(Cabinet {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                });
            }
        }
        api
    }

    pub fn add_cabinet(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.lock().cabinets.push(Cabinet {
            id,
            name: name.to_string(),
        });
        id
    }

    /// Batch order updates wait for a notification on the returned gate
    /// before answering, so tests can act while one is in flight.
    pub fn hold_batches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner.lock().batch_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn cabinets(&self) -> Vec<Cabinet> {
        self.inner.lock().cabinets.clone()
    }

    pub fn cabinet_id(&self, name: &str) -> Uuid {
        self.inner
            .lock()
            .cabinets
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
            .expect("cabinet seeded")
    }

    pub fn insert_note(&self, note: Note) {
        self.inner.lock().notes.push(note);
    }

    /// Edits a stored note behind the client's back.
    pub fn modify_note(&self, id: Uuid, edit: impl FnOnce(&mut Note)) {
        if let Some(note) = self.inner.lock().notes.iter_mut().find(|n| n.id == id) {
            edit(note);
        }
    }

    pub fn stored_notes(&self, cabinet_id: Uuid) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .inner
            .lock()
            .notes
            .iter()
            .filter(|n| n.cabinet_id == cabinet_id)
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.order);
        notes
    }

    pub fn fail(&self, kind: CallKind) {
        self.inner.lock().failing.insert(kind);
    }

    pub fn recover(&self, kind: CallKind) {
        self.inner.lock().failing.remove(&kind);
    }

    /// Makes batch order updates store `order + offset`, standing in for a
    /// server-side renumbering policy.
    pub fn set_order_offset(&self, offset: i64) {
        self.inner.lock().order_offset = offset;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.kind() == kind)
            .count()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        let mut inner = self.inner.lock();
        let kind = call.kind();
        inner.calls.push(call);
        if inner.failing.contains(&kind) {
            return Err(ApiError::Status {
                status: 500,
                message: format!("injected failure for {kind:?}"),
            });
        }
        Ok(())
    }
}

fn not_found(what: &str, id: Uuid) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("{what} {id} not found"),
    }
}

#[async_trait]
impl NotesApi for FakeApi {
    async fn list_cabinets(&self) -> Result<Vec<Cabinet>, ApiError> {
        self.record(Call::ListCabinets)?;
        Ok(self.inner.lock().cabinets.clone())
    }

    async fn create_cabinet(&self, name: &str) -> Result<Cabinet, ApiError> {
        self.record(Call::CreateCabinet(name.to_string()))?;
        let name = validate_cabinet_name(name).map_err(|err| ApiError::Status {
            status: 400,
            message: err.to_string(),
        })?;
        let mut inner = self.inner.lock();
        if inner.cabinets.iter().any(|c| c.name == name) {
            return Err(ApiError::Status {
                status: 409,
                message: format!("A cabinet named \"{name}\" already exists"),
            });
        }
        let cabinet = Cabinet {
            id: Uuid::new_v4(),
            name,
        };
        inner.cabinets.push(cabinet.clone());
        Ok(cabinet)
    }

    async fn delete_cabinet(&self, id: Uuid) -> Result<(), ApiError> {
        self.record(Call::DeleteCabinet(id))?;
        let mut inner = self.inner.lock();
        let before = inner.cabinets.len();
        inner.cabinets.retain(|c| c.id != id);
        if inner.cabinets.len() == before {
            return Err(not_found("Cabinet", id));
        }
        inner.notes.retain(|n| n.cabinet_id != id);
        Ok(())
    }

    async fn list_notes(&self, cabinet_id: Uuid) -> Result<Vec<Note>, ApiError> {
        self.record(Call::ListNotes(cabinet_id))?;
        Ok(self.stored_notes(cabinet_id))
    }

    async fn create_note(&self, create: &NoteCreate) -> Result<Note, ApiError> {
        self.record(Call::CreateNote(create.clone()))?;
        let note = Note {
            id: Uuid::new_v4(),
            cabinet_id: create.cabinet_id,
            kind: create.kind,
            title: create.title.clone(),
            content: create.content.clone(),
            order: create.order,
            timestamp: create.timestamp,
            tasks: create.tasks.clone(),
            views: create.views.clone(),
            calendar_data: create.calendar_data.clone(),
        };
        self.inner.lock().notes.push(note.clone());
        Ok(note)
    }

    async fn update_note(&self, id: Uuid, patch: &NotePatch) -> Result<Note, ApiError> {
        self.record(Call::UpdateNote(id, patch.clone()))?;
        let mut inner = self.inner.lock();
        let note = inner
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| not_found("Note", id))?;
        patch.apply_to(note);
        Ok(note.clone())
    }

    async fn delete_note(&self, id: Uuid) -> Result<(), ApiError> {
        self.record(Call::DeleteNote(id))?;
        let mut inner = self.inner.lock();
        let before = inner.notes.len();
        inner.notes.retain(|n| n.id != id);
        if inner.notes.len() == before {
            return Err(not_found("Note", id));
        }
        Ok(())
    }

    async fn batch_update_order(&self, updates: &[OrderUpdate]) -> Result<Vec<Note>, ApiError> {
        let recorded = self.record(Call::BatchUpdateOrder(updates.to_vec()));
        let gate = self.inner.lock().batch_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        recorded?;
        let mut inner = self.inner.lock();
        let offset = inner.order_offset;
        if let Some(missing) = updates
            .iter()
            .find(|u| !inner.notes.iter().any(|n| n.id == u.id))
        {
            return Err(not_found("Note", missing.id));
        }

        let mut out = Vec::with_capacity(updates.len());
        for update in updates {
            if let Some(note) = inner.notes.iter_mut().find(|n| n.id == update.id) {
                note.order = update.order + offset;
                out.push(note.clone());
            }
        }
        Ok(out)
    }
}
