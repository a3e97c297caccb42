use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use notecab_shared::{CalendarView, CalendarViewMode, Note, NoteCreate, NoteKind, NotePatch};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::NotesApi;
use crate::error::StoreError;
use crate::ordering;

#[derive(Debug, Default)]
struct NoteListState {
    cabinet_id: Option<Uuid>,
    notes: Vec<Note>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// Source and destination were equal; nothing was sent.
    Unchanged,
    /// `reconciled` is set when the server's orders differed from the
    /// optimistic ones and were taken over.
    Applied { reconciled: bool },
}

/// Ordered notes of the current cabinet. Clones share the same list.
#[derive(Clone)]
pub struct NoteListStore {
    api: Arc<dyn NotesApi>,
    state: Arc<Mutex<NoteListState>>,
}

impl NoteListStore {
    pub fn new(api: Arc<dyn NotesApi>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(NoteListState::default())),
        }
    }

    pub fn notes(&self) -> Vec<Note> {
        self.state.lock().notes.clone()
    }

    pub fn note(&self, id: Uuid) -> Option<Note> {
        self.state.lock().notes.iter().find(|n| n.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cabinet_id(&self) -> Option<Uuid> {
        self.state.lock().cabinet_id
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.cabinet_id = None;
        state.notes.clear();
    }

    /// Points the list at a cabinet known to be empty, without a fetch.
    pub fn reset(&self, cabinet_id: Uuid) {
        let mut state = self.state.lock();
        state.cabinet_id = Some(cabinet_id);
        state.notes.clear();
    }

    /// Applies `patch` to the local copy only.
    pub fn apply_local(&self, id: Uuid, patch: &NotePatch) {
        if let Some(note) = self.state.lock().notes.iter_mut().find(|n| n.id == id) {
            patch.apply_to(note);
        }
    }

    #[tracing::instrument(skip(self), fields(cabinet_id = %cabinet_id))]
    pub async fn load_notes(&self, cabinet_id: Uuid) -> Result<Vec<Note>, StoreError> {
        self.state.lock().cabinet_id = Some(cabinet_id);

        match self.api.list_notes(cabinet_id).await {
            Ok(mut notes) => {
                notes.sort_by_key(|n| n.order);
                let mut state = self.state.lock();
                if state.cabinet_id == Some(cabinet_id) {
                    state.notes = notes.clone();
                } else {
                    debug!("cabinet changed while loading; dropping result");
                }
                info!(count = notes.len(), "loaded notes");
                Ok(notes)
            }
            Err(err) => {
                warn!(error = %err, "failed to load notes; clearing list");
                let mut state = self.state.lock();
                if state.cabinet_id == Some(cabinet_id) {
                    state.notes.clear();
                }
                Err(err.into())
            }
        }
    }

    /// Appends a new note at the end of `cabinet_id`'s list.
    #[tracing::instrument(skip(self, title), fields(cabinet_id = %cabinet_id, kind = kind.as_str()))]
    pub async fn create_note(
        &self,
        cabinet_id: Uuid,
        kind: NoteKind,
        title: &str,
    ) -> Result<Note, StoreError> {
        let order = ordering::next_order(&self.state.lock().notes);
        let payload = new_note_payload(cabinet_id, kind, title, order, Local::now().date_naive());

        let note = self.api.create_note(&payload).await?;
        let mut state = self.state.lock();
        if state.cabinet_id == Some(cabinet_id) {
            state.notes.push(note.clone());
        }
        info!(id = %note.id, order = note.order, "created note");
        Ok(note)
    }

    /// Applies `patch` locally, sends it, then merges back only the patched
    /// fields from the server's copy.
    #[tracing::instrument(skip(self, patch), fields(id = %id))]
    pub async fn update_note(&self, id: Uuid, patch: &NotePatch) -> Result<Note, StoreError> {
        self.apply_local(id, patch);

        let saved = match self.api.update_note(id, patch).await {
            Ok(saved) => saved,
            Err(err) => {
                warn!(error = %err, "failed to save note");
                return Err(err.into());
            }
        };

        self.apply_local(id, &patch.select_from(&saved));
        debug!("note saved");
        Ok(saved)
    }

    /// Removes the note locally at once. When the server refuses, the list
    /// is reloaded so it matches the server again.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn delete_note(&self, id: Uuid) -> Result<(), StoreError> {
        let cabinet_id = {
            let mut state = self.state.lock();
            state.notes.retain(|n| n.id != id);
            state.cabinet_id
        };

        if let Err(err) = self.api.delete_note(id).await {
            warn!(error = %err, "delete failed; reloading notes");
            if let Some(cabinet_id) = cabinet_id
                && let Err(reload) = self.load_notes(cabinet_id).await
            {
                warn!(error = %reload, "reload after failed delete also failed");
            }
            return Err(err.into());
        }

        info!("deleted note");
        Ok(())
    }

    /// Moves the note at `from` to `to`, renumbers the whole list and
    /// persists every order in one batch. The previous list is restored
    /// verbatim if the batch fails.
    #[tracing::instrument(skip(self))]
    pub async fn reorder(&self, from: usize, to: usize) -> Result<ReorderOutcome, StoreError> {
        if from == to {
            return Ok(ReorderOutcome::Unchanged);
        }

        let (cabinet_id, snapshot, updates) = {
            let mut state = self.state.lock();
            let len = state.notes.len();
            for index in [from, to] {
                if index >= len {
                    return Err(StoreError::IndexOutOfRange { index, len });
                }
            }

            let snapshot = state.notes.clone();
            ordering::move_index(&mut state.notes, from, to);
            ordering::renumber(&mut state.notes);
            (state.cabinet_id, snapshot, ordering::order_updates(&state.notes))
        };
        debug!(count = updates.len(), "applied reorder locally");

        match self.api.batch_update_order(&updates).await {
            Ok(confirmed) => {
                let mut state = self.state.lock();
                if state.cabinet_id != cabinet_id {
                    debug!("cabinet changed while reordering; leaving list alone");
                    return Ok(ReorderOutcome::Applied { reconciled: false });
                }
                let reconciled = ordering::reconcile(&mut state.notes, &confirmed);
                if reconciled {
                    info!("server orders differed; took server values");
                }
                Ok(ReorderOutcome::Applied { reconciled })
            }
            Err(err) => {
                let mut state = self.state.lock();
                if state.cabinet_id == cabinet_id {
                    warn!(error = %err, "reorder failed; restoring previous order");
                    state.notes = snapshot;
                } else {
                    warn!(error = %err, "reorder failed after cabinet changed; nothing to restore");
                }
                Err(err.into())
            }
        }
    }
}

/// Body for a new note of `kind`, with the per-kind defaults filled in.
pub fn new_note_payload(
    cabinet_id: Uuid,
    kind: NoteKind,
    title: &str,
    order: i64,
    today: NaiveDate,
) -> NoteCreate {
    let mut create = NoteCreate {
        title: title.to_string(),
        content: String::new(),
        kind,
        timestamp: Utc::now(),
        order,
        cabinet_id,
        tasks: None,
        views: None,
        calendar_data: None,
    };
    match kind {
        NoteKind::Standard => {}
        NoteKind::Task => create.tasks = Some(Vec::new()),
        NoteKind::Calendar => {
            create.views = Some(vec![CalendarView {
                id: "view-1".to_string(),
                view_type: CalendarViewMode::Month,
                selected_date: today,
            }]);
            create.calendar_data = Some(BTreeMap::new());
        }
    }
    create
}
