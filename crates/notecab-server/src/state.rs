use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use notecab_shared::{
    Cabinet, CabinetCreate, Note, NoteCreate, NotePatch, OrderUpdate, validate_cabinet_name,
};
use parking_lot::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::datastore::DataStore;
use crate::error::ServerError;

pub struct AppState {
    store: Mutex<DataStore>,
}

impl AppState {
    pub fn open(data_dir: &Path, seed_default: bool) -> anyhow::Result<Self> {
        let store = DataStore::open(data_dir)
            .with_context(|| format!("failed to open datastore at {}", data_dir.display()))?;
        if seed_default {
            store.seed_default_cabinet()?;
        }
        Ok(Self {
            store: Mutex::new(store),
        })
    }

    #[instrument(skip(self))]
    pub fn list_cabinets(&self) -> Result<Vec<Cabinet>, ServerError> {
        let store = self.store.lock();
        Ok(store.load_cabinets()?)
    }

    #[instrument(skip(self))]
    pub fn create_cabinet(&self, create: CabinetCreate) -> Result<Cabinet, ServerError> {
        let name = validate_cabinet_name(&create.name)?;
        let store = self.store.lock();
        let mut cabinets = store.load_cabinets()?;

        if cabinets.iter().any(|cabinet| cabinet.name == name) {
            return Err(ServerError::DuplicateCabinet(name));
        }

        let cabinet = Cabinet {
            id: Uuid::new_v4(),
            name,
        };
        cabinets.push(cabinet.clone());
        store.save_cabinets(&cabinets)?;

        info!(id = %cabinet.id, name = %cabinet.name, "cabinet created");
        Ok(cabinet)
    }

    #[instrument(skip(self))]
    pub fn delete_cabinet(&self, id: Uuid) -> Result<(), ServerError> {
        let store = self.store.lock();
        match store.delete_cabinet_cascade(id)? {
            Some(_) => Ok(()),
            None => Err(ServerError::CabinetNotFound(id)),
        }
    }

    #[instrument(skip(self))]
    pub fn list_notes(&self, cabinet_id: Option<Uuid>) -> Result<Vec<Note>, ServerError> {
        let store = self.store.lock();
        let notes = match cabinet_id {
            Some(cabinet_id) => store.notes_in_cabinet(cabinet_id)?,
            None => {
                let mut notes = store.load_notes()?;
                notes.sort_by_key(|note| (note.cabinet_id, note.order));
                notes
            }
        };
        debug!(count = notes.len(), "listed notes");
        Ok(notes)
    }

    #[instrument(skip(self, create), fields(cabinet_id = %create.cabinet_id, kind = create.kind.as_str()))]
    pub fn create_note(&self, create: NoteCreate) -> Result<Note, ServerError> {
        let store = self.store.lock();
        let cabinets = store.load_cabinets()?;
        if !cabinets.iter().any(|c| c.id == create.cabinet_id) {
            return Err(ServerError::BadRequest(format!(
                "Cabinet {} does not exist",
                create.cabinet_id
            )));
        }

        let note = Note {
            id: Uuid::new_v4(),
            cabinet_id: create.cabinet_id,
            kind: create.kind,
            title: create.title,
            content: create.content,
            order: create.order,
            timestamp: create.timestamp,
            tasks: create.tasks,
            views: create.views,
            calendar_data: create.calendar_data,
        };

        let mut notes = store.load_notes()?;
        notes.push(note.clone());
        store.save_notes(&notes)?;

        info!(id = %note.id, order = note.order, "note created");
        Ok(note)
    }

    #[instrument(skip(self, patch), fields(id = %id))]
    pub fn update_note(&self, id: Uuid, patch: NotePatch) -> Result<Note, ServerError> {
        let store = self.store.lock();
        let mut notes = store.load_notes()?;

        let updated = {
            let note = notes
                .iter_mut()
                .find(|note| note.id == id)
                .ok_or(ServerError::NoteNotFound(id))?;
            patch.apply_to(note);
            note.clone()
        };

        store.save_notes(&notes)?;
        debug!(order = updated.order, "note patch applied");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub fn delete_note(&self, id: Uuid) -> Result<(), ServerError> {
        let store = self.store.lock();
        let mut notes = store.load_notes()?;
        let idx = notes
            .iter()
            .position(|note| note.id == id)
            .ok_or(ServerError::NoteNotFound(id))?;
        notes.remove(idx);
        store.save_notes(&notes)?;
        info!(id = %id, "note deleted");
        Ok(())
    }

    /// Applies every order update or none of them.
    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub fn batch_update_order(&self, updates: Vec<OrderUpdate>) -> Result<Vec<Note>, ServerError> {
        let store = self.store.lock();
        let mut notes = store.load_notes()?;

        let positions: HashMap<Uuid, usize> = notes
            .iter()
            .enumerate()
            .map(|(idx, note)| (note.id, idx))
            .collect();

        let mut targets = Vec::with_capacity(updates.len());
        for update in &updates {
            let idx = positions
                .get(&update.id)
                .copied()
                .ok_or(ServerError::NoteNotFound(update.id))?;
            targets.push((idx, update.order));
        }

        for (idx, order) in &targets {
            notes[*idx].order = *order;
        }
        store.save_notes(&notes)?;

        let out: Vec<Note> = targets.iter().map(|(idx, _)| notes[*idx].clone()).collect();
        info!(updated = out.len(), "batch order update applied");
        Ok(out)
    }
}
