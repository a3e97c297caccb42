//! Per-note editors. Each keeps a local copy of one note, applies edits to it
//! synchronously and persists them through the note list store after a quiet
//! period.

mod calendar;
mod standard;
mod task;

use std::sync::Arc;
use std::time::Duration;

use notecab_shared::{Note, NoteKind, NotePatch};
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

pub use self::calendar::CalendarEditor;
pub use self::standard::{FocusCallback, StandardEditor};
pub use self::task::TaskEditor;
use crate::debounce::Debouncer;
use crate::error::StoreError;
use crate::notes::NoteListStore;

/// State shared by every editor kind: the local copy, the accumulated
/// unsaved fields, and the autosave timer.
struct EditorCore {
    note: Note,
    notes: NoteListStore,
    unsaved: Arc<Mutex<NotePatch>>,
    debouncer: Debouncer,
}

impl EditorCore {
    fn open(
        notes: &NoteListStore,
        id: Uuid,
        kind: NoteKind,
        delay: Duration,
    ) -> Result<Self, StoreError> {
        let note = notes.note(id).ok_or(StoreError::UnknownNote(id))?;
        if note.kind != kind {
            return Err(StoreError::WrongKind {
                id,
                expected: kind,
                actual: note.kind,
            });
        }
        Ok(Self {
            note,
            notes: notes.clone(),
            unsaved: Arc::new(Mutex::new(NotePatch::default())),
            debouncer: Debouncer::new(delay),
        })
    }

    fn id(&self) -> Uuid {
        self.note.id
    }

    fn has_unsaved(&self) -> bool {
        !self.unsaved.lock().is_empty()
    }

    fn apply(&mut self, patch: NotePatch) {
        patch.apply_to(&mut self.note);
        self.notes.apply_local(self.note.id, &patch);
        merge(&mut self.unsaved.lock(), patch);
    }

    /// Local edit now, server write after the quiet period.
    fn edit(&mut self, patch: NotePatch) {
        self.apply(patch);

        let unsaved = Arc::clone(&self.unsaved);
        let notes = self.notes.clone();
        let id = self.note.id;
        self.debouncer.schedule(async move {
            let patch = std::mem::take(&mut *unsaved.lock());
            if patch.is_empty() {
                return;
            }
            if let Err(err) = notes.update_note(id, &patch).await {
                warn!(id = %id, error = %err, "autosave failed; kept for the next save");
                restore(&unsaved, patch);
            }
        });
    }

    /// Local edit and an immediate write of everything unsaved.
    async fn save_now(&mut self, patch: NotePatch) -> Result<(), StoreError> {
        self.apply(patch);
        self.debouncer.cancel();
        self.send_unsaved().await
    }

    /// Sends everything still unsaved, after any autosave already running
    /// has finished. Fields from a failed autosave are retried here.
    async fn flush(&mut self) -> Result<(), StoreError> {
        self.debouncer.cancel();
        self.debouncer.flush().await;
        self.send_unsaved().await
    }

    async fn send_unsaved(&mut self) -> Result<(), StoreError> {
        let patch = std::mem::take(&mut *self.unsaved.lock());
        if patch.is_empty() {
            return Ok(());
        }
        debug!(id = %self.note.id, "saving immediately");
        if let Err(err) = self.notes.update_note(self.note.id, &patch).await {
            restore(&self.unsaved, patch);
            return Err(err);
        }
        Ok(())
    }
}

/// Puts a patch that failed to save back under any newer edits.
fn restore(unsaved: &Mutex<NotePatch>, failed: NotePatch) {
    let mut pending = unsaved.lock();
    let newer = std::mem::take(&mut *pending);
    *pending = failed;
    merge(&mut pending, newer);
}

/// Later fields win.
fn merge(into: &mut NotePatch, from: NotePatch) {
    if from.title.is_some() {
        into.title = from.title;
    }
    if from.content.is_some() {
        into.content = from.content;
    }
    if from.order.is_some() {
        into.order = from.order;
    }
    if from.tasks.is_some() {
        into.tasks = from.tasks;
    }
    if from.views.is_some() {
        into.views = from.views;
    }
    if from.calendar_data.is_some() {
        into.calendar_data = from.calendar_data;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_earlier_fields_not_overwritten() {
        let mut into = NotePatch {
            title: Some("a".to_string()),
            content: Some("old".to_string()),
            ..NotePatch::default()
        };
        merge(
            &mut into,
            NotePatch {
                content: Some("new".to_string()),
                ..NotePatch::default()
            },
        );
        assert_eq!(into.title.as_deref(), Some("a"));
        assert_eq!(into.content.as_deref(), Some("new"));
    }

    #[test]
    fn restore_keeps_newer_edits_on_top() {
        let unsaved = Mutex::new(NotePatch {
            content: Some("newer".to_string()),
            ..NotePatch::default()
        });
        restore(
            &unsaved,
            NotePatch {
                title: Some("t".to_string()),
                content: Some("older".to_string()),
                ..NotePatch::default()
            },
        );
        let pending = unsaved.lock();
        assert_eq!(pending.title.as_deref(), Some("t"));
        assert_eq!(pending.content.as_deref(), Some("newer"));
    }
}
