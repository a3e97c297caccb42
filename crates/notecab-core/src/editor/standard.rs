use std::time::Duration;

use notecab_shared::{NoteKind, NotePatch};
use tracing::debug;
use uuid::Uuid;

use super::EditorCore;
use crate::error::StoreError;
use crate::notes::NoteListStore;
use crate::sanitize::{clean_content, sanitize_content};

/// Called with the note id whenever a rich-text editor gains focus, so the
/// owner can route toolbar actions to it.
pub type FocusCallback = Box<dyn Fn(Uuid) + Send + Sync>;

/// Rich-text note editor.
pub struct StandardEditor {
    core: EditorCore,
    saved_title: String,
    on_focus: Option<FocusCallback>,
}

impl StandardEditor {
    pub fn open(
        notes: &NoteListStore,
        id: Uuid,
        delay: Duration,
        on_focus: Option<FocusCallback>,
    ) -> Result<Self, StoreError> {
        let mut core = EditorCore::open(notes, id, NoteKind::Standard, delay)?;
        core.note.content = clean_content(&core.note.content);
        let saved_title = core.note.title.clone();
        Ok(Self {
            core,
            saved_title,
            on_focus,
        })
    }

    pub fn id(&self) -> Uuid {
        self.core.id()
    }

    pub fn title(&self) -> &str {
        &self.core.note.title
    }

    pub fn content(&self) -> &str {
        &self.core.note.content
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.core.has_unsaved() || self.core.note.title != self.saved_title
    }

    /// Typing in the title field. Nothing is sent until `blur_title`.
    pub fn set_title(&mut self, title: &str) {
        self.core.note.title = title.to_string();
    }

    /// Saves the title right away when it changed. An empty title is kept.
    pub async fn blur_title(&mut self) -> Result<(), StoreError> {
        if self.core.note.title == self.saved_title {
            return Ok(());
        }
        let title = self.core.note.title.clone();
        self.core
            .save_now(NotePatch {
                title: Some(title.clone()),
                ..NotePatch::default()
            })
            .await?;
        debug!(id = %self.id(), "title saved");
        self.saved_title = title;
        Ok(())
    }

    /// Content edits are sanitized and autosaved after the quiet period.
    pub fn set_content(&mut self, html: &str) {
        let content = sanitize_content(html);
        self.core.edit(NotePatch {
            content: Some(content),
            ..NotePatch::default()
        });
    }

    pub async fn blur_content(&mut self) -> Result<(), StoreError> {
        self.core.flush().await
    }

    pub fn focus(&self) {
        if let Some(on_focus) = &self.on_focus {
            on_focus(self.id());
        }
    }

    /// Persists a changed title and any pending content, then releases the
    /// editor.
    pub async fn close(mut self) -> Result<(), StoreError> {
        if let Err(err) = self.blur_title().await {
            debug!(id = %self.id(), error = %err, "title save failed; retrying with content");
        }
        self.core.flush().await
    }
}
