use std::time::Duration;

use notecab_shared::{
  NoteKind,
  NotePatch,
  TaskItem
};
use uuid::Uuid;

use super::EditorCore;
use crate::error::StoreError;
use crate::notes::NoteListStore;

/// Task-list note editor. Every change
/// rewrites the whole list.
pub struct TaskEditor {
  core: EditorCore
}

impl TaskEditor {
  pub fn open(
    notes: &NoteListStore,
    id: Uuid,
    delay: Duration
  ) -> Result<Self, StoreError> {
    let mut core = EditorCore::open(
      notes,
      id,
      NoteKind::Task,
      delay
    )?;
    core.note.tasks.get_or_insert_default();
    Ok(Self { core })
  }

  pub fn id(&self) -> Uuid {
    self.core.id()
  }

  pub fn tasks(&self) -> &[TaskItem] {
    self.core.note.tasks.as_deref().unwrap_or_default()
  }

  /// Appends an empty, open task and
  /// returns its id.
  pub fn add_task(&mut self) -> Uuid {
    let id = Uuid::new_v4();
    let mut tasks = self.tasks().to_vec();
    tasks.push(TaskItem {
      id,
      text: String::new(),
      completed: false
    });
    self.replace(tasks);
    id
  }

  /// Returns false when no task has `id`.
  pub fn update_task(
    &mut self,
    id: Uuid,
    text: Option<&str>,
    completed: Option<bool>
  ) -> bool {
    let mut tasks = self.tasks().to_vec();
    let Some(task) =
      tasks.iter_mut().find(|t| t.id == id)
    else {
      return false;
    };
    if let Some(text) = text {
      task.text = text.to_string();
    }
    if let Some(completed) = completed {
      task.completed = completed;
    }
    self.replace(tasks);
    true
  }

  pub fn delete_task(
    &mut self,
    id: Uuid
  ) -> bool {
    let mut tasks = self.tasks().to_vec();
    let before = tasks.len();
    tasks.retain(|t| t.id != id);
    if tasks.len() == before {
      return false;
    }
    self.replace(tasks);
    true
  }

  pub async fn flush(
    &mut self
  ) -> Result<(), StoreError> {
    self.core.flush().await
  }

  /// Sends pending changes; the error
  /// is the caller's to report.
  pub async fn close(
    mut self
  ) -> Result<(), StoreError> {
    self.core.flush().await
  }

  fn replace(
    &mut self,
    tasks: Vec<TaskItem>
  ) {
    self.core.edit(NotePatch {
      tasks: Some(tasks),
      ..NotePatch::default()
    });
  }
}
