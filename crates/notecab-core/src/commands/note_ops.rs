use std::io::Write;

use anyhow::{
  Context,
  anyhow
};
use chrono::NaiveDate;
use notecab_shared::NoteKind;
use tracing::{
  info,
  instrument
};

use super::Session;
use crate::cli::position;
use crate::editor::{
  CalendarEditor,
  StandardEditor,
  TaskEditor
};
use crate::notes::ReorderOutcome;

pub(super) fn cmd_notes(
  session: &Session,
  out: &mut dyn Write
) -> anyhow::Result<()> {
  let Some(cabinet) =
    session.cabinets.current_cabinet()
  else {
    writeln!(out, "No cabinet selected.")?;
    return Ok(());
  };
  let notes = session.cabinets.notes().notes();
  writeln!(out, "{}", cabinet.name)?;
  if notes.is_empty() {
    writeln!(out, "No notes.")?;
    return Ok(());
  }
  session.renderer.note_table(out, &notes)
}

pub(super) fn cmd_show(
  session: &Session,
  out: &mut dyn Write,
  index: usize
) -> anyhow::Result<()> {
  let note = session.note_at(index)?;
  session.renderer.note_detail(out, &note)
}

#[instrument(skip(session, out))]
pub(super) async fn cmd_add(
  session: &Session,
  out: &mut dyn Write,
  kind: NoteKind,
  title: &str
) -> anyhow::Result<()> {
  let cabinet_id = session.current_cabinet()?;
  let note = session
    .cabinets
    .notes()
    .create_note(cabinet_id, kind, title)
    .await
    .context("failed to create note")?;
  info!(id = %note.id, "command add");
  writeln!(
    out,
    "Created {} note {} '{}'.",
    note.kind.as_str(),
    session.cabinets.notes().len(),
    note.display_title()
  )?;
  Ok(())
}

#[instrument(skip(session, out, content))]
pub(super) async fn cmd_edit(
  session: &Session,
  out: &mut dyn Write,
  index: usize,
  title: Option<String>,
  content: Option<String>
) -> anyhow::Result<()> {
  let note = session.note_at(index)?;
  let mut editor = StandardEditor::open(
    session.cabinets.notes(),
    note.id,
    session.autosave_delay,
    None
  )?;
  editor.focus();

  if let Some(title) = title {
    editor.set_title(&title);
    editor
      .blur_title()
      .await
      .context("failed to save title")?;
  }
  if let Some(content) = content {
    editor.set_content(&content);
  }
  editor
    .close()
    .await
    .context("failed to save note")?;

  let saved = session
    .cabinets
    .notes()
    .note(note.id)
    .unwrap_or(note);
  writeln!(
    out,
    "Saved note {index} '{}'.",
    saved.display_title()
  )?;
  Ok(())
}

#[instrument(skip(session, out))]
pub(super) async fn cmd_rm(
  session: &Session,
  out: &mut dyn Write,
  index: usize
) -> anyhow::Result<()> {
  let note = session.note_at(index)?;
  session
    .cabinets
    .notes()
    .delete_note(note.id)
    .await
    .with_context(|| {
      format!(
        "failed to delete note {index}"
      )
    })?;
  writeln!(
    out,
    "Deleted note '{}'.",
    note.display_title()
  )?;
  Ok(())
}

#[instrument(skip(session, out))]
pub(super) async fn cmd_move(
  session: &Session,
  out: &mut dyn Write,
  from: usize,
  to: usize
) -> anyhow::Result<()> {
  let outcome = session
    .cabinets
    .notes()
    .reorder(position(from)?, position(to)?)
    .await
    .context("failed to reorder notes")?;

  match outcome {
    | ReorderOutcome::Unchanged => {
      writeln!(out, "Nothing to move.")?
    }
    | ReorderOutcome::Applied {
      reconciled
    } => {
      info!(reconciled, "command move");
      writeln!(
        out,
        "Moved note {from} to {to}."
      )?;
    }
  }
  Ok(())
}

#[instrument(skip(session, out, text))]
pub(super) async fn cmd_task_add(
  session: &Session,
  out: &mut dyn Write,
  index: usize,
  text: &str
) -> anyhow::Result<()> {
  let note = session.note_at(index)?;
  let mut editor = TaskEditor::open(
    session.cabinets.notes(),
    note.id,
    session.autosave_delay
  )?;
  let task = editor.add_task();
  editor.update_task(task, Some(text), None);
  let count = editor.tasks().len();
  editor
    .close()
    .await
    .with_context(|| {
      format!(
        "failed to save note {index}"
      )
    })?;

  writeln!(
    out,
    "Added task {count} to '{}'.",
    note.display_title()
  )?;
  Ok(())
}

#[instrument(skip(session, out))]
pub(super) async fn cmd_task_done(
  session: &Session,
  out: &mut dyn Write,
  index: usize,
  task: usize
) -> anyhow::Result<()> {
  let note = session.note_at(index)?;
  let mut editor = TaskEditor::open(
    session.cabinets.notes(),
    note.id,
    session.autosave_delay
  )?;
  let target = editor
    .tasks()
    .get(position(task)?)
    .map(|t| t.id)
    .ok_or_else(|| {
      anyhow!(
        "note {index} has no task {task}"
      )
    })?;
  editor.update_task(target, None, Some(true));
  editor
    .close()
    .await
    .with_context(|| {
      format!(
        "failed to save note {index}"
      )
    })?;

  writeln!(out, "Completed task {task}.")?;
  Ok(())
}

#[instrument(skip(session, out, text))]
pub(super) async fn cmd_day(
  session: &Session,
  out: &mut dyn Write,
  index: usize,
  date: NaiveDate,
  text: &str
) -> anyhow::Result<()> {
  let note = session.note_at(index)?;
  let mut editor = CalendarEditor::open(
    session.cabinets.notes(),
    note.id,
    session.autosave_delay
  )?;
  editor.set_entry(date, text);
  editor
    .close()
    .await
    .with_context(|| {
      format!(
        "failed to save note {index}"
      )
    })?;

  writeln!(out, "Saved {date}.")?;
  Ok(())
}

#[instrument(skip(session, out))]
pub(super) async fn cmd_view_add(
  session: &Session,
  out: &mut dyn Write,
  index: usize
) -> anyhow::Result<()> {
  let note = session.note_at(index)?;
  let mut editor = CalendarEditor::open(
    session.cabinets.notes(),
    note.id,
    session.autosave_delay
  )?;
  let view_id = editor.add_view();
  editor
    .close()
    .await
    .with_context(|| {
      format!(
        "failed to save note {index}"
      )
    })?;

  writeln!(out, "Added {view_id}.")?;
  Ok(())
}
