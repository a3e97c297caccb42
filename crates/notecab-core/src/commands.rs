mod cabinet_ops;
mod note_ops;

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, anyhow};
use notecab_shared::Note;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::cabinets::CabinetStore;
use crate::cli::{Command, position};
use crate::render::Renderer;

/// Everything a command needs: the stores, the autosave delay for editors
/// and the output renderer.
pub struct Session {
    pub cabinets: CabinetStore,
    pub autosave_delay: Duration,
    pub renderer: Renderer,
}

impl Session {
    fn current_cabinet(&self) -> anyhow::Result<Uuid> {
        self.cabinets.current_cabinet_id().ok_or_else(|| {
            anyhow!("no cabinet selected; create one with `notecab cabinet-add NAME`")
        })
    }

    /// Note at a 1-based display position.
    fn note_at(&self, index: usize) -> anyhow::Result<Note> {
        let notes = self.cabinets.notes().notes();
        let len = notes.len();
        notes
            .into_iter()
            .nth(position(index)?)
            .ok_or_else(|| anyhow!("no note at position {index} ({len} notes)"))
    }
}

#[instrument(skip(session, out))]
pub async fn dispatch(session: &Session, out: &mut dyn Write, command: Command) -> anyhow::Result<()> {
    session
        .cabinets
        .load_cabinets()
        .await
        .context("failed to load cabinets")?;
    debug!(
        current = ?session.cabinets.current_cabinet_id(),
        notes = session.cabinets.notes().len(),
        "session ready"
    );

    match command {
        Command::Cabinets => cabinet_ops::cmd_cabinets(session, out),
        Command::CabinetAdd { name } => cabinet_ops::cmd_cabinet_add(session, out, &name).await,
        Command::CabinetRm { cabinet } => cabinet_ops::cmd_cabinet_rm(session, out, &cabinet).await,
        Command::Use { cabinet } => cabinet_ops::cmd_use(session, out, &cabinet).await,
        Command::Notes => note_ops::cmd_notes(session, out),
        Command::Add { kind, title } => note_ops::cmd_add(session, out, kind, &title).await,
        Command::Edit {
            index,
            title,
            content,
        } => note_ops::cmd_edit(session, out, index, title, content).await,
        Command::Rm { index } => note_ops::cmd_rm(session, out, index).await,
        Command::Move { from, to } => note_ops::cmd_move(session, out, from, to).await,
        Command::TaskAdd { index, text } => note_ops::cmd_task_add(session, out, index, &text).await,
        Command::TaskDone { index, task } => note_ops::cmd_task_done(session, out, index, task).await,
        Command::Day { index, date, text } => {
            note_ops::cmd_day(session, out, index, date, &text).await
        }
        Command::ViewAdd { index } => note_ops::cmd_view_add(session, out, index).await,
        Command::Show { index } => note_ops::cmd_show(session, out, index),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use notecab_shared::NoteKind;

    use super::*;
    use crate::api::fake::{CallKind, FakeApi};
    use crate::config::Config;
    use crate::local_storage::LocalStorage;
    use crate::notes::{NoteListStore, new_note_payload};

    fn session_with_task_note() -> (Arc<FakeApi>, Uuid, Session) {
        let api = Arc::new(FakeApi::with_cabinets(&["Default Cabinet"]));
        let cabinet_id = api.cabinet_id("Default Cabinet");
        let payload = new_note_payload(cabinet_id, NoteKind::Task, "Todo", 999, Utc::now().date_naive());
        api.insert_note(Note {
            id: Uuid::new_v4(),
            cabinet_id,
            kind: NoteKind::Task,
            title: payload.title,
            content: payload.content,
            order: payload.order,
            timestamp: payload.timestamp,
            tasks: payload.tasks,
            views: payload.views,
            calendar_data: payload.calendar_data,
        });

        let mut cfg = Config::defaults();
        cfg.apply_overrides([("color".to_string(), "off".to_string())]);
        let notes = NoteListStore::new(api.clone());
        let session = Session {
            cabinets: CabinetStore::new(api.clone(), notes, LocalStorage::in_memory()),
            autosave_delay: Duration::from_millis(500),
            renderer: Renderer::new(&cfg).expect("renderer"),
        };
        (api, cabinet_id, session)
    }

    #[tokio::test(start_paused = true)]
    async fn task_add_saves_before_reporting() {
        let (api, cabinet_id, session) = session_with_task_note();
        let mut out = Vec::new();

        dispatch(
            &session,
            &mut out,
            Command::TaskAdd {
                index: 1,
                text: "buy milk".to_string(),
            },
        )
        .await
        .expect("task-add");

        assert_eq!(String::from_utf8(out).expect("utf8"), "Added task 1 to 'Todo'.\n");
        let tasks = api.stored_notes(cabinet_id)[0].tasks.clone().expect("tasks");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "buy milk");
    }

    #[tokio::test(start_paused = true)]
    async fn task_add_fails_when_save_is_rejected() {
        let (api, cabinet_id, session) = session_with_task_note();
        api.fail(CallKind::UpdateNote);
        let mut out = Vec::new();

        let err = dispatch(
            &session,
            &mut out,
            Command::TaskAdd {
                index: 1,
                text: "buy milk".to_string(),
            },
        )
        .await
        .expect_err("rejected save must fail the command");

        assert_eq!(err.to_string(), "failed to save note 1");
        assert!(out.is_empty());
        assert_eq!(api.stored_notes(cabinet_id)[0].tasks, Some(vec![]));
    }
}
