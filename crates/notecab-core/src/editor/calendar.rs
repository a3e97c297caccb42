use std::time::Duration;

use chrono::{Local, NaiveDate};
use notecab_shared::{CalendarEntries, CalendarView, CalendarViewMode, NoteKind, NotePatch};
use uuid::Uuid;

use super::EditorCore;
use crate::calendar::{Step, shift};
use crate::error::StoreError;
use crate::notes::NoteListStore;

/// Calendar note editor: a list of independent view cursors plus a sparse
/// date → text map.
pub struct CalendarEditor {
    core: EditorCore,
}

impl CalendarEditor {
    pub fn open(notes: &NoteListStore, id: Uuid, delay: Duration) -> Result<Self, StoreError> {
        let mut core = EditorCore::open(notes, id, NoteKind::Calendar, delay)?;
        if core.note.views.as_ref().is_none_or(Vec::is_empty) {
            core.note.views = Some(vec![CalendarView {
                id: "view-1".to_string(),
                view_type: CalendarViewMode::Month,
                selected_date: Local::now().date_naive(),
            }]);
        }
        core.note.calendar_data.get_or_insert_default();
        Ok(Self { core })
    }

    pub fn id(&self) -> Uuid {
        self.core.id()
    }

    pub fn views(&self) -> &[CalendarView] {
        self.core.note.views.as_deref().unwrap_or_default()
    }

    pub fn view(&self, view_id: &str) -> Option<&CalendarView> {
        self.views().iter().find(|v| v.id == view_id)
    }

    pub fn entry(&self, date: NaiveDate) -> &str {
        self.core
            .note
            .calendar_data
            .as_ref()
            .and_then(|data| data.get(&date))
            .map_or("", String::as_str)
    }

    pub fn set_view_mode(&mut self, view_id: &str, mode: CalendarViewMode) -> bool {
        self.update_view(view_id, |view| view.view_type = mode)
    }

    pub fn select_date(&mut self, view_id: &str, date: NaiveDate) -> bool {
        self.update_view(view_id, |view| view.selected_date = date)
    }

    /// One month or one week, depending on the view's mode.
    pub fn navigate(&mut self, view_id: &str, step: Step) -> bool {
        self.update_view(view_id, |view| {
            view.selected_date = shift(view.view_type, view.selected_date, step);
        })
    }

    /// Appends `view-{n+1}` in the opposite mode of the last view, on the
    /// same date. Returns the new view's id.
    pub fn add_view(&mut self) -> String {
        let mut views = self.views().to_vec();
        let (mode, date) = views
            .last()
            .map(|last| (last.view_type.toggled(), last.selected_date))
            .unwrap_or((CalendarViewMode::Month, Local::now().date_naive()));
        let id = format!("view-{}", views.len() + 1);
        views.push(CalendarView {
            id: id.clone(),
            view_type: mode,
            selected_date: date,
        });
        self.core.edit(NotePatch {
            views: Some(views),
            ..NotePatch::default()
        });
        id
    }

    /// Upserts the text for one day.
    pub fn set_entry(&mut self, date: NaiveDate, text: &str) {
        let mut data: CalendarEntries = self.core.note.calendar_data.clone().unwrap_or_default();
        data.insert(date, text.to_string());
        self.core.edit(NotePatch {
            calendar_data: Some(data),
            ..NotePatch::default()
        });
    }

    pub async fn flush(&mut self) -> Result<(), StoreError> {
        self.core.flush().await
    }

    pub async fn close(mut self) -> Result<(), StoreError> {
        self.core.flush().await
    }

    fn update_view(&mut self, view_id: &str, change: impl FnOnce(&mut CalendarView)) -> bool {
        let mut views = self.views().to_vec();
        let Some(view) = views.iter_mut().find(|v| v.id == view_id) else {
            return false;
        };
        change(view);
        self.core.edit(NotePatch {
            views: Some(views),
            ..NotePatch::default()
        });
        true
    }
}
