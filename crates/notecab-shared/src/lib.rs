use std::collections::BTreeMap;

use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use serde::{
  Deserialize,
  Serialize
};
use uuid::Uuid;

pub mod validate;

pub use validate::{
  CabinetNameError,
  MAX_CABINET_NAME_LEN,
  validate_cabinet_name
};

/// Name the client falls back to when the
/// current cabinet disappears.
pub const DEFAULT_CABINET_NAME: &str =
  "Default Cabinet";

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Cabinet {
  pub id:   Uuid,
  pub name: String
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
  Standard,
  Task,
  Calendar
}

impl NoteKind {
  pub fn as_str(self) -> &'static str {
    match self {
      | NoteKind::Standard => "standard",
      | NoteKind::Task => "task",
      | NoteKind::Calendar => "calendar"
    }
  }
}

impl std::str::FromStr for NoteKind {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s.trim() {
      | "standard" | "note" => {
        Ok(NoteKind::Standard)
      }
      | "task" | "tasks" => {
        Ok(NoteKind::Task)
      }
      | "calendar" | "cal" => {
        Ok(NoteKind::Calendar)
      }
      | other => Err(format!(
        "unknown note type: {other}"
      ))
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TaskItem {
  pub id:        Uuid,
  #[serde(default)]
  pub text:      String,
  #[serde(default)]
  pub completed: bool
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum CalendarViewMode {
  Month,
  Week
}

impl CalendarViewMode {
  pub fn toggled(self) -> Self {
    match self {
      | CalendarViewMode::Month => {
        CalendarViewMode::Week
      }
      | CalendarViewMode::Week => {
        CalendarViewMode::Month
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
  pub id:            String,
  pub view_type:     CalendarViewMode,
  pub selected_date: NaiveDate
}

/// Sparse day → text mapping kept by
/// calendar notes.
pub type CalendarEntries =
  BTreeMap<NaiveDate, String>;

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct Note {
  pub id:            Uuid,
  pub cabinet_id:    Uuid,
  #[serde(rename = "type")]
  pub kind:          NoteKind,
  #[serde(default)]
  pub title:         String,
  #[serde(default)]
  pub content:       String,
  pub order:         i64,
  pub timestamp:     DateTime<Utc>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub tasks:         Option<Vec<TaskItem>>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub views:         Option<Vec<CalendarView>>,
  #[serde(
    default,
    rename = "calendarData",
    skip_serializing_if = "Option::is_none"
  )]
  pub calendar_data: Option<CalendarEntries>
}

impl Note {
  /// Title shown to users; empty titles
  /// render as "Untitled".
  pub fn display_title(&self) -> &str {
    if self.title.trim().is_empty() {
      "Untitled"
    } else {
      self.title.as_str()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct NoteCreate {
  #[serde(default)]
  pub title:         String,
  #[serde(default)]
  pub content:       String,
  #[serde(rename = "type")]
  pub kind:          NoteKind,
  pub timestamp:     DateTime<Utc>,
  pub order:         i64,
  pub cabinet_id:    Uuid,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub tasks:         Option<Vec<TaskItem>>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub views:         Option<Vec<CalendarView>>,
  #[serde(
    default,
    rename = "calendarData",
    skip_serializing_if = "Option::is_none"
  )]
  pub calendar_data: Option<CalendarEntries>
}

/// Partial note update. Only the fields
/// that are `Some` travel over the wire;
/// `type`, `id` and `cabinet_id` are not
/// patchable.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
  PartialEq,
)]
pub struct NotePatch {
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub title:         Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub content:       Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub order:         Option<i64>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub tasks:         Option<Vec<TaskItem>>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub views:         Option<Vec<CalendarView>>,
  #[serde(
    default,
    rename = "calendarData",
    skip_serializing_if = "Option::is_none"
  )]
  pub calendar_data: Option<CalendarEntries>
}

impl NotePatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.content.is_none()
      && self.order.is_none()
      && self.tasks.is_none()
      && self.views.is_none()
      && self.calendar_data.is_none()
  }

  /// Copies every field carried by the
  /// patch onto `note`.
  pub fn apply_to(&self, note: &mut Note) {
    if let Some(title) = &self.title {
      note.title = title.clone();
    }
    if let Some(content) = &self.content {
      note.content = content.clone();
    }
    if let Some(order) = self.order {
      note.order = order;
    }
    if let Some(tasks) = &self.tasks {
      note.tasks = Some(tasks.clone());
    }
    if let Some(views) = &self.views {
      note.views = Some(views.clone());
    }
    if let Some(data) = &self.calendar_data
    {
      note.calendar_data =
        Some(data.clone());
    }
  }

  /// Same field selection as `self`, with
  /// values taken from `source`.
  pub fn select_from(
    &self,
    source: &Note
  ) -> NotePatch {
    NotePatch {
      title:         self
        .title
        .as_ref()
        .map(|_| source.title.clone()),
      content:       self
        .content
        .as_ref()
        .map(|_| source.content.clone()),
      order:         self
        .order
        .map(|_| source.order),
      tasks:         self
        .tasks
        .as_ref()
        .map(|_| {
          source
            .tasks
            .clone()
            .unwrap_or_default()
        }),
      views:         self
        .views
        .as_ref()
        .map(|_| {
          source
            .views
            .clone()
            .unwrap_or_default()
        }),
      calendar_data: self
        .calendar_data
        .as_ref()
        .map(|_| {
          source
            .calendar_data
            .clone()
            .unwrap_or_default()
        })
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct OrderUpdate {
  pub id:    Uuid,
  pub order: i64
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct CabinetCreate {
  pub name: String
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct NotesQuery {
  #[serde(default)]
  pub cabinet_id: Option<Uuid>
}

/// Body of every non-success response.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct ErrorBody {
  pub error: String
}
