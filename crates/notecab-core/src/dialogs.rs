//! Create/delete flows for cabinets, as state machines a UI can render.

use notecab_shared::{Cabinet, validate_cabinet_name};
use tracing::{debug, info};

use crate::cabinets::CabinetStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogPhase {
    #[default]
    Closed,
    Open,
    Submitting,
}

#[derive(Debug, Default)]
pub struct CreateCabinetDialog {
    phase: DialogPhase,
    name: String,
    error: Option<String>,
}

impl CreateCabinetDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != DialogPhase::Closed
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inline error shown under the name field.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn open(&mut self) {
        self.phase = DialogPhase::Open;
    }

    /// Dismissing resets the field and any error.
    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.error = None;
    }

    /// Validates locally, then creates. Client-side rejections never reach
    /// the server. On any failure the dialog stays open with the message.
    #[tracing::instrument(skip(self, store), fields(name = %self.name))]
    pub async fn submit(&mut self, store: &CabinetStore) -> Option<Cabinet> {
        if self.phase != DialogPhase::Open {
            debug!(phase = ?self.phase, "submit ignored");
            return None;
        }
        if let Err(err) = validate_cabinet_name(&self.name) {
            self.error = Some(err.to_string());
            return None;
        }

        self.error = None;
        self.phase = DialogPhase::Submitting;
        match store.create_cabinet(&self.name).await {
            Ok(cabinet) => {
                info!(id = %cabinet.id, "cabinet created from dialog");
                self.close();
                Some(cabinet)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                self.phase = DialogPhase::Open;
                None
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct DeleteCabinetDialog {
    phase: DialogPhase,
    target: Option<Cabinet>,
    error: Option<String>,
}

impl DeleteCabinetDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != DialogPhase::Closed
    }

    pub fn target(&self) -> Option<&Cabinet> {
        self.target.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn open(&mut self, cabinet: Cabinet) {
        self.phase = DialogPhase::Open;
        self.target = Some(cabinet);
        self.error = None;
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Returns true once the cabinet is gone and the dialog closed.
    #[tracing::instrument(skip(self, store))]
    pub async fn confirm(&mut self, store: &CabinetStore) -> bool {
        if self.phase != DialogPhase::Open {
            return false;
        }
        let Some(target) = self.target.clone() else {
            return false;
        };

        self.error = None;
        self.phase = DialogPhase::Submitting;
        match store.delete_cabinet(target.id).await {
            Ok(()) => {
                info!(id = %target.id, "cabinet deleted from dialog");
                self.close();
                true
            }
            Err(err) => {
                self.error = Some(err.to_string());
                self.phase = DialogPhase::Open;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::fake::{CallKind, FakeApi};
    use crate::local_storage::LocalStorage;
    use crate::notes::NoteListStore;

    fn store(api: &Arc<FakeApi>) -> CabinetStore {
        CabinetStore::new(
            api.clone(),
            NoteListStore::new(api.clone()),
            LocalStorage::in_memory(),
        )
    }

    #[tokio::test]
    async fn invalid_name_shows_inline_error_without_request() {
        let api = Arc::new(FakeApi::new());
        let store = store(&api);
        let mut dialog = CreateCabinetDialog::new();
        dialog.open();
        dialog.set_name("<b>");

        assert!(dialog.submit(&store).await.is_none());
        assert_eq!(
            dialog.error(),
            Some("Cabinet name contains invalid characters")
        );
        assert!(dialog.is_open());
        assert!(api.calls().is_empty());

        dialog.set_name("Fine");
        assert!(dialog.error().is_none());
    }

    #[tokio::test]
    async fn server_rejection_keeps_dialog_open() {
        let api = Arc::new(FakeApi::with_cabinets(&["Recipes"]));
        let store = store(&api);
        let mut dialog = CreateCabinetDialog::new();
        dialog.open();
        dialog.set_name("Recipes");

        assert!(dialog.submit(&store).await.is_none());
        assert_eq!(
            dialog.error(),
            Some("A cabinet named \"Recipes\" already exists")
        );
        assert_eq!(dialog.phase(), DialogPhase::Open);
        assert_eq!(dialog.name(), "Recipes");
    }

    #[tokio::test]
    async fn successful_create_closes_and_resets() {
        let api = Arc::new(FakeApi::new());
        let store = store(&api);
        let mut dialog = CreateCabinetDialog::new();
        dialog.open();
        dialog.set_name("Travel");

        let created = dialog.submit(&store).await.expect("created");
        assert_eq!(created.name, "Travel");
        assert!(!dialog.is_open());
        assert_eq!(dialog.name(), "");
    }

    #[tokio::test]
    async fn delete_failure_surfaces_message() {
        let api = Arc::new(FakeApi::with_cabinets(&["Default Cabinet", "Work"]));
        let store = store(&api);
        store.load_cabinets().await.expect("load");
        let work = store.find_by_name_or_id("Work").expect("work");
        api.fail(CallKind::DeleteCabinet);

        let mut dialog = DeleteCabinetDialog::new();
        dialog.open(work.clone());
        assert!(!dialog.confirm(&store).await);
        assert!(dialog.error().is_some());
        assert_eq!(dialog.target(), Some(&work));

        api.recover(CallKind::DeleteCabinet);
        assert!(dialog.confirm(&store).await);
        assert!(!dialog.is_open());
        assert_eq!(store.cabinets().len(), 1);
    }

    #[tokio::test]
    async fn delete_succeeds_even_if_fallback_notes_fail_to_load() {
        let api = Arc::new(FakeApi::with_cabinets(&["Default Cabinet", "Work"]));
        let store = store(&api);
        store.load_cabinets().await.expect("load");
        let work = store.find_by_name_or_id("Work").expect("work");
        store.select_cabinet(work.id).await.expect("select");
        api.fail(CallKind::ListNotes);

        let mut dialog = DeleteCabinetDialog::new();
        dialog.open(work);
        assert!(dialog.confirm(&store).await);
        assert!(!dialog.is_open());
        assert!(dialog.error().is_none());

        let default = api.cabinet_id("Default Cabinet");
        assert_eq!(store.current_cabinet_id(), Some(default));
        assert_eq!(store.remembered_cabinet_id(), Some(default));
        assert!(store.notes().is_empty());
        assert_eq!(api.cabinets().len(), 1);
    }

    #[tokio::test]
    async fn closed_dialog_ignores_confirm() {
        let api = Arc::new(FakeApi::new());
        let store = store(&api);
        let mut dialog = DeleteCabinetDialog::new();
        assert!(!dialog.confirm(&store).await);
        assert!(api.calls().is_empty());
    }
}
