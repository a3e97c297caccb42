use std::sync::Arc;

use notecab_shared::{
  Cabinet,
  DEFAULT_CABINET_NAME,
  validate_cabinet_name
};
use parking_lot::Mutex;
use tracing::{
  debug,
  info,
  warn
};
use uuid::Uuid;

use crate::api::NotesApi;
use crate::error::StoreError;
use crate::local_storage::{
  LocalStorage,
  SELECTED_CABINET_KEY
};
use crate::notes::NoteListStore;

#[derive(Debug, Default)]
struct CabinetState {
  cabinets:    Vec<Cabinet>,
  current:     Option<Uuid>,
  loaded_once: bool
}

/// Cabinet list plus the current
/// selection. Selecting a cabinet drives
/// the shared `NoteListStore`.
#[derive(Clone)]
pub struct CabinetStore {
  api:     Arc<dyn NotesApi>,
  notes:   NoteListStore,
  storage: Arc<Mutex<LocalStorage>>,
  state:   Arc<Mutex<CabinetState>>
}

impl CabinetStore {
  pub fn new(
    api: Arc<dyn NotesApi>,
    notes: NoteListStore,
    storage: LocalStorage
  ) -> Self {
    Self {
      api,
      notes,
      storage: Arc::new(Mutex::new(
        storage
      )),
      state: Arc::new(Mutex::new(
        CabinetState::default()
      ))
    }
  }

  pub fn notes(&self) -> &NoteListStore {
    &self.notes
  }

  pub fn cabinets(&self) -> Vec<Cabinet> {
    self.state.lock().cabinets.clone()
  }

  pub fn current_cabinet_id(
    &self
  ) -> Option<Uuid> {
    self.state.lock().current
  }

  pub fn current_cabinet(
    &self
  ) -> Option<Cabinet> {
    let state = self.state.lock();
    let current = state.current?;
    state
      .cabinets
      .iter()
      .find(|c| c.id == current)
      .cloned()
  }

  /// The selection persisted by an
  /// earlier run, if any.
  pub fn remembered_cabinet_id(
    &self
  ) -> Option<Uuid> {
    self
      .storage
      .lock()
      .get(SELECTED_CABINET_KEY)
      .and_then(|raw| raw.parse().ok())
  }

  /// Looks a cabinet up by exact id, then
  /// by name.
  pub fn find_by_name_or_id(
    &self,
    key: &str
  ) -> Option<Cabinet> {
    let state = self.state.lock();
    let key = key.trim();
    if let Ok(id) = key.parse::<Uuid>()
      && let Some(found) =
        state.cabinets.iter().find(|c| c.id == id)
    {
      return Some(found.clone());
    }
    state
      .cabinets
      .iter()
      .find(|c| c.name == key)
      .cloned()
  }

  #[tracing::instrument(skip(self))]
  pub async fn load_cabinets(
    &self
  ) -> Result<Vec<Cabinet>, StoreError> {
    let cabinets =
      self.api.list_cabinets().await?;
    let remembered = self
      .remembered_cabinet_id();

    let selected = {
      let mut state = self.state.lock();
      let first_load = !state.loaded_once;
      state.loaded_once = true;
      state.cabinets = cabinets.clone();

      let keep = if first_load {
        remembered
      } else {
        state.current
      };
      let selected = keep
        .filter(|id| {
          cabinets.iter().any(|c| c.id == *id)
        })
        .or_else(|| fallback(&cabinets));
      state.current = selected;
      selected
    };

    info!(
      count = cabinets.len(),
      selected = ?selected,
      "loaded cabinets"
    );

    match selected {
      | Some(id) => {
        self.remember(Some(id));
        self.notes.load_notes(id).await?;
      }
      | None => self.notes.clear()
    }
    Ok(cabinets)
  }

  #[tracing::instrument(skip(self), fields(id = %id))]
  pub async fn select_cabinet(
    &self,
    id: Uuid
  ) -> Result<(), StoreError> {
    {
      let mut state = self.state.lock();
      if !state
        .cabinets
        .iter()
        .any(|c| c.id == id)
      {
        return Err(
          StoreError::UnknownCabinet(id)
        );
      }
      state.current = Some(id);
    }
    self.remember(Some(id));
    self.notes.load_notes(id).await?;
    info!("selected cabinet");
    Ok(())
  }

  /// Validates locally, creates on the
  /// server and switches to the new,
  /// empty cabinet.
  #[tracing::instrument(skip(self))]
  pub async fn create_cabinet(
    &self,
    name: &str
  ) -> Result<Cabinet, StoreError> {
    let name = validate_cabinet_name(name)?;
    let cabinet = self
      .api
      .create_cabinet(&name)
      .await
      .inspect_err(|err| {
        warn!(error = %err, "cabinet creation rejected");
      })?;

    {
      let mut state = self.state.lock();
      state.cabinets.push(cabinet.clone());
      state.current = Some(cabinet.id);
    }
    self.notes.reset(cabinet.id);
    self.remember(Some(cabinet.id));
    info!(id = %cabinet.id, "created cabinet");
    Ok(cabinet)
  }

  #[tracing::instrument(skip(self), fields(id = %id))]
  pub async fn delete_cabinet(
    &self,
    id: Uuid
  ) -> Result<(), StoreError> {
    self
      .api
      .delete_cabinet(id)
      .await
      .inspect_err(|err| {
        warn!(error = %err, "cabinet deletion rejected");
      })?;

    let next = {
      let mut state = self.state.lock();
      state.cabinets.retain(|c| c.id != id);
      if state.current != Some(id) {
        debug!("deleted cabinet was not current");
        return Ok(());
      }
      let next = fallback(&state.cabinets);
      state.current = next;
      next
    };

    match next {
      | Some(next) => {
        info!(next = %next, "switched to fallback cabinet");
        self.remember(Some(next));
        // The cabinet is gone server-side;
        // a failed load leaves an empty list.
        if let Err(err) =
          self.notes.load_notes(next).await
        {
          warn!(error = %err, "failed to load fallback cabinet notes");
        }
      }
      | None => {
        info!("last cabinet deleted");
        self.notes.clear();
        self.remember(None);
      }
    }
    Ok(())
  }

  fn remember(&self, id: Option<Uuid>) {
    let mut storage = self.storage.lock();
    let result = match id {
      | Some(id) => storage.set(
        SELECTED_CABINET_KEY,
        &id.to_string()
      ),
      | None => {
        storage.remove(SELECTED_CABINET_KEY)
      }
    };
    if let Err(err) = result {
      warn!(error = %err, "failed to persist cabinet selection");
    }
  }
}

/// "Default Cabinet" if present, else the
/// first cabinet.
fn fallback(
  cabinets: &[Cabinet]
) -> Option<Uuid> {
  cabinets
    .iter()
    .find(|c| c.name == DEFAULT_CABINET_NAME)
    .or_else(|| cabinets.first())
    .map(|c| c.id)
}

#[cfg(test)]
mod tests {
  use notecab_shared::CabinetNameError;

  use super::*;
  use crate::api::fake::{
    CallKind,
    FakeApi
  };
  use crate::error::ApiError;

  fn store_with(
    api: &Arc<FakeApi>,
    storage: LocalStorage
  ) -> CabinetStore {
    let notes =
      NoteListStore::new(api.clone());
    CabinetStore::new(
      api.clone(),
      notes,
      storage
    )
  }

  #[tokio::test]
  async fn first_load_prefers_remembered_cabinet()
  {
    let api = Arc::new(
      FakeApi::with_cabinets(&[
        "Default Cabinet",
        "Work"
      ])
    );
    let work = api.cabinet_id("Work");
    let mut storage =
      LocalStorage::in_memory();
    storage
      .set(
        SELECTED_CABINET_KEY,
        &work.to_string()
      )
      .expect("set");

    let store = store_with(&api, storage);
    store
      .load_cabinets()
      .await
      .expect("load");

    assert_eq!(
      store.current_cabinet_id(),
      Some(work)
    );
    assert_eq!(
      store.notes().cabinet_id(),
      Some(work)
    );
  }

  #[tokio::test]
  async fn stale_memory_falls_back_to_default()
  {
    let api = Arc::new(
      FakeApi::with_cabinets(&[
        "Work",
        "Default Cabinet"
      ])
    );
    let mut storage =
      LocalStorage::in_memory();
    storage
      .set(
        SELECTED_CABINET_KEY,
        &Uuid::new_v4().to_string()
      )
      .expect("set");

    let store = store_with(&api, storage);
    store
      .load_cabinets()
      .await
      .expect("load");

    assert_eq!(
      store.current_cabinet_id(),
      Some(api.cabinet_id("Default Cabinet"))
    );
  }

  #[tokio::test]
  async fn no_cabinets_means_no_selection() {
    let api = Arc::new(FakeApi::new());
    let store = store_with(
      &api,
      LocalStorage::in_memory()
    );
    store
      .load_cabinets()
      .await
      .expect("load");

    assert!(
      store.current_cabinet_id().is_none()
    );
    assert_eq!(
      api.count(CallKind::ListNotes),
      0
    );
  }

  #[tokio::test]
  async fn invalid_names_never_reach_the_server()
  {
    let api = Arc::new(FakeApi::new());
    let store = store_with(
      &api,
      LocalStorage::in_memory()
    );

    let long = "x".repeat(51);
    for (name, expected) in [
      ("   ", CabinetNameError::Empty),
      (
        "a.b",
        CabinetNameError::InvalidCharacters
      ),
      (
        long.as_str(),
        CabinetNameError::TooLong
      )
    ] {
      let err = store
        .create_cabinet(name)
        .await
        .expect_err("invalid name");
      assert_eq!(
        err,
        StoreError::InvalidName(expected)
      );
    }
    assert!(api.calls().is_empty());
  }

  #[tokio::test]
  async fn duplicate_name_surfaces_server_message()
  {
    let api = Arc::new(
      FakeApi::with_cabinets(&["Recipes"])
    );
    let store = store_with(
      &api,
      LocalStorage::in_memory()
    );

    let err = store
      .create_cabinet("Recipes")
      .await
      .expect_err("duplicate");
    assert_eq!(
      err.to_string(),
      "A cabinet named \"Recipes\" \
       already exists"
    );
    assert!(matches!(
      err,
      StoreError::Api(ApiError::Status {
        status: 409,
        ..
      })
    ));
  }

  #[tokio::test]
  async fn create_switches_to_new_cabinet() {
    let api = Arc::new(
      FakeApi::with_cabinets(&[
        "Default Cabinet"
      ])
    );
    let store = store_with(
      &api,
      LocalStorage::in_memory()
    );
    store
      .load_cabinets()
      .await
      .expect("load");

    let created = store
      .create_cabinet("  Travel  ")
      .await
      .expect("create");

    assert_eq!(created.name, "Travel");
    assert_eq!(
      store.current_cabinet_id(),
      Some(created.id)
    );
    assert_eq!(
      store.remembered_cabinet_id(),
      Some(created.id)
    );
    assert!(store.notes().is_empty());
  }

  #[tokio::test]
  async fn deleting_current_walks_the_fallback_chain()
  {
    let api = Arc::new(
      FakeApi::with_cabinets(&[
        "Work",
        "Default Cabinet",
        "Home"
      ])
    );
    let store = store_with(
      &api,
      LocalStorage::in_memory()
    );
    store
      .load_cabinets()
      .await
      .expect("load");
    let work = api.cabinet_id("Work");
    let default =
      api.cabinet_id("Default Cabinet");
    let home = api.cabinet_id("Home");

    store
      .select_cabinet(work)
      .await
      .expect("select");
    store
      .delete_cabinet(work)
      .await
      .expect("delete work");
    assert_eq!(
      store.current_cabinet_id(),
      Some(default)
    );

    store
      .delete_cabinet(default)
      .await
      .expect("delete default");
    assert_eq!(
      store.current_cabinet_id(),
      Some(home)
    );

    store
      .delete_cabinet(home)
      .await
      .expect("delete home");
    assert!(
      store.current_cabinet_id().is_none()
    );
    assert!(
      store.remembered_cabinet_id().is_none()
    );
    assert!(
      store.notes().cabinet_id().is_none()
    );
  }

  #[tokio::test]
  async fn selecting_unknown_cabinet_fails() {
    let api = Arc::new(FakeApi::new());
    let store = store_with(
      &api,
      LocalStorage::in_memory()
    );
    let id = Uuid::new_v4();
    assert_eq!(
      store.select_cabinet(id).await,
      Err(StoreError::UnknownCabinet(id))
    );
  }
}
