use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tempfile::NamedTempFile;
use tracing::{
  debug,
  warn
};

/// Key under which the current cabinet id
/// is remembered between runs.
pub const SELECTED_CABINET_KEY: &str =
  "currentCabinetId";

const STORAGE_FILE: &str =
  "local_storage.json";

/// Small durable string map, written back
/// to disk on every mutation.
#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
  path:   Option<PathBuf>,
  values: BTreeMap<String, String>
}

impl LocalStorage {
  #[tracing::instrument(skip(data_dir))]
  pub fn open(
    data_dir: &Path
  ) -> anyhow::Result<Self> {
    fs::create_dir_all(data_dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          data_dir.display()
        )
      })?;
    let path = data_dir.join(STORAGE_FILE);

    let values = if path.exists() {
      let text =
        fs::read_to_string(&path)
          .with_context(|| {
            format!(
              "failed to read {}",
              path.display()
            )
          })?;
      if text.trim().is_empty() {
        BTreeMap::new()
      } else {
        match serde_json::from_str(&text) {
          | Ok(values) => values,
          | Err(err) => {
            warn!(file = %path.display(), error = %err, "discarding unreadable local storage");
            BTreeMap::new()
          }
        }
      }
    } else {
      BTreeMap::new()
    };

    debug!(
      file = %path.display(),
      keys = values.len(),
      "opened local storage"
    );
    Ok(Self {
      path: Some(path),
      values
    })
  }

  /// Storage that never touches disk.
  pub fn in_memory() -> Self {
    Self::default()
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<&str> {
    self
      .values
      .get(key)
      .map(String::as_str)
  }

  pub fn set(
    &mut self,
    key: &str,
    value: &str
  ) -> anyhow::Result<()> {
    self.values.insert(
      key.to_string(),
      value.to_string()
    );
    self.persist()
  }

  pub fn remove(
    &mut self,
    key: &str
  ) -> anyhow::Result<()> {
    if self.values.remove(key).is_some() {
      self.persist()?;
    }
    Ok(())
  }

  fn persist(&self) -> anyhow::Result<()> {
    let Some(path) = &self.path else {
      return Ok(());
    };
    let dir = path
      .parent()
      .unwrap_or_else(|| Path::new("."));
    let mut temp =
      NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(
      &mut temp,
      &self.values
    )?;
    temp.flush()?;
    temp.persist(path).map_err(|err| {
      anyhow!(
        "failed to persist {}: {}",
        path.display(),
        err
      )
    })?;
    Ok(())
  }
}
