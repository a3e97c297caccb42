use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use notecab_shared::{Cabinet, DEFAULT_CABINET_NAME, Note};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

/// JSONL files holding every cabinet and note, one record per line.
#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub cabinets_path: PathBuf,
    pub notes_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let cabinets_path = data_dir.join("cabinets.data");
        let notes_path = data_dir.join("notes.data");

        if !cabinets_path.exists() {
            fs::write(&cabinets_path, "")?;
        }
        if !notes_path.exists() {
            fs::write(&notes_path, "")?;
        }

        info!(
            data_dir = %data_dir.display(),
            cabinets = %cabinets_path.display(),
            notes = %notes_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            cabinets_path,
            notes_path,
        })
    }

    /// Creates the fallback cabinet when the store holds none.
    #[tracing::instrument(skip(self))]
    pub fn seed_default_cabinet(&self) -> anyhow::Result<Option<Cabinet>> {
        let mut cabinets = self.load_cabinets()?;
        if !cabinets.is_empty() {
            return Ok(None);
        }

        let cabinet = Cabinet {
            id: Uuid::new_v4(),
            name: DEFAULT_CABINET_NAME.to_string(),
        };
        cabinets.push(cabinet.clone());
        self.save_cabinets(&cabinets)?;
        info!(id = %cabinet.id, "seeded default cabinet");
        Ok(Some(cabinet))
    }

    #[tracing::instrument(skip(self))]
    pub fn load_cabinets(&self) -> anyhow::Result<Vec<Cabinet>> {
        load_jsonl(&self.cabinets_path).context("failed to load cabinets.data")
    }

    #[tracing::instrument(skip(self))]
    pub fn load_notes(&self) -> anyhow::Result<Vec<Note>> {
        load_jsonl(&self.notes_path).context("failed to load notes.data")
    }

    #[tracing::instrument(skip(self, cabinets))]
    pub fn save_cabinets(&self, cabinets: &[Cabinet]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.cabinets_path, cabinets).context("failed to save cabinets.data")
    }

    #[tracing::instrument(skip(self, notes))]
    pub fn save_notes(&self, notes: &[Note]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.notes_path, notes).context("failed to save notes.data")
    }

    /// Notes of one cabinet in display order.
    #[tracing::instrument(skip(self), fields(cabinet_id = %cabinet_id))]
    pub fn notes_in_cabinet(&self, cabinet_id: Uuid) -> anyhow::Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .load_notes()?
            .into_iter()
            .filter(|note| note.cabinet_id == cabinet_id)
            .collect();
        notes.sort_by_key(|note| note.order);
        Ok(notes)
    }

    /// Removes a cabinet and every note filed in it. Returns the number of
    /// notes dropped, or `None` when the cabinet does not exist.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn delete_cabinet_cascade(&self, id: Uuid) -> anyhow::Result<Option<usize>> {
        let mut cabinets = self.load_cabinets()?;
        let Some(idx) = cabinets.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        cabinets.remove(idx);

        let notes = self.load_notes()?;
        let before = notes.len();
        let kept: Vec<Note> = notes.into_iter().filter(|n| n.cabinet_id != id).collect();
        let removed = before - kept.len();

        self.save_notes(&kept)?;
        self.save_cabinets(&cabinets)?;
        info!(removed_notes = removed, "deleted cabinet with its notes");
        Ok(Some(removed))
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: T = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(record);
    }

    debug!(count = out.len(), "loaded records from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, records))]
fn save_jsonl_atomic<T: Serialize>(path: &Path, records: &[T]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = records.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for record in records {
        let serialized = serde_json::to_string(record)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use notecab_shared::NoteKind;
    use tempfile::tempdir;

    use super::*;

    fn note(cabinet_id: Uuid, order: i64) -> Note {
        Note {
            id: Uuid::new_v4(),
            cabinet_id,
            kind: NoteKind::Standard,
            title: format!("note {order}"),
            content: String::new(),
            order,
            timestamp: Utc::now(),
            tasks: None,
            views: None,
            calendar_data: None,
        }
    }

    #[test]
    fn seeds_default_cabinet_only_once() {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");

        let seeded = store.seed_default_cabinet().expect("seed");
        assert_eq!(
            seeded.map(|c| c.name),
            Some(DEFAULT_CABINET_NAME.to_string())
        );
        assert!(store.seed_default_cabinet().expect("seed again").is_none());
        assert_eq!(store.load_cabinets().expect("load").len(), 1);
    }

    #[test]
    fn cascade_delete_drops_only_that_cabinets_notes() {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");

        let work = Cabinet {
            id: Uuid::new_v4(),
            name: "Work".to_string(),
        };
        let home = Cabinet {
            id: Uuid::new_v4(),
            name: "Home".to_string(),
        };
        store
            .save_cabinets(&[work.clone(), home.clone()])
            .expect("save cabinets");
        store
            .save_notes(&[note(work.id, 0), note(home.id, 0), note(work.id, 1000)])
            .expect("save notes");

        let removed = store.delete_cabinet_cascade(work.id).expect("delete");
        assert_eq!(removed, Some(2));
        assert_eq!(store.load_cabinets().expect("load"), vec![home.clone()]);
        assert_eq!(store.notes_in_cabinet(home.id).expect("notes").len(), 1);
        assert!(store.delete_cabinet_cascade(work.id).expect("again").is_none());
    }

    #[test]
    fn notes_in_cabinet_sorted_by_order() {
        let temp = tempdir().expect("tempdir");
        let store = DataStore::open(temp.path()).expect("open datastore");
        let cabinet_id = Uuid::new_v4();

        store
            .save_notes(&[note(cabinet_id, 2000), note(cabinet_id, 0), note(cabinet_id, 1000)])
            .expect("save notes");

        let orders: Vec<i64> = store
            .notes_in_cabinet(cabinet_id)
            .expect("notes")
            .iter()
            .map(|n| n.order)
            .collect();
        assert_eq!(orders, vec![0, 1000, 2000]);
    }
}
