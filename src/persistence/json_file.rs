//! One JSON document per collection, guarded by an advisory file lock.
//!
//! Writes go to a temp file and are renamed over the document, so a crash
//! mid-write leaves the previous version intact.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use super::{Entity, Persistence, PersistenceError};

pub struct JsonFilePersistence<E> {
    dir: PathBuf,
    _entity: PhantomData<fn() -> E>,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
    move |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl<E: Entity> JsonFilePersistence<E> {
    /// Open (creating if needed) the directory holding the collection.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        Ok(Self {
            dir,
            _entity: PhantomData,
        })
    }

    pub fn document_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", E::COLLECTION))
    }

    fn lock(&self, exclusive: bool) -> Result<File, PersistenceError> {
        let path = self.dir.join(format!("{}.lock", E::COLLECTION));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(io_error(&path))?;
        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(io_error(&path))?;
        Ok(file)
    }

    fn read_all(&self) -> Result<BTreeMap<String, E>, PersistenceError> {
        let path = self.document_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(io_error(&path)(err)),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|source| PersistenceError::Codec { path, source })
    }

    fn write_all(&self, entries: &BTreeMap<String, E>) -> Result<(), PersistenceError> {
        let path = self.document_path();
        let tmp = self.dir.join(format!("{}.json.tmp", E::COLLECTION));
        let content = serde_json::to_string_pretty(entries).map_err(|source| {
            PersistenceError::Codec {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&tmp, content).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_error(&path))
    }

    fn modify(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, E>),
    ) -> Result<(), PersistenceError> {
        let _lock = self.lock(true)?;
        let mut entries = self.read_all()?;
        apply(&mut entries);
        self.write_all(&entries)
    }
}

impl<E: Entity> Persistence<E> for JsonFilePersistence<E> {
    fn get(&self, id: &str) -> Result<Option<E>, PersistenceError> {
        let _lock = self.lock(false)?;
        Ok(self.read_all()?.remove(id))
    }

    fn upsert(&self, entity: &E) -> Result<(), PersistenceError> {
        tracing::debug!(collection = E::COLLECTION, id = %entity.id(), "upsert");
        self.modify(|entries| {
            entries.insert(entity.id(), entity.clone());
        })
    }

    fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        tracing::debug!(collection = E::COLLECTION, id, "delete");
        self.modify(|entries| {
            entries.remove(id);
        })
    }
}
