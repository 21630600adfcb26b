//! Persistence collaborator: synchronous get/upsert/delete by entity id.
//!
//! Stores call these on the dispatch thread and treat each call as one
//! critical section; nothing here spans multiple entities.

mod json_file;
mod memory;

pub use json_file::JsonFilePersistence;
pub use memory::MemoryPersistence;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Something a store persists.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name; one file/table per collection.
    const COLLECTION: &'static str;

    fn id(&self) -> String;
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode or decode '{path}': {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait Persistence<E: Entity>: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<E>, PersistenceError>;

    /// Insert or replace by `entity.id()`.
    fn upsert(&self, entity: &E) -> Result<(), PersistenceError>;

    /// Deleting a missing id is not an error.
    fn delete(&self, id: &str) -> Result<(), PersistenceError>;
}
