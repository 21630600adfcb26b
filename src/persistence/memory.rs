use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Entity, Persistence, PersistenceError};

/// Process-local persistence, mostly for tests and ephemeral sessions.
pub struct MemoryPersistence<E> {
    entries: RwLock<HashMap<String, E>>,
}

impl<E: Entity> MemoryPersistence<E> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<E: Entity> Default for MemoryPersistence<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Persistence<E> for MemoryPersistence<E> {
    fn get(&self, id: &str) -> Result<Option<E>, PersistenceError> {
        Ok(self.entries.read().get(id).cloned())
    }

    fn upsert(&self, entity: &E) -> Result<(), PersistenceError> {
        self.entries.write().insert(entity.id(), entity.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        self.entries.write().remove(id);
        Ok(())
    }
}
