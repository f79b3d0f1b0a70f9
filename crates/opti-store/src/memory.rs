//! In-memory document store.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::store::{Document, Store};

/// Process-local [`Store`] implementation backed by a map guarded by a
/// read/write lock. Revisions start at 1 and are bumped on every accepted
/// write; a `put` with an empty id is an insert and receives a fresh uuid.
pub struct InMemoryStore<T: Document> {
    items: RwLock<HashMap<String, T>>,
}

impl<T: Document> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Document> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document + Send + Sync> Store<T> for InMemoryStore<T> {
    fn get(&self, id: &str) -> StoreResult<T> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        items
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    fn put(&self, mut entity: T) -> StoreResult<T> {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());

        if entity.id().is_empty() {
            entity.set_id(uuid::Uuid::new_v4().to_string());
        }

        let id = entity.id().to_string();
        match items.get(&id) {
            Some(stored) if stored.revision() != entity.revision() => {
                return Err(StoreError::Conflict {
                    id,
                    expected: stored.revision(),
                    found: entity.revision(),
                });
            }
            _ => {}
        }

        entity.set_revision(entity.revision() + 1);
        items.insert(id, entity.clone());
        Ok(entity)
    }

    fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        Ok(items.remove(id).is_some())
    }

    fn query_all(&self) -> StoreResult<Vec<T>> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        Ok(items.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use opti_model::Run;

    use super::*;
    use crate::store::Store;

    #[test]
    fn put_assigns_identity_and_revision() {
        let store = InMemoryStore::new();
        let stored = store.put(Run::new("t1", "m1")).unwrap();
        assert!(!stored.id.is_empty());
        assert_eq!(stored.revision, 1);

        let loaded = store.get(&stored.id).unwrap();
        assert_eq!(loaded, stored);
    }

    #[test]
    fn stale_revision_is_a_conflict() {
        let store = InMemoryStore::new();
        let stored = store.put(Run::new("t1", "m1")).unwrap();

        // two readers take the same snapshot
        let first = stored.clone();
        let second = stored.clone();

        let first = store.put(first).unwrap();
        assert_eq!(first.revision, 2);

        let err = store.put(second).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 2, found: 1, .. }));

        // retry by re-reading and reapplying
        let reread = store.get(&first.id).unwrap();
        let retried = store.put(reread).unwrap();
        assert_eq!(retried.revision, 3);
    }

    #[test]
    fn delete_reports_whether_a_record_existed() {
        let store = InMemoryStore::new();
        let stored = store.put(Run::new("t1", "m1")).unwrap();
        assert!(store.delete(&stored.id).unwrap());
        assert!(!store.delete(&stored.id).unwrap());
        assert!(matches!(
            store.get(&stored.id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn query_all_returns_every_document() {
        let store = InMemoryStore::new();
        store.put(Run::new("t1", "m1")).unwrap();
        store.put(Run::new("t2", "m1")).unwrap();
        assert_eq!(store.query_all().unwrap().len(), 2);
    }
}
