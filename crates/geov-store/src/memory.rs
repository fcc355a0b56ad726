use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use geov_types::{ContentId, Geometry, Shape};

use crate::error::{StoreError, StoreResult};
use crate::object::GeoDocument;
use crate::traits::DocumentStore;

/// In-memory, HashMap-based document store.
///
/// Intended for tests and embedding, and used as the index behind the
/// journal backend. Documents are held behind a `RwLock`; the uniqueness
/// check and the insert happen under one write lock.
pub struct InMemoryDocumentStore {
    docs: RwLock<HashMap<ContentId, GeoDocument>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove all documents.
    pub fn clear(&self) -> StoreResult<()> {
        self.write()?.clear();
        Ok(())
    }

    /// Clone every stored document.
    pub fn snapshot(&self) -> StoreResult<Vec<GeoDocument>> {
        Ok(self.read()?.values().cloned().collect())
    }

    /// Insert or replace without the uniqueness check. Used for journal
    /// replay, where the journal is the source of truth.
    pub(crate) fn restore(&self, doc: GeoDocument) -> StoreResult<()> {
        self.write()?.insert(doc.id, doc);
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<ContentId, GeoDocument>>> {
        self.docs
            .read()
            .map_err(|_| StoreError::Unavailable("document lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<ContentId, GeoDocument>>> {
        self.docs
            .write()
            .map_err(|_| StoreError::Unavailable("document lock poisoned".into()))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert_one(&self, doc: GeoDocument) -> StoreResult<()> {
        let mut docs = self.write()?;
        if docs.contains_key(&doc.id) {
            return Err(StoreError::DuplicateId(doc.id));
        }
        docs.insert(doc.id, doc);
        Ok(())
    }

    fn find_one(&self, id: &ContentId) -> StoreResult<Option<GeoDocument>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn delete_one(&self, id: &ContentId) -> StoreResult<bool> {
        Ok(self.write()?.remove(id).is_some())
    }

    fn count(&self) -> StoreResult<u64> {
        Ok(self.read()?.len() as u64)
    }

    fn ids(&self) -> StoreResult<Vec<ContentId>> {
        Ok(self.read()?.keys().copied().collect())
    }

    fn find_by_type(&self, type_tag: &str) -> StoreResult<Vec<GeoDocument>> {
        Ok(self
            .read()?
            .values()
            .filter(|doc| doc.geometry.type_tag() == Some(type_tag))
            .cloned()
            .collect())
    }

    fn find_within(&self, polygon: &Geometry) -> StoreResult<Vec<GeoDocument>> {
        let container = polygon.shape()?;
        Ok(self
            .read()?
            .values()
            .filter(|doc| geometry_within(&doc.geometry, &container))
            .cloned()
            .collect())
    }

    fn contains(&self, id: &ContentId) -> StoreResult<bool> {
        Ok(self.read()?.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("document_count", &self.len().ok())
            .finish()
    }
}

/// Containment test shared by the backends. Geometries that no longer
/// validate never match.
pub(crate) fn geometry_within(geometry: &Geometry, container: &Shape) -> bool {
    let Ok(shape) = geometry.shape() else {
        return false;
    };
    container.bounds().contains_bounds(&shape.bounds()) && shape.is_within(container)
}
