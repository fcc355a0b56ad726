use geov_types::{ContentId, Geometry};

use crate::error::StoreResult;
use crate::object::GeoDocument;

/// The persistent document collection behind a [`ContentStore`](crate::ContentStore).
///
/// All implementations must satisfy these invariants:
/// - `insert_one` enforces a uniqueness constraint on `id` atomically and
///   reports a violation as [`StoreError::DuplicateId`](crate::StoreError::DuplicateId).
///   This constraint is the authoritative dedup guarantee.
/// - Documents are never updated in place.
/// - Missing documents are reported with `Ok(None)` / `Ok(false)`, never `Err`.
/// - All I/O errors are propagated, never silently ignored.
pub trait DocumentStore: Send + Sync {
    /// Insert a new document.
    fn insert_one(&self, doc: GeoDocument) -> StoreResult<()>;

    /// Exact lookup by id.
    fn find_one(&self, id: &ContentId) -> StoreResult<Option<GeoDocument>>;

    /// Delete by id. Returns `true` if a document was removed.
    fn delete_one(&self, id: &ContentId) -> StoreResult<bool>;

    /// Number of stored documents.
    fn count(&self) -> StoreResult<u64>;

    /// Ids of every stored document, in the backend's natural order.
    fn ids(&self) -> StoreResult<Vec<ContentId>>;

    /// Documents whose `geometry.type` equals `type_tag`.
    fn find_by_type(&self, type_tag: &str) -> StoreResult<Vec<GeoDocument>>;

    /// Documents whose geometry lies within `polygon`.
    fn find_within(&self, polygon: &Geometry) -> StoreResult<Vec<GeoDocument>>;

    /// Check whether a document exists.
    ///
    /// Default implementation calls `find_one()`.
    fn contains(&self, id: &ContentId) -> StoreResult<bool> {
        Ok(self.find_one(id)?.is_some())
    }

    /// Make every completed write durable. Default is a no-op.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    fn insert_one(&self, doc: GeoDocument) -> StoreResult<()> {
        (**self).insert_one(doc)
    }

    fn find_one(&self, id: &ContentId) -> StoreResult<Option<GeoDocument>> {
        (**self).find_one(id)
    }

    fn delete_one(&self, id: &ContentId) -> StoreResult<bool> {
        (**self).delete_one(id)
    }

    fn count(&self) -> StoreResult<u64> {
        (**self).count()
    }

    fn ids(&self) -> StoreResult<Vec<ContentId>> {
        (**self).ids()
    }

    fn find_by_type(&self, type_tag: &str) -> StoreResult<Vec<GeoDocument>> {
        (**self).find_by_type(type_tag)
    }

    fn find_within(&self, polygon: &Geometry) -> StoreResult<Vec<GeoDocument>> {
        (**self).find_within(polygon)
    }

    fn contains(&self, id: &ContentId) -> StoreResult<bool> {
        (**self).contains(id)
    }

    fn flush(&self) -> StoreResult<()> {
        (**self).flush()
    }
}
