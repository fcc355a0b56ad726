use chrono::Utc;
use geov_crypto::ContentHasher;
use geov_types::{validate, Attributes, Bounds, ContentId, Geometry, GeometryKind};
use tracing::{debug, info};

use crate::config::{BackendKind, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::journal::FileDocumentStore;
use crate::memory::InMemoryDocumentStore;
use crate::object::GeoObject;
use crate::traits::DocumentStore;

/// Content-addressed geometry store.
///
/// Validates geometries, derives content ids, and persists objects in a
/// [`DocumentStore`] so that each distinct (geometry, attributes) pair is
/// stored at most once.
///
/// The existence check in [`ContentStore::store`] is only a fast path. Two
/// callers storing identical content at the same time can both pass it; the
/// backend's uniqueness constraint then rejects one insert, and that caller
/// still gets success.
pub struct ContentStore<S: DocumentStore = Box<dyn DocumentStore>> {
    backend: S,
}

/// Open a content store with the backend selected by `config`.
pub fn open_store(config: &StoreConfig) -> StoreResult<ContentStore> {
    config.validate()?;
    let backend: Box<dyn DocumentStore> = match config.backend {
        BackendKind::Memory => Box::new(InMemoryDocumentStore::new()),
        BackendKind::File => Box::new(FileDocumentStore::open(
            &config.journal_path(),
            config.sync_mode,
        )?),
    };
    info!(backend = ?config.backend, collection = %config.collection, "content store opened");
    Ok(ContentStore::new(backend))
}

impl<S: DocumentStore> ContentStore<S> {
    /// Wrap an open document store.
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// The underlying document store.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Flush the backend and release the handle.
    pub fn close(self) -> StoreResult<()> {
        self.backend.flush()?;
        debug!("content store closed");
        Ok(())
    }

    /// Release the handle without flushing, returning the backend.
    pub fn into_inner(self) -> S {
        self.backend
    }

    /// Compute the content id of a geometry/attribute pair. No I/O.
    pub fn compute_id(&self, geometry: &Geometry, attributes: &Attributes) -> StoreResult<ContentId> {
        Ok(ContentHasher::compute(geometry, attributes)?)
    }

    /// Store an object and return its content id.
    ///
    /// The id is always recomputed from content; a declared id that
    /// disagrees is replaced. Storing content that is already present is a
    /// no-op that returns the existing id.
    pub fn store(&self, object: &GeoObject) -> StoreResult<ContentId> {
        let shape = validate(object.geometry())?;
        let id = object.compute_id()?;
        if id.is_null() {
            return Err(StoreError::NullContentId);
        }

        let declared = object.id();
        if !declared.is_null() && declared != id {
            debug!(declared = %declared.short_hex(), computed = %id.short_hex(), "declared id replaced");
        }

        if self.backend.contains(&id)? {
            debug!(id = %id.short_hex(), "object already stored");
            return Ok(id);
        }

        match self.backend.insert_one(object.to_document(id, Utc::now())) {
            Ok(()) => {
                debug!(id = %id.short_hex(), kind = %shape.kind(), "object stored");
                Ok(id)
            }
            Err(StoreError::DuplicateId(_)) => {
                debug!(id = %id.short_hex(), "lost insert race; object already stored");
                Ok(id)
            }
            Err(e) => Err(e),
        }
    }

    /// Store several objects in order, stopping at the first failure.
    ///
    /// Objects stored before the failure stay stored.
    pub fn store_all(&self, objects: &[GeoObject]) -> StoreResult<Vec<ContentId>> {
        objects.iter().map(|obj| self.store(obj)).collect()
    }

    /// Look up an object by id. Returns `Ok(None)` if it is not stored.
    pub fn retrieve(&self, id: &ContentId) -> StoreResult<Option<GeoObject>> {
        Ok(self.backend.find_one(id)?.map(GeoObject::from))
    }

    /// Look up an object by id, treating absence as an error.
    pub fn get(&self, id: &ContentId) -> StoreResult<GeoObject> {
        self.retrieve(id)?.ok_or(StoreError::NotFound(*id))
    }

    pub fn exists(&self, id: &ContentId) -> StoreResult<bool> {
        self.backend.contains(id)
    }

    /// Delete an object. Returns `true` if it was stored.
    pub fn remove(&self, id: &ContentId) -> StoreResult<bool> {
        let removed = self.backend.delete_one(id)?;
        if removed {
            debug!(id = %id.short_hex(), "object removed");
        }
        Ok(removed)
    }

    /// Number of distinct objects stored.
    pub fn count(&self) -> StoreResult<u64> {
        self.backend.count()
    }

    /// Ids of every stored object, in no particular order.
    pub fn list_ids(&self) -> StoreResult<Vec<ContentId>> {
        self.backend.ids()
    }

    /// All objects of the given geometry kind.
    ///
    /// Kinds the validator never admits cannot be stored, so they yield an
    /// empty result rather than a query.
    pub fn find_by_geometry_kind(&self, kind: GeometryKind) -> StoreResult<Vec<GeoObject>> {
        let tag = match kind {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint
            | GeometryKind::MultiLineString
            | GeometryKind::MultiPolygon
            | GeometryKind::GeometryCollection
            | GeometryKind::Unknown => return Ok(Vec::new()),
        };
        let docs = self.backend.find_by_type(tag)?;
        Ok(docs.into_iter().map(GeoObject::from).collect())
    }

    /// All objects whose geometry lies within the given box.
    ///
    /// Bounds are inclusive. Inverted, non-finite or out-of-range bounds
    /// are [`StoreError::InvalidBoundingBox`].
    pub fn find_in_bounding_box(
        &self,
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> StoreResult<Vec<GeoObject>> {
        let bounds = Bounds::new(min_lon, min_lat, max_lon, max_lat)
            .map_err(|e| StoreError::InvalidBoundingBox(e.to_string()))?;
        let docs = self.backend.find_within(&bounds.to_polygon())?;
        Ok(docs.into_iter().map(GeoObject::from).collect())
    }
}

impl<S: DocumentStore + std::fmt::Debug> std::fmt::Debug for ContentStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("backend", &self.backend)
            .finish()
    }
}
