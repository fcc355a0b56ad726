use chrono::{DateTime, Utc};
use geov_crypto::{ContentHasher, HasherError};
use geov_types::{Attributes, ContentId, Geometry, GeometryKind};
use serde::{Deserialize, Serialize};

/// A geometry with attributes, identified by its content.
///
/// `GeoObject` is the unit of storage. Geometry and attributes are fixed at
/// construction: any change would produce a different content id and so a
/// different object. The geometry kind is always derived from the geometry's
/// `type` tag.
///
/// A freshly built object has a null id. The store computes the id on
/// insert; [`GeoObject::addressed`] computes it up front.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoObject {
    id: ContentId,
    geometry: Geometry,
    attributes: Attributes,
    created_at: Option<DateTime<Utc>>,
}

impl GeoObject {
    /// Create an unaddressed object.
    pub fn new(geometry: Geometry, attributes: Attributes) -> Self {
        Self {
            id: ContentId::null(),
            geometry,
            attributes,
            created_at: None,
        }
    }

    /// Create an object and compute its content id.
    pub fn addressed(geometry: Geometry, attributes: Attributes) -> Result<Self, HasherError> {
        let mut object = Self::new(geometry, attributes);
        object.id = object.compute_id()?;
        Ok(object)
    }

    /// Declare an id for this object. The store recomputes ids on insert, so
    /// a wrong declaration is overwritten rather than trusted.
    pub fn with_id(mut self, id: ContentId) -> Self {
        self.id = id;
        self
    }

    /// Compute the content id from geometry and attributes.
    pub fn compute_id(&self) -> Result<ContentId, HasherError> {
        ContentHasher::compute(&self.geometry, &self.attributes)
    }

    /// Returns `true` if the declared id is non-null and matches the content.
    pub fn is_addressed(&self) -> bool {
        !self.id.is_null() && ContentHasher::verify(&self.geometry, &self.attributes, &self.id)
    }

    pub fn id(&self) -> ContentId {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Geometry kind, derived from the geometry's `type` tag.
    pub fn kind(&self) -> GeometryKind {
        self.geometry.kind()
    }

    /// Insertion time, set only on objects read back from the store.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Whether two objects carry the same geometry and attributes,
    /// regardless of id or timestamp.
    pub fn same_content(&self, other: &GeoObject) -> bool {
        self.geometry == other.geometry && self.attributes == other.attributes
    }

    /// Build the persisted document for this object.
    pub(crate) fn to_document(&self, id: ContentId, created_at: DateTime<Utc>) -> GeoDocument {
        GeoDocument {
            id,
            geometry: self.geometry.clone(),
            attributes: self.attributes.clone(),
            created_at,
        }
    }
}

impl From<GeoDocument> for GeoObject {
    fn from(doc: GeoDocument) -> Self {
        Self {
            id: doc.id,
            geometry: doc.geometry,
            attributes: doc.attributes,
            created_at: Some(doc.created_at),
        }
    }
}

/// The persisted form of a [`GeoObject`]: one document per stored object.
///
/// ```json
/// {"id": "<64 hex>", "geometry": {...}, "attributes": {...}, "createdAt": "<RFC 3339>"}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoDocument {
    pub id: ContentId,
    pub geometry: Geometry,
    pub attributes: Attributes,
    pub created_at: DateTime<Utc>,
}
