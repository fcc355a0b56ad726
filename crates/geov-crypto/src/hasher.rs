use geov_types::{Attributes, ContentId, Geometry};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Separator between the geometry and attribute JSON in the hashed text.
///
/// Part of the id format: without it, a geometry ending in a string and an
/// attribute document starting with one could hash the same content twice
/// under different splits.
pub const SEPARATOR: &str = "|";

/// SHA-256 content hasher for geo objects.
///
/// The id of an object is
/// `hex(sha256(canonical(geometry) + "|" + canonical(attributes)))`, where
/// `canonical` is compact `serde_json` output with object keys in insertion
/// order. Keys are never re-sorted: `{"a":1,"b":2}` and `{"b":2,"a":1}` are
/// different content. Changing either rule changes every existing id.
pub struct ContentHasher;

impl ContentHasher {
    /// Compute the content id of a geometry/attribute pair.
    ///
    /// Fails if the geometry is not a JSON object or either side cannot be
    /// serialized.
    pub fn compute(geometry: &Geometry, attributes: &Attributes) -> Result<ContentId, HasherError> {
        let text = Self::canonical_text(geometry, attributes)?;
        Ok(ContentId::from_digest(Self::raw_hash(text.as_bytes())))
    }

    /// The exact text that is hashed for a geometry/attribute pair.
    pub fn canonical_text(geometry: &Geometry, attributes: &Attributes) -> Result<String, HasherError> {
        if !geometry.as_value().is_object() {
            return Err(HasherError::MalformedGeometry);
        }
        let geometry_json = Self::canonical_json(geometry)?;
        let attributes_json = Self::canonical_json(attributes)?;

        let mut text = String::with_capacity(geometry_json.len() + SEPARATOR.len() + attributes_json.len());
        text.push_str(&geometry_json);
        text.push_str(SEPARATOR);
        text.push_str(&attributes_json);
        Ok(text)
    }

    /// Canonical JSON text of a serializable value.
    pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, HasherError> {
        serde_json::to_string(value).map_err(|e| HasherError::Serialization(e.to_string()))
    }

    /// Verify that a geometry/attribute pair produces the expected id.
    pub fn verify(geometry: &Geometry, attributes: &Attributes, expected: &ContentId) -> bool {
        matches!(Self::compute(geometry, attributes), Ok(id) if id == *expected)
    }

    /// Raw SHA-256 digest of arbitrary bytes.
    pub fn raw_hash(data: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&Sha256::digest(data));
        out
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("geometry is not a JSON object")]
    MalformedGeometry,

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn attrs(value: serde_json::Value) -> Attributes {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn hash_is_deterministic() {
        let g = Geometry::point(30.0, 60.0);
        let a = attrs(json!({"class": "test_class"}));
        let id1 = ContentHasher::compute(&g, &a).unwrap();
        let id2 = ContentHasher::compute(&g, &a).unwrap();
        assert_eq!(id1, id2);
        assert!(!id1.is_null());
    }

    #[test]
    fn canonical_text_format() {
        let g = Geometry::point(30.0, 60.0);
        let a = attrs(json!({"class": "a"}));
        let text = ContentHasher::canonical_text(&g, &a).unwrap();
        assert_eq!(
            text,
            r#"{"type":"Point","coordinates":[30.0,60.0]}|{"class":"a"}"#
        );
    }

    #[test]
    fn id_is_sha256_of_canonical_text() {
        let g = Geometry::point(30.0, 60.0);
        let a = attrs(json!({"class": "a"}));
        let text = ContentHasher::canonical_text(&g, &a).unwrap();
        let id = ContentHasher::compute(&g, &a).unwrap();
        assert_eq!(id.as_bytes(), &ContentHasher::raw_hash(text.as_bytes()));
    }

    #[test]
    fn known_digest() {
        // sha256("abc")
        assert_eq!(
            ContentId::from_digest(ContentHasher::raw_hash(b"abc")).to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn attribute_change_changes_id() {
        let g = Geometry::point(30.0, 60.0);
        let a = ContentHasher::compute(&g, &attrs(json!({"class": "a"}))).unwrap();
        let b = ContentHasher::compute(&g, &attrs(json!({"class": "b"}))).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn attribute_order_is_significant() {
        let g = Geometry::point(1.0, 2.0);
        let ab = ContentHasher::compute(&g, &attrs(json!({"a": 1, "b": 2}))).unwrap();
        let ba = ContentHasher::compute(&g, &attrs(json!({"b": 2, "a": 1}))).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn empty_attributes_hash() {
        let g = Geometry::point(1.0, 2.0);
        let text = ContentHasher::canonical_text(&g, &Attributes::new()).unwrap();
        assert!(text.ends_with("|{}"));
    }

    #[test]
    fn non_object_geometry_is_rejected() {
        let g = Geometry::from_value(json!("Point"));
        assert_eq!(
            ContentHasher::compute(&g, &Attributes::new()).unwrap_err(),
            HasherError::MalformedGeometry
        );
    }

    #[test]
    fn verify_detects_mismatch() {
        let g = Geometry::point(3.0, 4.0);
        let a = attrs(json!({"k": "v"}));
        let id = ContentHasher::compute(&g, &a).unwrap();
        assert!(ContentHasher::verify(&g, &a, &id));
        assert!(!ContentHasher::verify(&g, &Attributes::new(), &id));
        assert!(!ContentHasher::verify(&g, &a, &ContentId::null()));
    }

    proptest! {
        #[test]
        fn compute_is_deterministic(
            lon in -180.0f64..=180.0,
            lat in -90.0f64..=90.0,
            key in "[a-z]{1,8}",
            value in ".*",
        ) {
            let g = Geometry::point(lon, lat);
            let mut a = Attributes::new();
            a.insert(key, json!(value));
            prop_assert_eq!(
                ContentHasher::compute(&g, &a).unwrap(),
                ContentHasher::compute(&g.clone(), &a.clone()).unwrap()
            );
        }
    }
}
