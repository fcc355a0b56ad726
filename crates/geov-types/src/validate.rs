//! Structural validation of GeoJSON geometries.
//!
//! The validator is the gate in front of the store: it decides whether a
//! geometry payload is well-formed enough to persist. It is pure and does no
//! I/O.
//!
//! Rules:
//! - `Point`: exactly `[lon, lat]`, both numeric, `-180 <= lon <= 180`,
//!   `-90 <= lat <= 90`.
//! - `LineString`: at least 2 positions, each a valid point.
//! - `Polygon`: at least one ring; every ring has at least 4 positions, each
//!   a valid point. Ring closure and self-intersection are not checked.
//! - Every other kind is rejected.

use serde_json::Value;

use crate::geometry::{Geometry, GeometryKind, Position, Shape};

pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;
pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;

/// Minimum number of positions in a `LineString`.
pub const MIN_LINE_POSITIONS: usize = 2;
/// Minimum number of positions in each `Polygon` ring.
pub const MIN_RING_POSITIONS: usize = 4;

/// Why a geometry was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("geometry is not a JSON object")]
    NotAnObject,

    #[error("geometry has no type tag")]
    MissingType,

    #[error("geometry has no coordinates")]
    MissingCoordinates,

    #[error("geometry kind {0} cannot be stored")]
    UnsupportedKind(String),

    #[error("{path}: expected an array")]
    NotAnArray { path: String },

    #[error("{path}: expected exactly 2 coordinates, got {actual}")]
    Arity { path: String, actual: usize },

    #[error("{path}: coordinate is not a number")]
    NotANumber { path: String },

    #[error("{path}: longitude {value} outside [-180, 180]")]
    LongitudeOutOfRange { path: String, value: f64 },

    #[error("{path}: latitude {value} outside [-90, 90]")]
    LatitudeOutOfRange { path: String, value: f64 },

    #[error("{path}: expected at least {min} positions, got {actual}")]
    TooFewPositions {
        path: String,
        min: usize,
        actual: usize,
    },

    #[error("polygon has no rings")]
    EmptyPolygon,
}

/// Validate a geometry and decode it into a typed [`Shape`].
pub fn validate(geometry: &Geometry) -> Result<Shape, ValidationError> {
    let object = geometry
        .as_value()
        .as_object()
        .ok_or(ValidationError::NotAnObject)?;

    let tag = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingType)?;
    let coordinates = object
        .get("coordinates")
        .ok_or(ValidationError::MissingCoordinates)?;

    match GeometryKind::from_tag(tag) {
        GeometryKind::Point => validate_position(coordinates, "coordinates").map(Shape::Point),
        GeometryKind::LineString => {
            validate_positions(coordinates, "coordinates", MIN_LINE_POSITIONS)
                .map(Shape::LineString)
        }
        GeometryKind::Polygon => validate_polygon(coordinates).map(Shape::Polygon),
        GeometryKind::MultiPoint
        | GeometryKind::MultiLineString
        | GeometryKind::MultiPolygon
        | GeometryKind::GeometryCollection
        | GeometryKind::Unknown => Err(ValidationError::UnsupportedKind(tag.to_string())),
    }
}

/// Convenience wrapper: `true` if [`validate`] succeeds.
pub fn is_valid(geometry: &Geometry) -> bool {
    validate(geometry).is_ok()
}

fn as_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, ValidationError> {
    value.as_array().ok_or_else(|| ValidationError::NotAnArray {
        path: path.to_string(),
    })
}

fn validate_position(value: &Value, path: &str) -> Result<Position, ValidationError> {
    let coords = as_array(value, path)?;
    if coords.len() != 2 {
        return Err(ValidationError::Arity {
            path: path.to_string(),
            actual: coords.len(),
        });
    }

    let number = |i: usize| {
        coords[i].as_f64().ok_or_else(|| ValidationError::NotANumber {
            path: format!("{path}[{i}]"),
        })
    };
    let lon = number(0)?;
    let lat = number(1)?;

    if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&lon) {
        return Err(ValidationError::LongitudeOutOfRange {
            path: path.to_string(),
            value: lon,
        });
    }
    if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&lat) {
        return Err(ValidationError::LatitudeOutOfRange {
            path: path.to_string(),
            value: lat,
        });
    }
    Ok(Position::new(lon, lat))
}

fn validate_positions(value: &Value, path: &str, min: usize) -> Result<Vec<Position>, ValidationError> {
    let items = as_array(value, path)?;
    if items.len() < min {
        return Err(ValidationError::TooFewPositions {
            path: path.to_string(),
            min,
            actual: items.len(),
        });
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| validate_position(item, &format!("{path}[{i}]")))
        .collect()
}

fn validate_polygon(value: &Value) -> Result<Vec<Vec<Position>>, ValidationError> {
    let rings = as_array(value, "coordinates")?;
    if rings.is_empty() {
        return Err(ValidationError::EmptyPolygon);
    }
    rings
        .iter()
        .enumerate()
        .map(|(i, ring)| validate_positions(ring, &format!("coordinates[{i}]"), MIN_RING_POSITIONS))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn geometry(value: Value) -> Geometry {
        Geometry::from_value(value)
    }

    #[test]
    fn point_at_extremes_is_valid() {
        for (lon, lat) in [(180.0, 90.0), (-180.0, -90.0), (0.0, 0.0)] {
            let shape = validate(&Geometry::point(lon, lat)).unwrap();
            assert_eq!(shape, Shape::Point(Position::new(lon, lat)));
        }
    }

    #[test]
    fn point_just_past_longitude_limit_is_invalid() {
        let err = validate(&Geometry::point(180.0001, 0.0)).unwrap_err();
        assert!(matches!(err, ValidationError::LongitudeOutOfRange { .. }));
    }

    #[test]
    fn point_just_past_latitude_limit_is_invalid() {
        let err = validate(&Geometry::point(0.0, -90.0001)).unwrap_err();
        assert!(matches!(err, ValidationError::LatitudeOutOfRange { .. }));
    }

    #[test]
    fn integer_coordinates_count_as_numeric() {
        assert!(is_valid(&geometry(json!({"type": "Point", "coordinates": [30, 60]}))));
    }

    #[test]
    fn point_requires_exactly_two_coordinates() {
        let one = geometry(json!({"type": "Point", "coordinates": [1.0]}));
        assert_eq!(
            validate(&one).unwrap_err(),
            ValidationError::Arity {
                path: "coordinates".into(),
                actual: 1
            }
        );
        let three = geometry(json!({"type": "Point", "coordinates": [1.0, 2.0, 3.0]}));
        assert!(matches!(validate(&three), Err(ValidationError::Arity { actual: 3, .. })));
    }

    #[test]
    fn point_rejects_non_numeric() {
        let g = geometry(json!({"type": "Point", "coordinates": [1.0, "2"]}));
        assert_eq!(
            validate(&g).unwrap_err(),
            ValidationError::NotANumber {
                path: "coordinates[1]".into()
            }
        );
    }

    #[test]
    fn missing_type_and_coordinates() {
        let g = geometry(json!({"coordinates": [1.0, 2.0]}));
        assert_eq!(validate(&g).unwrap_err(), ValidationError::MissingType);

        let g = geometry(json!({"type": "Point"}));
        assert_eq!(validate(&g).unwrap_err(), ValidationError::MissingCoordinates);

        let g = geometry(json!([1.0, 2.0]));
        assert_eq!(validate(&g).unwrap_err(), ValidationError::NotAnObject);
    }

    #[test]
    fn unrecognized_and_multi_kinds_rejected() {
        for tag in [
            "MultiPoint",
            "MultiLineString",
            "MultiPolygon",
            "GeometryCollection",
            "Circle",
        ] {
            let g = geometry(json!({"type": tag, "coordinates": [[1.0, 2.0]]}));
            assert_eq!(
                validate(&g).unwrap_err(),
                ValidationError::UnsupportedKind(tag.to_string())
            );
        }
    }

    #[test]
    fn line_string_needs_two_positions() {
        let one = Geometry::line_string(&[Position::new(0.0, 0.0)]);
        assert!(matches!(
            validate(&one),
            Err(ValidationError::TooFewPositions { min: 2, actual: 1, .. })
        ));

        let two = Geometry::line_string(&[Position::new(0.0, 0.0), Position::new(1.0, 1.0)]);
        assert_eq!(validate(&two).unwrap().kind(), GeometryKind::LineString);
    }

    #[test]
    fn line_string_checks_every_position() {
        let g = geometry(json!({
            "type": "LineString",
            "coordinates": [[0.0, 0.0], [1.0, 1.0], [200.0, 1.0]]
        }));
        match validate(&g).unwrap_err() {
            ValidationError::LongitudeOutOfRange { path, value } => {
                assert_eq!(path, "coordinates[2]");
                assert_eq!(value, 200.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn polygon_ring_with_three_points_invalid() {
        let g = geometry(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]]
        }));
        assert!(matches!(
            validate(&g),
            Err(ValidationError::TooFewPositions { min: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn polygon_ring_with_four_unclosed_points_accepted() {
        let g = geometry(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]]
        }));
        let shape = validate(&g).unwrap();
        assert_eq!(shape.kind(), GeometryKind::Polygon);
    }

    #[test]
    fn polygon_without_rings_invalid() {
        let g = geometry(json!({"type": "Polygon", "coordinates": []}));
        assert_eq!(validate(&g).unwrap_err(), ValidationError::EmptyPolygon);
    }

    #[test]
    fn polygon_checks_inner_rings() {
        let g = geometry(json!({
            "type": "Polygon",
            "coordinates": [
                [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]],
                [[1.0, 1.0], [2.0, 1.0], [1.0, 1.0]]
            ]
        }));
        match validate(&g).unwrap_err() {
            ValidationError::TooFewPositions { path, .. } => assert_eq!(path, "coordinates[1]"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn polygon_ring_must_be_array() {
        let g = geometry(json!({"type": "Polygon", "coordinates": [5]}));
        assert_eq!(
            validate(&g).unwrap_err(),
            ValidationError::NotAnArray {
                path: "coordinates[0]".into()
            }
        );
    }

    proptest! {
        #[test]
        fn in_range_points_always_valid(lon in -180.0f64..=180.0, lat in -90.0f64..=90.0) {
            prop_assert!(is_valid(&Geometry::point(lon, lat)));
        }

        #[test]
        fn out_of_range_longitude_always_invalid(lon in 180.0001f64..1.0e6, lat in -90.0f64..=90.0) {
            prop_assert!(!is_valid(&Geometry::point(lon, lat)));
            prop_assert!(!is_valid(&Geometry::point(-lon, lat)));
        }
    }
}
