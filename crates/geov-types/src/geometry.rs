use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::TypeError;
use crate::validate::{
    self, ValidationError, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE,
};

/// Free-form attributes attached to a geometry.
///
/// Keys keep insertion order (serde_json is built with `preserve_order`),
/// which the content hash depends on.
pub type Attributes = Map<String, Value>;

/// GeoJSON geometry kinds recognized by the store.
///
/// Only `Point`, `LineString` and `Polygon` can be stored; the remaining
/// kinds are recognized so that they can be reported and rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    /// Missing or unrecognized `type` tag.
    Unknown,
}

impl GeometryKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Point,
        Self::LineString,
        Self::Polygon,
        Self::MultiPoint,
        Self::MultiLineString,
        Self::MultiPolygon,
        Self::GeometryCollection,
        Self::Unknown,
    ];

    /// Map a GeoJSON `type` tag to a kind. Tags are case-sensitive, as in
    /// GeoJSON; anything unrecognized is `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Point" => Self::Point,
            "LineString" => Self::LineString,
            "Polygon" => Self::Polygon,
            "MultiPoint" => Self::MultiPoint,
            "MultiLineString" => Self::MultiLineString,
            "MultiPolygon" => Self::MultiPolygon,
            "GeometryCollection" => Self::GeometryCollection,
            _ => Self::Unknown,
        }
    }

    /// The GeoJSON `type` tag for this kind. `Unknown` has none.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Self::Point => Some("Point"),
            Self::LineString => Some("LineString"),
            Self::Polygon => Some("Polygon"),
            Self::MultiPoint => Some("MultiPoint"),
            Self::MultiLineString => Some("MultiLineString"),
            Self::MultiPolygon => Some("MultiPolygon"),
            Self::GeometryCollection => Some("GeometryCollection"),
            Self::Unknown => None,
        }
    }

    /// Whether geometries of this kind pass the validator at all.
    pub fn is_storable(&self) -> bool {
        match self {
            Self::Point | Self::LineString | Self::Polygon => true,
            Self::MultiPoint
            | Self::MultiLineString
            | Self::MultiPolygon
            | Self::GeometryCollection
            | Self::Unknown => false,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().unwrap_or("Unknown"))
    }
}

impl FromStr for GeometryKind {
    type Err = TypeError;

    /// Lenient parse for user input: case-insensitive, also accepts `"unknown"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownGeometryKind(s.to_string()))
    }
}

/// A `[longitude, latitude]` pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    fn to_value(self) -> Value {
        json!([self.lon, self.lat])
    }
}

impl From<(f64, f64)> for Position {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self::new(lon, lat)
    }
}

/// A GeoJSON geometry document: `{"type": ..., "coordinates": ...}`.
///
/// The raw payload is kept as given so that hashing sees exactly what the
/// caller supplied. Nothing is checked on construction; use [`Geometry::shape`]
/// (or [`crate::validate`]) to gate it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Geometry(Value);

impl Geometry {
    /// Wrap an arbitrary JSON value.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Parse a geometry from JSON text.
    pub fn from_json_str(s: &str) -> Result<Self, TypeError> {
        serde_json::from_str(s)
            .map(Self)
            .map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Build a `Point` geometry.
    pub fn point(lon: f64, lat: f64) -> Self {
        Self(json!({
            "type": "Point",
            "coordinates": Position::new(lon, lat).to_value(),
        }))
    }

    /// Build a `LineString` geometry.
    pub fn line_string(positions: &[Position]) -> Self {
        Self(json!({
            "type": "LineString",
            "coordinates": positions_to_value(positions),
        }))
    }

    /// Build a `Polygon` geometry from its rings (outer ring first).
    pub fn polygon(rings: &[Vec<Position>]) -> Self {
        let rings: Vec<Value> = rings.iter().map(|r| positions_to_value(r)).collect();
        Self(json!({
            "type": "Polygon",
            "coordinates": rings,
        }))
    }

    /// The raw `type` tag, if present and a string.
    pub fn type_tag(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// The raw `coordinates` payload, if present.
    pub fn coordinates(&self) -> Option<&Value> {
        self.0.get("coordinates")
    }

    /// Kind derived from the `type` tag.
    pub fn kind(&self) -> GeometryKind {
        self.type_tag()
            .map(GeometryKind::from_tag)
            .unwrap_or(GeometryKind::Unknown)
    }

    /// Validate and decode into a typed [`Shape`].
    pub fn shape(&self) -> Result<Shape, ValidationError> {
        validate::validate(self)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Geometry {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&Shape> for Geometry {
    fn from(shape: &Shape) -> Self {
        match shape {
            Shape::Point(p) => Self::point(p.lon, p.lat),
            Shape::LineString(positions) => Self::line_string(positions),
            Shape::Polygon(rings) => Self::polygon(rings),
        }
    }
}

fn positions_to_value(positions: &[Position]) -> Value {
    Value::Array(positions.iter().map(|p| p.to_value()).collect())
}

/// A validated geometry with typed coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Point(Position),
    LineString(Vec<Position>),
    /// Rings, outer ring first. Rings are not required to be closed.
    Polygon(Vec<Vec<Position>>),
}

impl Shape {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point(_) => GeometryKind::Point,
            Self::LineString(_) => GeometryKind::LineString,
            Self::Polygon(_) => GeometryKind::Polygon,
        }
    }

    /// Every vertex of the shape, in document order.
    pub fn positions(&self) -> Vec<Position> {
        match self {
            Self::Point(p) => vec![*p],
            Self::LineString(positions) => positions.clone(),
            Self::Polygon(rings) => rings.iter().flatten().copied().collect(),
        }
    }

    /// Axis-aligned bounds of all vertices.
    pub fn bounds(&self) -> Bounds {
        let positions = self.positions();
        let mut bounds = Bounds {
            min_lon: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        };
        for p in positions {
            bounds.min_lon = bounds.min_lon.min(p.lon);
            bounds.min_lat = bounds.min_lat.min(p.lat);
            bounds.max_lon = bounds.max_lon.max(p.lon);
            bounds.max_lat = bounds.max_lat.max(p.lat);
        }
        bounds
    }
}

/// An axis-aligned longitude/latitude rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// Build a bounding box, rejecting non-finite, out-of-range or inverted
    /// bounds. Degenerate boxes (`min == max`) are allowed.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, TypeError> {
        if ![min_lon, min_lat, max_lon, max_lat].iter().all(|v| v.is_finite()) {
            return Err(TypeError::InvalidBounds("bounds must be finite".into()));
        }
        for lon in [min_lon, max_lon] {
            if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&lon) {
                return Err(TypeError::InvalidBounds(format!(
                    "longitude {lon} outside [{MIN_LONGITUDE}, {MAX_LONGITUDE}]"
                )));
            }
        }
        for lat in [min_lat, max_lat] {
            if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&lat) {
                return Err(TypeError::InvalidBounds(format!(
                    "latitude {lat} outside [{MIN_LATITUDE}, {MAX_LATITUDE}]"
                )));
            }
        }
        if min_lon > max_lon {
            return Err(TypeError::InvalidBounds(format!(
                "min_lon {min_lon} is greater than max_lon {max_lon}"
            )));
        }
        if min_lat > max_lat {
            return Err(TypeError::InvalidBounds(format!(
                "min_lat {min_lat} is greater than max_lat {max_lat}"
            )));
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Whether `p` lies inside or on the edge of the box.
    pub fn contains(&self, p: Position) -> bool {
        p.lon >= self.min_lon && p.lon <= self.max_lon && p.lat >= self.min_lat && p.lat <= self.max_lat
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.min_lon >= self.min_lon
            && other.max_lon <= self.max_lon
            && other.min_lat >= self.min_lat
            && other.max_lat <= self.max_lat
    }

    /// The closed 5-point ring
    /// `[min,min] -> [max,min] -> [max,max] -> [min,max] -> [min,min]`.
    pub fn to_ring(&self) -> Vec<Position> {
        vec![
            Position::new(self.min_lon, self.min_lat),
            Position::new(self.max_lon, self.min_lat),
            Position::new(self.max_lon, self.max_lat),
            Position::new(self.min_lon, self.max_lat),
            Position::new(self.min_lon, self.min_lat),
        ]
    }

    /// The box as a single-ring `Polygon` geometry.
    pub fn to_polygon(&self) -> Geometry {
        Geometry::polygon(&[self.to_ring()])
    }
}
