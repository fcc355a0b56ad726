//! Foundation types for GeoVersion.
//!
//! This crate provides the identifier, geometry and validation types used by
//! every other GeoVersion crate.
//!
//! # Key Types
//!
//! - [`ContentId`] — Content-addressed identifier (SHA-256 digest)
//! - [`Geometry`] — A GeoJSON geometry document as supplied by the caller
//! - [`GeometryKind`] — Kind derived from a geometry's `type` tag
//! - [`Shape`] — A validated geometry with typed coordinates
//! - [`Bounds`] — Axis-aligned bounding box
//! - [`ValidationError`] — Why the validator refused a geometry

pub mod content_id;
pub mod error;
pub mod geometry;
pub mod spatial;
pub mod validate;

pub use content_id::{ContentId, CONTENT_ID_LEN};
pub use error::TypeError;
pub use geometry::{Attributes, Bounds, Geometry, GeometryKind, Position, Shape};
pub use validate::{is_valid, validate, ValidationError};
