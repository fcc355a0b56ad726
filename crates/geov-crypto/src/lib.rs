//! Content addressing for GeoVersion.
//!
//! Derives a [`ContentId`](geov_types::ContentId) from a geometry and its
//! attributes by hashing their canonical JSON forms with SHA-256.
//!
//! Hashing is delegated to the `sha2` crate.

pub mod hasher;

pub use hasher::{ContentHasher, HasherError, SEPARATOR};
