//! Content-addressed storage for geospatial objects.
//!
//! Every [`GeoObject`] (a GeoJSON geometry plus a free-form attribute map)
//! is stored under the SHA-256 of its canonical content, so storing the
//! same geometry with the same attributes twice yields one document.
//!
//! # Layers
//!
//! - [`ContentStore`] -- validation, addressing, deduplication and queries
//! - [`DocumentStore`] -- the backend seam: a keyed document collection
//!   with a uniqueness constraint on the content id
//!
//! # Storage Backends
//!
//! - [`InMemoryDocumentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileDocumentStore`] -- append-only journal, replayed into memory on open
//!
//! # Design Rules
//!
//! 1. Ids are always recomputed from content; declared ids are never trusted.
//! 2. Stored documents are never modified, only inserted or deleted.
//! 3. The backend's uniqueness constraint is the arbiter of concurrent stores.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod config;
pub mod error;
pub mod journal;
pub mod memory;
pub mod object;
pub mod store;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{BackendKind, StoreConfig, SyncMode};
pub use error::{StoreError, StoreResult};
pub use journal::FileDocumentStore;
pub use memory::InMemoryDocumentStore;
pub use object::{GeoDocument, GeoObject};
pub use store::{open_store, ContentStore};
pub use traits::DocumentStore;
