use geov_crypto::HasherError;
use geov_types::{ContentId, ValidationError};

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The geometry failed structural or range validation.
    #[error("invalid geometry: {0}")]
    Validation(#[from] ValidationError),

    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ContentId),

    /// The geometry or attributes could not be canonicalized for hashing.
    #[error("cannot address object: {0}")]
    Addressing(#[from] HasherError),

    /// The backing document store failed or cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The document store's uniqueness constraint rejected an insert.
    #[error("duplicate content id: {0}")]
    DuplicateId(ContentId),

    /// Attempted to write an object with a null content id.
    #[error("cannot store object with null content id")]
    NullContentId,

    /// Inverted or non-finite bounding box.
    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether this error is an infrastructure problem rather than bad input.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(StoreError::Unavailable("down".into()).is_unavailable());
        assert!(StoreError::Io(std::io::Error::other("disk")).is_unavailable());
        assert!(!StoreError::Validation(ValidationError::MissingType).is_unavailable());
        assert!(!StoreError::NotFound(ContentId::null()).is_unavailable());
        assert!(!StoreError::Addressing(HasherError::MalformedGeometry).is_unavailable());
    }

    #[test]
    fn display_includes_cause() {
        let err = StoreError::from(ValidationError::EmptyPolygon);
        assert_eq!(err.to_string(), "invalid geometry: polygon has no rings");
    }
}
