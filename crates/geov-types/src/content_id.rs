use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Length of a content identifier digest in bytes.
pub const CONTENT_ID_LEN: usize = 32;

/// Content-addressed identifier of a stored geo object.
///
/// A `ContentId` is the SHA-256 digest of an object's canonical geometry and
/// attribute serialization. Identical content always produces the same
/// `ContentId`, which is what makes stored objects deduplicatable.
///
/// The textual form is 64 lowercase hex characters. The null id (all zeros)
/// stands for "not yet addressed" and serializes as the empty string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId([u8; CONTENT_ID_LEN]);

impl ContentId {
    /// Wrap a pre-computed SHA-256 digest.
    pub const fn from_digest(digest: [u8; CONTENT_ID_LEN]) -> Self {
        Self(digest)
    }

    /// The null content id. Represents an object that has not been hashed.
    pub const fn null() -> Self {
        Self([0u8; CONTENT_ID_LEN])
    }

    /// Returns `true` if this is the null content id.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; CONTENT_ID_LEN]
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; CONTENT_ID_LEN] {
        &self.0
    }

    /// Lowercase hex representation (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string. Uppercase digits are accepted.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != CONTENT_ID_LEN {
            return Err(TypeError::InvalidLength {
                expected: CONTENT_ID_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; CONTENT_ID_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl Default for ContentId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.short_hex())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ContentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; CONTENT_ID_LEN]> for ContentId {
    fn from(bytes: [u8; CONTENT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ContentId> for [u8; CONTENT_ID_LEN] {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_null() {
            serializer.serialize_str("")
        } else {
            serializer.serialize_str(&self.to_hex())
        }
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(Self::null());
        }
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
