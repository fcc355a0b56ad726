use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Flush/sync strategy for the journal backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every record (safest, highest latency).
    EveryWrite,
    /// Flush to the OS after every record and rely on its page cache.
    #[default]
    OsDefault,
}

/// Which [`DocumentStore`](crate::DocumentStore) backs the content store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Process-local, lost on exit.
    Memory,
    /// Append-only journal under `data_dir`.
    #[default]
    File,
}

/// Store configuration, usually loaded from a TOML file:
///
/// ```toml
/// backend = "file"
/// data_dir = "/var/lib/geoversion"
/// collection = "bpo_cas"
/// sync_mode = "every_write"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    /// Collection name; the journal file is `<data_dir>/<collection>.journal`.
    pub collection: String,
    pub sync_mode: SyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            data_dir: PathBuf::from("geoversion-data"),
            collection: "bpo_cas".into(),
            sync_mode: SyncMode::OsDefault,
        }
    }
}

impl StoreConfig {
    /// In-memory configuration.
    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Self::default()
        }
    }

    /// File-backed configuration rooted at `data_dir`.
    pub fn file(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::File,
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Path of the journal file for the file backend.
    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.journal", self.collection))
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> StoreResult<()> {
        if self.collection.is_empty() {
            return Err(StoreError::Config("collection name must not be empty".into()));
        }
        if self.collection.contains(['/', '\\']) || self.collection.starts_with('.') {
            return Err(StoreError::Config(format!(
                "collection name {:?} must be a plain file name",
                self.collection
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.backend, BackendKind::File);
        assert_eq!(c.collection, "bpo_cas");
        assert_eq!(c.sync_mode, SyncMode::OsDefault);
        assert_eq!(c.journal_path(), PathBuf::from("geoversion-data/bpo_cas.journal"));
    }

    #[test]
    fn parse_full_toml() {
        let c = StoreConfig::from_toml_str(
            r#"
            backend = "file"
            data_dir = "/tmp/geo"
            collection = "objects"
            sync_mode = "every_write"
            "#,
        )
        .unwrap();
        assert_eq!(c.data_dir, PathBuf::from("/tmp/geo"));
        assert_eq!(c.sync_mode, SyncMode::EveryWrite);
        assert_eq!(c.journal_path(), PathBuf::from("/tmp/geo/objects.journal"));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let c = StoreConfig::from_toml_str(r#"backend = "memory""#).unwrap();
        assert_eq!(c, StoreConfig::memory());
    }

    #[test]
    fn unknown_backend_rejected() {
        let err = StoreConfig::from_toml_str(r#"backend = "postgres""#).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn collection_must_be_plain_name() {
        for bad in ["", "../escape", "a/b", ".hidden"] {
            let c = StoreConfig {
                collection: bad.into(),
                ..StoreConfig::default()
            };
            assert!(c.validate().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = StoreConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
