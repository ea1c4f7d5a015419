//! Repository configuration.

use crate::error::{RepositoryError, RepositoryResult};
use hmily_serializer::SerializerKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for opening a [`FileRepository`](crate::FileRepository).
///
/// Only `path` and `app_name` are required. The on-disk layout below the
/// root is fixed.
///
/// ```
/// use hmily_repository::FileConfig;
/// use hmily_serializer::SerializerKind;
///
/// let config = FileConfig::new("/var/lib/hmily", "account-service")
///     .serializer(SerializerKind::Json)
///     .sync_writes(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Root directory of the repository.
    pub path: PathBuf,

    /// Owning application; names the participant directory.
    pub app_name: String,

    /// Record encoding.
    #[serde(default)]
    pub serializer: SerializerKind,

    /// Whether to fsync every record file after writing it (slower, but a
    /// crash cannot lose the latest write).
    #[serde(default)]
    pub sync_writes: bool,

    /// Whether the retry claim rejects a presented version that differs
    /// from the stored one.
    #[serde(default)]
    pub strict_optimistic_lock: bool,
}

impl FileConfig {
    /// Creates a configuration with default options.
    pub fn new(path: impl Into<PathBuf>, app_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            app_name: app_name.into(),
            serializer: SerializerKind::default(),
            sync_writes: false,
            strict_optimistic_lock: false,
        }
    }

    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the document is malformed or fails
    /// [`FileConfig::validate`].
    pub fn from_json(json: &str) -> RepositoryResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RepositoryError::config(format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the record encoding.
    #[must_use]
    pub fn serializer(mut self, serializer: SerializerKind) -> Self {
        self.serializer = serializer;
        self
    }

    /// Sets whether record writes are fsynced.
    #[must_use]
    pub fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    /// Sets whether the retry claim checks versions.
    #[must_use]
    pub fn strict_optimistic_lock(mut self, value: bool) -> Self {
        self.strict_optimistic_lock = value;
        self
    }

    /// Returns the root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.path
    }

    /// Checks that the configuration can describe a repository.
    ///
    /// The application name becomes a directory next to the transaction
    /// files, so it must be a single path component and must not look like a
    /// record id.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self) -> RepositoryResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(RepositoryError::config("repository path must not be empty"));
        }
        let app = self.app_name.as_str();
        if app.trim().is_empty() {
            return Err(RepositoryError::config("app name must not be empty"));
        }
        if app == "." || app == ".." || app.contains(['/', '\\']) {
            return Err(RepositoryError::config(format!(
                "app name must be a single path component: {app:?}"
            )));
        }
        if app.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RepositoryError::config(format!(
                "app name must not be numeric: {app:?}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FileConfig::new("/tmp/hmily", "acct");
        assert_eq!(config.serializer, SerializerKind::Cbor);
        assert!(!config.sync_writes);
        assert!(!config.strict_optimistic_lock);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = FileConfig::new("/tmp/hmily", "acct")
            .serializer(SerializerKind::Json)
            .sync_writes(true)
            .strict_optimistic_lock(true);
        assert_eq!(config.serializer, SerializerKind::Json);
        assert!(config.sync_writes);
        assert!(config.strict_optimistic_lock);
    }

    #[test]
    fn rejects_bad_values() {
        for (path, app) in [("", "acct"), ("/tmp", ""), ("/tmp", "  "), ("/tmp", "a/b"), ("/tmp", ".."), ("/tmp", "123")] {
            let err = FileConfig::new(path, app).validate().unwrap_err();
            assert!(matches!(err, RepositoryError::Config { .. }), "{path:?} {app:?}");
        }
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = FileConfig::from_json(r#"{"path": "/data", "app_name": "acct"}"#).unwrap();
        assert_eq!(config, FileConfig::new("/data", "acct"));

        let config = FileConfig::from_json(
            r#"{"path": "/data", "app_name": "acct", "serializer": "json", "sync_writes": true}"#,
        )
        .unwrap();
        assert_eq!(config.serializer, SerializerKind::Json);
        assert!(config.sync_writes);
    }

    #[test]
    fn from_json_validates() {
        assert!(FileConfig::from_json(r#"{"path": "/data", "app_name": ""}"#).is_err());
        assert!(FileConfig::from_json("not json").is_err());
    }
}
