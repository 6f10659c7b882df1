//! Store configuration.

use crate::db::schema::SCHEMA_VERSION;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Busy timeout applied to every connection unless overridden.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// SQLite database file; created on first open.
    File(PathBuf),
    /// Private in-memory database living as long as the owning store.
    Memory,
}

/// Options for opening a `RecordStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// Target schema version. A stored version below this one triggers a
    /// destructive rebuild of the table.
    pub schema_version: u32,
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Memory,
            schema_version: SCHEMA_VERSION,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl StoreConfig {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            location: StoreLocation::File(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    pub fn memory() -> Self {
        Self::default()
    }

    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, StoreLocation, DEFAULT_BUSY_TIMEOUT};
    use crate::db::SCHEMA_VERSION;
    use std::time::Duration;

    #[test]
    fn default_config_is_in_memory_at_current_version() {
        let config = StoreConfig::default();
        assert_eq!(config.location, StoreLocation::Memory);
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.busy_timeout, DEFAULT_BUSY_TIMEOUT);
    }

    #[test]
    fn builders_override_fields() {
        let config = StoreConfig::file("/tmp/shelter.db")
            .with_schema_version(4)
            .with_busy_timeout(Duration::from_millis(250));
        assert!(matches!(config.location, StoreLocation::File(_)));
        assert_eq!(config.schema_version, 4);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }
}
