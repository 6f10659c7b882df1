//! SQLite storage engine for the `records` table.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Guarantee the `records` table exists before any row access.
//! - Apply the drop-and-recreate version policy.
//! - Expose raw row-level primitives to the provider layer.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No row is read or written before the version policy has run.
//! - Connection handles are released on drop, on every exit path.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod config;
mod open;
pub mod schema;
mod store;

pub use config::{StoreConfig, StoreLocation, DEFAULT_BUSY_TIMEOUT};
pub use schema::{ensure_schema, on_version_change, SCHEMA_VERSION};
pub use store::{
    Projection, ReadHandle, RecordStore, Selection, SortDirection, SortOrder, WriteHandle,
};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    InvalidConfig(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than configured {latest_supported}"
            ),
            Self::InvalidConfig(message) => write!(f, "invalid store config: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
