//! Core data-access layer for the shelter record store.
//! This crate is the single source of truth for record invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod provider;

pub use db::{
    DbError, DbResult, Projection, RecordStore, Selection, SortDirection, SortOrder, StoreConfig,
    StoreLocation, SCHEMA_VERSION,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contract::is_valid_classifier;
pub use model::record::{
    Classifier, Column, FieldValue, Record, RecordDataError, RecordRow, RecordValues,
};
pub use provider::{
    ChangeNotifier, ChangeObserver, Identifier, ProviderError, ProviderResult, RecordCursor,
    RecordProvider, ResourceId, SubscriptionHandle, UriMatcher,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
