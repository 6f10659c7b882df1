//! Table creation and version policy.
//!
//! # Responsibility
//! - Create the `records` table when it is absent.
//! - Rebuild the table from scratch whenever the schema version increases.
//!
//! # Invariants
//! - Applied version is mirrored to `PRAGMA user_version`.
//! - Upgrades never migrate rows: the store is a disposable cache, not a
//!   system of record, so a version bump drops every existing row.
//! - Downgrades are refused.

use crate::db::{DbError, DbResult};
use crate::model::contract::TABLE_NAME;
use log::{info, warn};
use rusqlite::Connection;

/// Schema version known by this binary.
pub const SCHEMA_VERSION: u32 = 1;

const CREATE_RECORDS_SQL: &str = "CREATE TABLE IF NOT EXISTS records (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT    NOT NULL,
    category   TEXT,
    classifier INTEGER NOT NULL,
    measure    INTEGER NOT NULL DEFAULT 0
);";

/// Creates the `records` table if it does not exist yet.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(CREATE_RECORDS_SQL)?;
    Ok(())
}

/// Drops the `records` table unconditionally and recreates it empty.
///
/// # Side effects
/// - Every persisted row is lost.
pub fn on_version_change(conn: &Connection, old_version: u32, new_version: u32) -> DbResult<()> {
    warn!(
        "event=schema_rebuild module=db status=start old_version={} new_version={}",
        old_version, new_version
    );
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {TABLE_NAME};"))?;
    ensure_schema(conn)?;
    Ok(())
}

/// Brings the connection's schema to `target` and records the version.
pub(crate) fn apply_version_policy(conn: &mut Connection, target: u32) -> DbResult<()> {
    if target == 0 {
        return Err(DbError::InvalidConfig(
            "schema version must be at least 1".to_string(),
        ));
    }

    let current = current_user_version(conn)?;
    if current > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: target,
        });
    }

    let tx = conn.transaction()?;
    if current == 0 {
        ensure_schema(&tx)?;
        info!(
            "event=schema_create module=db status=ok version={}",
            target
        );
    } else if current < target {
        on_version_change(&tx, current, target)?;
    } else {
        ensure_schema(&tx)?;
    }
    if current != target {
        tx.execute_batch(&format!("PRAGMA user_version = {target};"))?;
    }
    tx.commit()?;

    Ok(())
}

pub(crate) fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
