//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or shared in-memory connections for one store.
//! - Configure per-connection pragmas.
//!
//! # Invariants
//! - Every returned connection has the configured busy timeout.
//! - Read connections have `query_only=ON`.

use crate::db::DbResult;
use log::{debug, error};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

/// Whether a connection may mutate the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessMode {
    Read,
    Write,
}

impl AccessMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Opens one connection to `target`, which is either a file path or a
/// `file:` URI naming a shared in-memory database.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub(crate) fn open_connection(
    target: &Path,
    mode: AccessMode,
    busy_timeout: Duration,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    let conn = match Connection::open_with_flags(target, flags) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode.as_str(),
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    if let Err(err) = configure_connection(&conn, mode, busy_timeout) {
        error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code=db_configure_failed error={}",
            mode.as_str(),
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err);
    }

    debug!(
        "event=db_open module=db status=ok mode={} duration_ms={}",
        mode.as_str(),
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn configure_connection(conn: &Connection, mode: AccessMode, busy_timeout: Duration) -> DbResult<()> {
    conn.busy_timeout(busy_timeout)?;
    if mode == AccessMode::Read {
        conn.execute_batch("PRAGMA query_only = ON;")?;
    }
    Ok(())
}
