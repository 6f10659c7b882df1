//! Record store handle and raw row primitives.
//!
//! # Responsibility
//! - Own the database location and run the version policy once on open.
//! - Hand out short-lived read/write connection handles.
//! - Translate typed selections/projections into SQL against `records`.
//!
//! # Invariants
//! - Handles borrow the store, so a memory database outlives every handle.
//! - On a memory store at most one handle is live at a time; file stores
//!   leave reader/writer coordination to SQLite locking and `busy_timeout`.
//! - Read handles cannot mutate (`query_only`).
//! - `insert_row` yields exactly one new id or an error.

use crate::db::config::{StoreConfig, StoreLocation};
use crate::db::open::{open_connection, AccessMode};
use crate::db::schema::{apply_version_policy, current_user_version};
use crate::db::DbResult;
use crate::model::contract::TABLE_NAME;
use crate::model::record::{Column, FieldValue, RecordRow, RecordValues};
use log::{debug, error, info};
use rusqlite::{params_from_iter, Connection};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Conjunction of column-equality clauses.
///
/// A `Null` value matches with `IS NULL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    clauses: Vec<(Column, FieldValue)>,
}

impl Selection {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: i64) -> Self {
        Self::all().and_eq(Column::Id, id)
    }

    pub fn and_eq(mut self, column: Column, value: impl Into<FieldValue>) -> Self {
        self.clauses.push((column, value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[(Column, FieldValue)] {
        &self.clauses
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        let terms = self
            .clauses
            .iter()
            .map(|(column, value)| match value {
                FieldValue::Null => format!("{column} IS NULL"),
                _ => format!("{column} = ?"),
            })
            .collect::<Vec<_>>();
        format!(" WHERE {}", terms.join(" AND "))
    }

    fn bind_values(&self) -> impl Iterator<Item = &FieldValue> {
        self.clauses
            .iter()
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordered list of sort keys. Empty means ascending by `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    keys: Vec<(Column, SortDirection)>,
}

impl SortOrder {
    pub fn ascending(column: Column) -> Self {
        Self::default().then(column, SortDirection::Ascending)
    }

    pub fn descending(column: Column) -> Self {
        Self::default().then(column, SortDirection::Descending)
    }

    pub fn then(mut self, column: Column, direction: SortDirection) -> Self {
        self.keys.push((column, direction));
        self
    }

    fn order_sql(&self) -> String {
        if self.keys.is_empty() {
            return " ORDER BY id ASC".to_string();
        }
        let keys = self
            .keys
            .iter()
            .map(|(column, direction)| match direction {
                SortDirection::Ascending => format!("{column} ASC"),
                SortDirection::Descending => format!("{column} DESC"),
            })
            .collect::<Vec<_>>();
        format!(" ORDER BY {}", keys.join(", "))
    }
}

/// Columns returned by a query. Empty means every column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    columns: Vec<Column>,
}

impl Projection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of(columns: &[Column]) -> Self {
        let mut unique = Vec::with_capacity(columns.len());
        for column in columns {
            if !unique.contains(column) {
                unique.push(*column);
            }
        }
        Self { columns: unique }
    }

    pub fn columns(&self) -> &[Column] {
        if self.columns.is_empty() {
            &Column::ALL
        } else {
            &self.columns
        }
    }
}

/// Owner of one SQLite-backed `records` table.
pub struct RecordStore {
    target: PathBuf,
    busy_timeout: Duration,
    schema_version: u32,
    // Memory stores only: keeps the shared-cache database alive, and its lock
    // is the turn every handle holds.
    keeper: Option<Mutex<Connection>>,
}

impl RecordStore {
    /// Opens the store and applies the version policy.
    ///
    /// # Errors
    /// - `DbError::UnsupportedSchemaVersion` when the file is newer than
    ///   `config.schema_version`.
    /// - `DbError::Sqlite` when the file cannot be opened or prepared.
    pub fn open(config: StoreConfig) -> DbResult<Self> {
        let started_at = Instant::now();
        let (target, mode) = match &config.location {
            StoreLocation::File(path) => (path.clone(), "file"),
            StoreLocation::Memory => (
                PathBuf::from(format!(
                    "file:shelter-{}?mode=memory&cache=shared",
                    Uuid::new_v4().simple()
                )),
                "memory",
            ),
        };
        info!("event=store_open module=db status=start mode={mode}");

        let mut conn = open_connection(&target, AccessMode::Write, config.busy_timeout)?;
        if let Err(err) = apply_version_policy(&mut conn, config.schema_version) {
            error!(
                "event=store_open module=db status=error mode={} duration_ms={} error_code=schema_policy_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        info!(
            "event=store_open module=db status=ok mode={} version={} duration_ms={}",
            mode,
            config.schema_version,
            started_at.elapsed().as_millis()
        );

        let keeper = match config.location {
            StoreLocation::Memory => Some(Mutex::new(conn)),
            StoreLocation::File(_) => None,
        };

        Ok(Self {
            target,
            busy_timeout: config.busy_timeout,
            schema_version: config.schema_version,
            keeper,
        })
    }

    /// Opens a private in-memory store at the current schema version.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(StoreConfig::memory())
    }

    /// Opens a file-backed store at the current schema version.
    pub fn open_file(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::open(StoreConfig::file(path))
    }

    /// Schema version this store was opened with.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Schema version currently stamped in the database.
    pub fn stored_schema_version(&self) -> DbResult<u32> {
        let handle = self.open_for_read()?;
        current_user_version(&handle.conn)
    }

    /// Re-runs the version policy against `new_version`.
    ///
    /// A higher version rebuilds the table and discards all rows.
    pub fn upgrade(&mut self, new_version: u32) -> DbResult<()> {
        let mut conn = open_connection(&self.target, AccessMode::Write, self.busy_timeout)?;
        apply_version_policy(&mut conn, new_version)?;
        self.schema_version = new_version;
        Ok(())
    }

    /// Acquires a read-only handle; released when dropped.
    ///
    /// On a memory store this blocks until no other handle is live, so a
    /// thread must not hold a second handle of the same store.
    pub fn open_for_read(&self) -> DbResult<ReadHandle<'_>> {
        let turn = self.take_turn();
        let conn = open_connection(&self.target, AccessMode::Read, self.busy_timeout)?;
        Ok(ReadHandle { conn, _turn: turn })
    }

    /// Acquires a writable handle; released when dropped.
    ///
    /// Same blocking rule as [`RecordStore::open_for_read`].
    pub fn open_for_write(&self) -> DbResult<WriteHandle<'_>> {
        let turn = self.take_turn();
        let conn = open_connection(&self.target, AccessMode::Write, self.busy_timeout)?;
        Ok(WriteHandle { conn, _turn: turn })
    }

    // Shared-cache table locks fail with SQLITE_LOCKED, which the busy
    // handler never retries, so memory-store handles run one at a time.
    fn take_turn(&self) -> Option<MutexGuard<'_, Connection>> {
        self.keeper
            .as_ref()
            .map(|keeper| keeper.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Scoped read-only connection.
pub struct ReadHandle<'store> {
    conn: Connection,
    // Dropped after `conn`.
    _turn: Option<MutexGuard<'store, Connection>>,
}

impl ReadHandle<'_> {
    pub fn query_rows(
        &self,
        projection: &Projection,
        selection: &Selection,
        sort: &SortOrder,
    ) -> DbResult<Vec<RecordRow>> {
        query_rows(&self.conn, projection, selection, sort)
    }
}

/// Scoped writable connection.
pub struct WriteHandle<'store> {
    conn: Connection,
    _turn: Option<MutexGuard<'store, Connection>>,
}

impl WriteHandle<'_> {
    /// Inserts one row and returns its store-assigned id.
    pub fn insert_row(&self, values: &RecordValues) -> DbResult<i64> {
        let sql = if values.is_empty() {
            format!("INSERT INTO {TABLE_NAME} DEFAULT VALUES;")
        } else {
            let columns = values
                .iter()
                .map(|(column, _)| column.as_str())
                .collect::<Vec<_>>();
            let placeholders = vec!["?"; columns.len()];
            format!(
                "INSERT INTO {TABLE_NAME} ({}) VALUES ({});",
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        self.conn
            .execute(&sql, params_from_iter(values.iter().map(|(_, value)| value)))?;
        let id = self.conn.last_insert_rowid();
        debug!("event=row_insert module=db status=ok id={id}");
        Ok(id)
    }

    pub fn query_rows(
        &self,
        projection: &Projection,
        selection: &Selection,
        sort: &SortOrder,
    ) -> DbResult<Vec<RecordRow>> {
        query_rows(&self.conn, projection, selection, sort)
    }

    /// Writes every present value to all matching rows.
    ///
    /// An empty payload touches nothing and returns 0.
    pub fn update_rows(&self, values: &RecordValues, selection: &Selection) -> DbResult<usize> {
        if values.is_empty() {
            return Ok(0);
        }

        let assignments = values
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>();
        let sql = format!(
            "UPDATE {TABLE_NAME} SET {}{};",
            assignments.join(", "),
            selection.where_sql()
        );
        let binds = values
            .iter()
            .map(|(_, value)| value)
            .chain(selection.bind_values());

        let changed = self.conn.execute(&sql, params_from_iter(binds))?;
        debug!("event=row_update module=db status=ok rows={changed}");
        Ok(changed)
    }

    pub fn delete_rows(&self, selection: &Selection) -> DbResult<usize> {
        let sql = format!("DELETE FROM {TABLE_NAME}{};", selection.where_sql());
        let changed = self
            .conn
            .execute(&sql, params_from_iter(selection.bind_values()))?;
        debug!("event=row_delete module=db status=ok rows={changed}");
        Ok(changed)
    }
}

fn query_rows(
    conn: &Connection,
    projection: &Projection,
    selection: &Selection,
    sort: &SortOrder,
) -> DbResult<Vec<RecordRow>> {
    let columns = projection.columns();
    let column_list = columns
        .iter()
        .map(|column| column.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {column_list} FROM {TABLE_NAME}{}{};",
        selection.where_sql(),
        sort.order_sql()
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(selection.bind_values()))?;
    let mut result = Vec::new();

    while let Some(row) = rows.next()? {
        let mut cells = BTreeMap::new();
        for (index, column) in columns.iter().enumerate() {
            cells.insert(*column, row.get::<_, FieldValue>(index)?);
        }
        result.push(RecordRow::from_cells(cells));
    }

    debug!("event=row_query module=db status=ok rows={}", result.len());
    Ok(result)
}
