// crates/warden-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Storage Connector
// Description: StorageConnector backed by one SQLite table per container.
// Purpose: Provide the relational backend with the same contract as the
//          flat-file connectors.
// Dependencies: rusqlite, serde, tracing, warden-store-core
// ============================================================================

//! ## Overview
//! Every container maps to a table named `<prefix><container>`. ID-bearing
//! tables declare `id INTEGER PRIMARY KEY`; log tables rely on the implicit
//! `rowid`. Conditions compile to parameterised `WHERE` clauses (see
//! [`crate::sql`]); whatever cannot be compiled exactly is re-checked on the
//! decoded rows. Multi-row writes run inside one transaction and address
//! rows by `rowid` after the scan.
//!
//! ID allocation uses `MAX(id) + 1`, so the highest ID is handed out again
//! after its row is deleted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use tracing::debug;
use warden_store_core::BackendKind;
use warden_store_core::Condition;
use warden_store_core::Container;
use warden_store_core::ID_COLUMN;
use warden_store_core::Row;
use warden_store_core::StorageConnector;
use warden_store_core::StorageError;
use warden_store_core::StoredValue;
use warden_store_core::condition::matches_all;
use warden_store_core::connector::incremented;
use warden_store_core::connector::successor_id;
use warden_store_core::connector::validate_conditions;
use warden_store_core::connector::validate_id;
use warden_store_core::connector::validate_increment;
use warden_store_core::connector::validate_insert;
use warden_store_core::connector::validate_unique_guard;
use warden_store_core::connector::validate_write;

use crate::sql::Filter;
use crate::sql::bind_value;
use crate::sql::column_list;
use crate::sql::compile;
use crate::sql::create_table;
use crate::sql::is_valid_prefix;
use crate::sql::quote;
use crate::sql::read_value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default table name prefix.
pub const DEFAULT_TABLE_PREFIX: &str = "warden_";
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` connector.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `table_prefix` holds only ASCII alphanumerics and underscores.
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteConnectorConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Prefix prepended to every table name.
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteConnectorConfig {
    /// Builds a configuration for `path` with default settings.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table_prefix: default_table_prefix(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default table prefix.
fn default_table_prefix() -> String {
    DEFAULT_TABLE_PREFIX.to_string()
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Connector
// ============================================================================

/// `SQLite`-backed storage connector.
pub struct SqliteConnector {
    /// Shared connection; every statement runs under this lock.
    connection: Mutex<Connection>,
    /// Configuration the connector was opened with.
    config: SqliteConnectorConfig,
}

/// A decoded row together with its `rowid`.
type RowEntry = (i64, Row);

impl SqliteConnector {
    /// Opens (or creates) the database described by `config`.
    ///
    /// Tables are not created here; use
    /// [`StorageConnector::create_data_container`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for an unsafe path or table
    /// prefix, [`StorageError::Io`] when the parent directory cannot be
    /// created, and [`StorageError::Backend`] when `SQLite` fails to open.
    pub fn open(config: SqliteConnectorConfig) -> Result<Self, StorageError> {
        if !is_valid_prefix(&config.table_prefix) {
            return Err(StorageError::InvalidArgument(format!(
                "table prefix '{}' must be ASCII alphanumeric or underscore",
                config.table_prefix
            )));
        }
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(&config)?;
        debug!(path = %config.path.display(), prefix = %config.table_prefix, "opened sqlite storage");
        Ok(Self {
            connection: Mutex::new(connection),
            config,
        })
    }

    /// Returns the database path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Returns the table name prefix.
    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.config.table_prefix
    }

    /// Acquires the connection lock.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.connection
            .lock()
            .map_err(|_| StorageError::Backend("sqlite connection mutex poisoned".to_string()))
    }

    /// Returns the quoted table name of a container.
    fn table(&self, container: Container) -> String {
        quote(&container.table_name(&self.config.table_prefix))
    }

    /// Scans a container for rows matching `conditions`.
    fn scan(
        &self,
        connection: &Connection,
        container: Container,
        conditions: &[Condition],
        limit: Option<usize>,
    ) -> Result<Vec<RowEntry>, StorageError> {
        let filter = compile(container, conditions)?;
        fetch_rows(connection, &self.table(container), container, &filter, limit)
    }

    /// Returns `MAX(id) + 1` for the ID space of a container.
    fn next_id_locked(&self, connection: &Connection, container: Container) -> Result<i64, StorageError> {
        let space = container.id_space();
        let sql = format!("SELECT COALESCE(MAX({}), 0) FROM {}", quote(ID_COLUMN), self.table(space));
        let max: i64 = connection.query_row(&sql, params![], |row| row.get(0)).map_err(db_error)?;
        successor_id(space, max)
    }

    /// Inserts a row in one transaction, skipping it when a row matches a
    /// non-empty `guard`.
    fn insert_guarded(
        &self,
        container: Container,
        row: &Row,
        guard: &[Condition],
    ) -> Result<Option<i64>, StorageError> {
        let explicit = validate_insert(container, row)?;
        let mut connection = self.lock()?;
        let tx = connection.transaction().map_err(db_error)?;
        if !guard.is_empty() && !self.scan(&tx, container, guard, Some(1))?.is_empty() {
            return Ok(None);
        }
        let table = self.table(container);
        let id = if container.has_id() {
            let id = match explicit {
                Some(id) => id,
                None => self.next_id_locked(&tx, container)?,
            };
            let taken_sql = format!("SELECT 1 FROM {table} WHERE {} = ?", quote(ID_COLUMN));
            let taken: Option<i64> =
                tx.query_row(&taken_sql, params![id], |row| row.get(0)).optional().map_err(db_error)?;
            if taken.is_some() {
                return Err(StorageError::InvalidArgument(format!("{container} id {id} is already taken")));
            }
            Some(id)
        } else {
            None
        };
        let mut names = Vec::new();
        let mut values = Vec::new();
        if let Some(id) = id {
            names.push(quote(ID_COLUMN));
            values.push(SqlValue::Integer(id));
        }
        for column in container.columns() {
            if column.name == ID_COLUMN {
                continue;
            }
            if let Some(value) = row.get(column.name) {
                names.push(quote(column.name));
                values.push(bind_value(column, Some(value))?);
            }
        }
        let sql = if names.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            let placeholders = vec!["?"; names.len()].join(", ");
            format!("INSERT INTO {table} ({}) VALUES ({placeholders})", names.join(", "))
        };
        tx.execute(&sql, params_from_iter(values.iter())).map_err(db_error)?;
        tx.commit().map_err(db_error)?;
        Ok(id)
    }
}

impl StorageConnector for SqliteConnector {
    fn backend(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn select(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Option<StoredValue>, StorageError> {
        container.require_column(column)?;
        let connection = self.lock()?;
        let rows = self.scan(&connection, container, conditions, Some(1))?;
        Ok(rows.into_iter().next().and_then(|(_, mut row)| row.remove(column)))
    }

    fn count(&self, container: Container, conditions: &[Condition]) -> Result<usize, StorageError> {
        let filter = compile(container, conditions)?;
        let connection = self.lock()?;
        let table = self.table(container);
        if filter.residual.is_empty() {
            let sql = format!("SELECT COUNT(*) FROM {table}{}", filter.where_sql());
            let count: i64 = connection
                .query_row(&sql, params_from_iter(filter.params.iter()), |row| row.get(0))
                .map_err(db_error)?;
            return usize::try_from(count)
                .map_err(|_| StorageError::Corrupt(format!("negative row count in {container}")));
        }
        Ok(fetch_rows(&connection, &table, container, &filter, None)?.len())
    }

    fn update(
        &self,
        container: Container,
        column: &str,
        value: Option<StoredValue>,
        conditions: &[Condition],
    ) -> Result<usize, StorageError> {
        validate_write(container, column, value.as_ref())?;
        let spec = container.require_column(column)?;
        let bound = bind_value(spec, value.as_ref())?;
        let mut connection = self.lock()?;
        let tx = connection.transaction().map_err(db_error)?;
        let rows = self.scan(&tx, container, conditions, None)?;
        {
            let sql = format!("UPDATE {} SET {} = ? WHERE rowid = ?", self.table(container), quote(column));
            let mut statement = tx.prepare(&sql).map_err(db_error)?;
            for (rowid, _) in &rows {
                statement.execute(params![bound, rowid]).map_err(db_error)?;
            }
        }
        tx.commit().map_err(db_error)?;
        Ok(rows.len())
    }

    fn delete(&self, container: Container, conditions: &[Condition]) -> Result<usize, StorageError> {
        validate_conditions(container, conditions)?;
        let mut connection = self.lock()?;
        let tx = connection.transaction().map_err(db_error)?;
        let rows = self.scan(&tx, container, conditions, None)?;
        {
            let sql = format!("DELETE FROM {} WHERE rowid = ?", self.table(container));
            let mut statement = tx.prepare(&sql).map_err(db_error)?;
            for (rowid, _) in &rows {
                statement.execute(params![rowid]).map_err(db_error)?;
            }
        }
        tx.commit().map_err(db_error)?;
        Ok(rows.len())
    }

    fn column_values(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Vec<StoredValue>, StorageError> {
        container.require_column(column)?;
        let connection = self.lock()?;
        let rows = self.scan(&connection, container, conditions, None)?;
        Ok(rows.into_iter().filter_map(|(_, mut row)| row.remove(column)).collect())
    }

    fn row_values(
        &self,
        container: Container,
        id: i64,
    ) -> Result<Option<Vec<Option<StoredValue>>>, StorageError> {
        container.require_id_column()?;
        let connection = self.lock()?;
        let rows = self.scan(&connection, container, &[Condition::equal(ID_COLUMN, id)], Some(1))?;
        Ok(rows.into_iter().next().map(|(_, mut row)| {
            let mut values: Vec<Option<StoredValue>> =
                container.columns().iter().map(|column| row.remove(column.name)).collect();
            if let Some(first) = values.first_mut() {
                *first = Some(StoredValue::from(id));
            }
            values
        }))
    }

    fn select_rows(&self, container: Container, conditions: &[Condition]) -> Result<Vec<Row>, StorageError> {
        let connection = self.lock()?;
        let rows = self.scan(&connection, container, conditions, None)?;
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    fn insert(&self, container: Container, row: Row) -> Result<Option<i64>, StorageError> {
        self.insert_guarded(container, &row, &[])
    }

    fn insert_unique(&self, container: Container, row: Row, guard: &[Condition]) -> Result<Option<i64>, StorageError> {
        validate_unique_guard(container, guard)?;
        self.insert_guarded(container, &row, guard)
    }

    fn increment(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Option<StoredValue>, StorageError> {
        validate_increment(container, column)?;
        let spec = container.require_column(column)?;
        let mut connection = self.lock()?;
        let tx = connection.transaction().map_err(db_error)?;
        let Some((rowid, row)) = self.scan(&tx, container, conditions, Some(1))?.into_iter().next() else {
            return Ok(None);
        };
        let next = incremented(container, column, row.get(column))?;
        let bound = bind_value(spec, Some(&next))?;
        let sql = format!("UPDATE {} SET {} = ? WHERE rowid = ?", self.table(container), quote(column));
        tx.execute(&sql, params![bound, rowid]).map_err(db_error)?;
        tx.commit().map_err(db_error)?;
        Ok(Some(next))
    }

    fn ids(&self, container: Container) -> Result<Vec<i64>, StorageError> {
        container.require_id_column()?;
        let connection = self.lock()?;
        let id = quote(ID_COLUMN);
        let sql = format!("SELECT {id} FROM {} ORDER BY {id}", self.table(container));
        let mut statement = connection.prepare(&sql).map_err(db_error)?;
        let ids = statement.query_map(params![], |row| row.get::<_, i64>(0)).map_err(db_error)?;
        ids.collect::<Result<Vec<_>, _>>().map_err(db_error)
    }

    fn next_id(&self, container: Container) -> Result<i64, StorageError> {
        container.require_id_column()?;
        let connection = self.lock()?;
        self.next_id_locked(&connection, container)
    }

    fn remove_entry(&self, container: Container, id: i64) -> Result<bool, StorageError> {
        Ok(self.remove_entries(container, &[id])? > 0)
    }

    fn remove_entries(&self, container: Container, ids: &[i64]) -> Result<usize, StorageError> {
        container.require_id_column()?;
        let mut connection = self.lock()?;
        let tx = connection.transaction().map_err(db_error)?;
        let mut removed = 0;
        {
            let sql = format!("DELETE FROM {} WHERE {} = ?", self.table(container), quote(ID_COLUMN));
            let mut statement = tx.prepare(&sql).map_err(db_error)?;
            for id in ids {
                removed += statement.execute(params![id]).map_err(db_error)?;
            }
        }
        tx.commit().map_err(db_error)?;
        Ok(removed)
    }

    fn set_data(
        &self,
        container: Container,
        column: &str,
        id: i64,
        value: Option<StoredValue>,
    ) -> Result<(), StorageError> {
        container.require_id_column()?;
        validate_write(container, column, value.as_ref())?;
        validate_id(container, id)?;
        let spec = container.require_column(column)?;
        let bound = bind_value(spec, value.as_ref())?;
        let id_column = quote(ID_COLUMN);
        let column = quote(column);
        let sql = format!(
            "INSERT INTO {} ({id_column}, {column}) VALUES (?, ?) ON CONFLICT({id_column}) DO UPDATE \
             SET {column} = excluded.{column}",
            self.table(container)
        );
        let connection = self.lock()?;
        connection.execute(&sql, params![id, bound]).map_err(db_error)?;
        Ok(())
    }

    fn missing_data_containers(&self) -> Result<Vec<Container>, StorageError> {
        let connection = self.lock()?;
        let mut statement =
            connection.prepare("SELECT name FROM sqlite_master WHERE type = 'table'").map_err(db_error)?;
        let names = statement
            .query_map(params![], |row| row.get::<_, String>(0))
            .map_err(db_error)?
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(db_error)?;
        Ok(Container::ALL
            .into_iter()
            .filter(|container| !names.contains(&container.table_name(&self.config.table_prefix)))
            .collect())
    }

    fn create_data_container(&self, container: Container) -> Result<(), StorageError> {
        let table = container.table_name(&self.config.table_prefix);
        let connection = self.lock()?;
        connection.execute_batch(&create_table(container, &table)).map_err(db_error)?;
        debug!(container = container.name(), table = %table, "created sqlite table");
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        if self.config.journal_mode != SqliteJournalMode::Wal {
            return Ok(());
        }
        let connection = self.lock()?;
        connection.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);").map_err(db_error)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a `rusqlite` error into a backend error.
fn db_error(err: rusqlite::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// Runs a compiled filter against a table and decodes every surviving row.
fn fetch_rows(
    connection: &Connection,
    table: &str,
    container: Container,
    filter: &Filter,
    limit: Option<usize>,
) -> Result<Vec<RowEntry>, StorageError> {
    let mut sql = format!("SELECT rowid, {} FROM {table}{} ORDER BY rowid", column_list(container), filter.where_sql());
    if filter.residual.is_empty()
        && let Some(limit) = limit
    {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    let width = container.columns().len();
    let mut statement = connection.prepare(&sql).map_err(db_error)?;
    let raw = statement
        .query_map(params_from_iter(filter.params.iter()), |row| {
            let rowid: i64 = row.get(0)?;
            let mut values = Vec::with_capacity(width);
            for index in 0..width {
                values.push(row.get::<_, SqlValue>(index + 1)?);
            }
            Ok((rowid, values))
        })
        .map_err(db_error)?;
    let mut rows = Vec::new();
    for entry in raw {
        let (rowid, values) = entry.map_err(db_error)?;
        let row = decode_row(container, &values)?;
        if matches_all(&filter.residual, |column| row.get(column).cloned()) {
            rows.push((rowid, row));
            if limit.is_some_and(|limit| rows.len() >= limit) {
                break;
            }
        }
    }
    Ok(rows)
}

/// Decodes raw column values in schema order into a row.
fn decode_row(container: Container, values: &[SqlValue]) -> Result<Row, StorageError> {
    let mut row = Row::new();
    for (column, value) in container.columns().iter().zip(values) {
        if let Some(decoded) = read_value(column, ValueRef::from(value))? {
            row.insert(column.name.to_string(), decoded);
        }
    }
    Ok(row)
}

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
    let Some(parent) = path.parent() else {
        return Err(StorageError::Io("database path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| StorageError::Io(err.to_string()))
}

/// Validates database paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), StorageError> {
    if path.as_os_str().is_empty() {
        return Err(StorageError::InvalidArgument("database path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(StorageError::InvalidArgument("database path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(StorageError::InvalidArgument(
                "database path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(StorageError::InvalidArgument(
            "database path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteConnectorConfig) -> Result<Connection, StorageError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas for durability and lock waits.
fn apply_pragmas(connection: &Connection, config: &SqliteConnectorConfig) -> Result<(), StorageError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
