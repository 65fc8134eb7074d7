// crates/warden-store-core/src/connector.rs
// ============================================================================
// Module: Warden Store Connector Contract
// Description: CRUD and query surface implemented by every backend.
// Purpose: Let callers use YAML, JSON, and SQLite storage interchangeably.
// Dependencies: serde, crate::{condition, error, numeric, schema, value}
// ============================================================================

//! ## Overview
//! [`StorageConnector`] is the object-safe contract every backend implements
//! identically. Operations take a [`Container`] plus zero or more
//! [`Condition`]s combined with logical AND. ID-addressed operations reject
//! append-only containers with [`StorageError::InvalidArgument`] before any
//! I/O. Calls run to completion on the calling thread; implementations must
//! be safe to share across threads.
//!
//! [`ConnectorExt`] adds typed reads on top of the contract for any
//! connector, including `dyn StorageConnector`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;
use serde::Deserialize;
use serde::Serialize;

use crate::condition::Condition;
use crate::error::StorageError;
use crate::numeric::FieldValue;
use crate::numeric::coerce;
use crate::schema::ColumnKind;
use crate::schema::Container;
use crate::value::Row;
use crate::value::StoredValue;

// ============================================================================
// SECTION: Backend Kinds
// ============================================================================

/// Storage backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Hierarchical YAML configuration files.
    #[default]
    Yaml,
    /// JSON documents with an ID counter.
    Json,
    /// Embedded `SQLite` database.
    Sqlite,
}

impl BackendKind {
    /// Every backend, in selection order.
    pub const ALL: [Self; 3] = [Self::Yaml, Self::Json, Self::Sqlite];

    /// Returns a stable label for the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }

    /// Returns true for flat-file backends.
    #[must_use]
    pub const fn is_file_backed(self) -> bool {
        matches!(self, Self::Yaml | Self::Json)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = StorageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| StorageError::InvalidArgument(format!("unknown backend '{value}'")))
    }
}

// ============================================================================
// SECTION: Contract
// ============================================================================

/// Uniform CRUD and query surface over a storage backend.
pub trait StorageConnector: Send + Sync {
    /// Returns the backend kind of this connector.
    fn backend(&self) -> BackendKind;

    /// Returns `column` of the first row matching `conditions`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the column is unknown or the backend fails.
    fn select(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Option<StoredValue>, StorageError>;

    /// Counts rows matching `conditions`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    fn count(&self, container: Container, conditions: &[Condition]) -> Result<usize, StorageError>;

    /// Writes `value` into `column` for every matching row.
    ///
    /// `None` clears the column. Returns the number of rows touched. Rows
    /// updated before a failure stay updated.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the column is unknown or immutable, or
    /// the backend fails.
    fn update(
        &self,
        container: Container,
        column: &str,
        value: Option<StoredValue>,
        conditions: &[Condition],
    ) -> Result<usize, StorageError>;

    /// Removes every matching row and returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    fn delete(&self, container: Container, conditions: &[Condition]) -> Result<usize, StorageError>;

    /// Returns `column` across every matching row that has a value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the column is unknown or the backend fails.
    fn column_values(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Vec<StoredValue>, StorageError>;

    /// Returns every declared column of the row with `id`, in schema order.
    ///
    /// Position 0 always holds the ID.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for containers without IDs.
    fn row_values(
        &self,
        container: Container,
        id: i64,
    ) -> Result<Option<Vec<Option<StoredValue>>>, StorageError>;

    /// Returns every matching row keyed by logical column name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    fn select_rows(&self, container: Container, conditions: &[Condition]) -> Result<Vec<Row>, StorageError>;

    /// Inserts a row and returns its ID for ID-bearing containers.
    ///
    /// When the row carries an `id` it is used as-is; otherwise the next ID
    /// is allocated. Append-only containers return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when a column is unknown, the ID is taken,
    /// or the backend fails.
    fn insert(&self, container: Container, row: Row) -> Result<Option<i64>, StorageError>;

    /// Inserts a row unless a row matching `guard` already exists.
    ///
    /// The check and the insert happen under one lock or transaction.
    /// Returns the new row's ID, or `None` when a guarded row exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for containers without IDs,
    /// an empty guard, or anything [`StorageConnector::insert`] rejects.
    fn insert_unique(&self, container: Container, row: Row, guard: &[Condition]) -> Result<Option<i64>, StorageError>;

    /// Adds one to `column` of the first matching row and returns the new value.
    ///
    /// An absent value counts as zero. The read and the write happen under
    /// one lock or transaction. Returns `None` when no row matches.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for non-integer or ID
    /// columns and when the result overflows the column, and
    /// [`StorageError::Corrupt`] when the stored value is not an integer.
    fn increment(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Option<StoredValue>, StorageError>;

    /// Returns every row ID in the container.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for containers without IDs.
    fn ids(&self, container: Container) -> Result<Vec<i64>, StorageError>;

    /// Returns the ID the next insert would allocate.
    ///
    /// Containers sharing another container's ID space delegate to it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for containers without IDs.
    fn next_id(&self, container: Container) -> Result<i64, StorageError>;

    /// Removes the row with `id`, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for containers without IDs.
    fn remove_entry(&self, container: Container, id: i64) -> Result<bool, StorageError>;

    /// Removes many rows, persisting once at the end.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for containers without IDs.
    fn remove_entries(&self, container: Container, ids: &[i64]) -> Result<usize, StorageError> {
        let mut removed = 0;
        for id in ids {
            if self.remove_entry(container, *id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Ensures no later allocation hands out an ID at or below `highest`.
    ///
    /// Backends that derive the next ID from stored rows have nothing to
    /// record; counter-based backends raise their counter.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for containers without IDs.
    fn reserve_ids(&self, container: Container, _highest: i64) -> Result<(), StorageError> {
        container.require_id_column()?;
        Ok(())
    }

    /// Writes `column` of the row with `id`, creating the row when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for containers without IDs,
    /// unknown columns, or the ID column itself.
    fn set_data(
        &self,
        container: Container,
        column: &str,
        id: i64,
        value: Option<StoredValue>,
    ) -> Result<(), StorageError>;

    /// Lists containers whose backing store does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend cannot be inspected.
    fn missing_data_containers(&self) -> Result<Vec<Container>, StorageError>;

    /// Creates the backing store for a container.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot be created.
    fn create_data_container(&self, container: Container) -> Result<(), StorageError>;

    /// Persists all buffered state.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when persisting fails.
    fn flush(&self) -> Result<(), StorageError>;
}

// ============================================================================
// SECTION: Argument Validation
// ============================================================================

/// Validates every column referenced by a condition list.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for unknown columns.
pub fn validate_conditions(container: Container, conditions: &[Condition]) -> Result<(), StorageError> {
    for condition in conditions {
        container.require_column(&condition.column)?;
    }
    Ok(())
}

/// Validates a column that is about to be written.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for unknown or ID columns.
pub fn validate_writable_column(container: Container, column: &str) -> Result<(), StorageError> {
    container.require_column(column)?;
    if container.id_column() == Some(column) {
        return Err(StorageError::InvalidArgument(format!(
            "id column of {container} is immutable"
        )));
    }
    Ok(())
}

/// Validates a column write: the column must be writable and the value,
/// when present, must fit it.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for unknown or ID columns and
/// out-of-range values.
pub fn validate_write(
    container: Container,
    column: &str,
    value: Option<&StoredValue>,
) -> Result<(), StorageError> {
    validate_writable_column(container, column)?;
    value.map_or(Ok(()), |value| validate_value(container, column, value))
}

/// Validates a value against the declared kind of its column.
///
/// Integer kinds require an integral number within the column width.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for unknown columns or values
/// the column cannot hold.
pub fn validate_value(container: Container, column: &str, value: &StoredValue) -> Result<(), StorageError> {
    let spec = container.require_column(column)?;
    let accepted = match (spec.kind, value) {
        (ColumnKind::Text, StoredValue::Text(_))
        | (ColumnKind::Boolean, StoredValue::Bool(_)) => true,
        (ColumnKind::SmallInt, StoredValue::Number(number)) => fits_integer::<i16>(number),
        (ColumnKind::Integer, StoredValue::Number(number)) => fits_integer::<i32>(number),
        (ColumnKind::BigInt, StoredValue::Number(number)) => fits_integer::<i64>(number),
        _ => false,
    };
    if accepted {
        Ok(())
    } else {
        Err(StorageError::InvalidArgument(format!(
            "{} value {value} is out of range for {container}.{column}",
            value.kind_label()
        )))
    }
}

/// Returns true when the decimal is integral and fits `T`.
fn fits_integer<T: TryFrom<i64>>(number: &BigDecimal) -> bool {
    number.is_integer() && number.to_i64().is_some_and(|wide| T::try_from(wide).is_ok())
}

/// Validates a row about to be inserted and extracts its explicit ID.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for unknown columns, values
/// out of range, IDs on append-only containers, or non-positive IDs.
pub fn validate_insert(container: Container, row: &Row) -> Result<Option<i64>, StorageError> {
    for (column, value) in row {
        validate_value(container, column, value)?;
    }
    let Some(id_column) = container.id_column() else {
        return Ok(None);
    };
    let Some(value) = row.get(id_column) else {
        return Ok(None);
    };
    let id = i64::from_stored(value.clone())
        .map_err(|_| StorageError::InvalidArgument(format!("{container} id must be an integer")))?;
    validate_id(container, id)?;
    Ok(Some(id))
}

/// Validates a row ID against the width of the container's ID column.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for containers without IDs and
/// for IDs that are not positive or do not fit the column.
pub fn validate_id(container: Container, id: i64) -> Result<(), StorageError> {
    let id_column = container.require_id_column()?;
    if id < 1 {
        return Err(StorageError::InvalidArgument(format!("{container} id must be positive")));
    }
    let fits = match container.column(id_column).map(|spec| spec.kind) {
        Some(ColumnKind::SmallInt) => i16::try_from(id).is_ok(),
        Some(ColumnKind::Integer) => i32::try_from(id).is_ok(),
        _ => true,
    };
    if !fits {
        return Err(StorageError::InvalidArgument(format!(
            "{container} id {id} is out of range for its id column"
        )));
    }
    Ok(())
}

/// Returns the key following `highest`.
///
/// For ID-bearing containers the result must also fit the ID column.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] when the key space is exhausted.
pub fn successor_id(container: Container, highest: i64) -> Result<i64, StorageError> {
    highest
        .max(0)
        .checked_add(1)
        .filter(|next| !container.has_id() || validate_id(container, *next).is_ok())
        .ok_or_else(|| StorageError::InvalidArgument(format!("id space of {container} is exhausted")))
}

/// Validates the target and guard of a unique insert.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for containers without IDs,
/// an empty guard, or unknown guard columns.
pub fn validate_unique_guard(container: Container, guard: &[Condition]) -> Result<(), StorageError> {
    container.require_id_column()?;
    if guard.is_empty() {
        return Err(StorageError::InvalidArgument(format!(
            "unique insert into {container} needs at least one guard condition"
        )));
    }
    validate_conditions(container, guard)
}

/// Validates that a column can be incremented.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for unknown, ID, or non-integer
/// columns.
pub fn validate_increment(container: Container, column: &str) -> Result<(), StorageError> {
    validate_writable_column(container, column)?;
    let spec = container.require_column(column)?;
    if !matches!(spec.kind, ColumnKind::SmallInt | ColumnKind::Integer | ColumnKind::BigInt) {
        return Err(StorageError::InvalidArgument(format!(
            "{container}.{column} is not an integer column"
        )));
    }
    Ok(())
}

/// Returns `current + 1`, treating an absent value as zero.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] when the stored value is not an
/// integer and [`StorageError::InvalidArgument`] when the result does not
/// fit the column.
pub fn incremented(
    container: Container,
    column: &str,
    current: Option<&StoredValue>,
) -> Result<StoredValue, StorageError> {
    let base = match current {
        None => BigDecimal::from(0),
        Some(StoredValue::Number(number)) if number.is_integer() => number.clone(),
        Some(other) => {
            return Err(StorageError::Corrupt(format!(
                "{container}.{column} holds {} {other}, not an integer",
                other.kind_label()
            )));
        }
    };
    let next = StoredValue::Number(base + BigDecimal::from(1));
    validate_value(container, column, &next)?;
    Ok(next)
}

// ============================================================================
// SECTION: Typed Extension
// ============================================================================

/// Typed read helpers available on every connector.
pub trait ConnectorExt: StorageConnector {
    /// Reads `column` of the first matching row as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the read fails or the value cannot be
    /// coerced.
    fn select_as<T: FieldValue>(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Option<T>, StorageError> {
        coerce(self.select(container, column, conditions)?)
    }

    /// Reads `column` across matching rows as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the read fails or a value cannot be
    /// coerced.
    fn column_values_as<T: FieldValue>(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Vec<T>, StorageError> {
        self.column_values(container, column, conditions)?.into_iter().map(T::from_stored).collect()
    }

    /// Returns true when at least one row matches.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    fn exists(&self, container: Container, conditions: &[Condition]) -> Result<bool, StorageError> {
        match container.id_column() {
            Some(id_column) => Ok(self.select(container, id_column, conditions)?.is_some()),
            None => Ok(self.count(container, conditions)? > 0),
        }
    }
}

impl<C: StorageConnector + ?Sized> ConnectorExt for C {}
