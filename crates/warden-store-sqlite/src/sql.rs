// crates/warden-store-sqlite/src/sql.rs
// ============================================================================
// Module: SQLite Statement Builders
// Description: DDL, value binding, and condition compilation for SQLite.
// Purpose: Translate the container schema and filters into parameterised SQL.
// Dependencies: bigdecimal, rusqlite, warden-store-core
// ============================================================================

//! ## Overview
//! Conditions compile to `WHERE` fragments that select exactly the rows the
//! in-memory evaluator would accept:
//! - text equality is guarded by `typeof(..) = 'text'` and uses `NOCASE`,
//! - numeric comparisons are guarded to integer or real storage,
//! - `NotEqual` also accepts `NULL`.
//!
//! Anything that cannot be expressed exactly (fractional literals,
//! literals outside `i64`) is returned as a residual condition and evaluated on the
//! decoded row instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::ToPrimitive;
use rusqlite::types::Value as SqlValue;
use rusqlite::types::ValueRef;
use warden_store_core::ColumnKind;
use warden_store_core::ColumnSpec;
use warden_store_core::Condition;
use warden_store_core::Container;
use warden_store_core::Operator;
use warden_store_core::StorageError;
use warden_store_core::StoredValue;
use warden_store_core::numeric::decimal_from_f64;
use warden_store_core::numeric::decimal_from_text;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Quotes an identifier for SQL text.
#[must_use]
pub fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Returns true when a table prefix is safe to splice into identifiers.
#[must_use]
pub fn is_valid_prefix(prefix: &str) -> bool {
    prefix.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

/// Returns the SQL type for a column kind.
const fn sql_type(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Integer | ColumnKind::BigInt | ColumnKind::SmallInt | ColumnKind::Boolean => {
            "INTEGER"
        }
        ColumnKind::Text => "TEXT",
    }
}

/// Builds the `CREATE TABLE` statement for a container.
#[must_use]
pub fn create_table(container: Container, table: &str) -> String {
    let columns: Vec<String> = container
        .columns()
        .iter()
        .map(|column| {
            if container.id_column() == Some(column.name) {
                format!("{} INTEGER PRIMARY KEY", quote(column.name))
            } else {
                format!("{} {}", quote(column.name), sql_type(column.kind))
            }
        })
        .collect();
    format!("CREATE TABLE IF NOT EXISTS {} ({})", quote(table), columns.join(", "))
}

/// Returns the quoted, comma-separated column list of a container.
#[must_use]
pub fn column_list(container: Container) -> String {
    container.columns().iter().map(|column| quote(column.name)).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// SECTION: Values
// ============================================================================

/// Converts a stored value into its SQL representation for a column.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] when a number cannot be stored
/// in an integer column.
pub fn bind_value(column: &ColumnSpec, value: Option<&StoredValue>) -> Result<SqlValue, StorageError> {
    let Some(value) = value else {
        return Ok(SqlValue::Null);
    };
    Ok(match value {
        StoredValue::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        StoredValue::Text(text) => SqlValue::Text(text.clone()),
        StoredValue::Number(number) => {
            SqlValue::Integer(number.to_i64().filter(|_| number.is_integer()).ok_or_else(|| {
                StorageError::InvalidArgument(format!("{number} does not fit column {}", column.name))
            })?)
        }
    })
}

/// Decodes a SQL value read from a column.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] for blobs, invalid UTF-8, and
/// non-finite reals.
pub fn read_value(column: &ColumnSpec, value: ValueRef<'_>) -> Result<Option<StoredValue>, StorageError> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(integer) if column.kind == ColumnKind::Boolean => {
            Ok(Some(StoredValue::Bool(integer != 0)))
        }
        ValueRef::Integer(integer) => Ok(Some(StoredValue::from(integer))),
        ValueRef::Real(real) => decimal_from_f64(real)
            .map(|number| Some(StoredValue::Number(number)))
            .map_err(|_| StorageError::Corrupt(format!("non-finite value in {}", column.name))),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|err| StorageError::Corrupt(format!("{}: {err}", column.name)))?;
            if column.kind.is_numeric()
                && let Some(number) = decimal_from_text(text)
            {
                return Ok(Some(StoredValue::Number(number)));
            }
            Ok(Some(StoredValue::Text(text.to_string())))
        }
        ValueRef::Blob(_) => Err(StorageError::Corrupt(format!("unexpected blob in {}", column.name))),
    }
}

// ============================================================================
// SECTION: Conditions
// ============================================================================

/// A compiled condition list.
#[derive(Debug, Default)]
pub struct Filter {
    /// `WHERE` clause body, empty when every row passes.
    pub clause: String,
    /// Positional parameters referenced by the clause.
    pub params: Vec<SqlValue>,
    /// Conditions left for in-memory evaluation.
    pub residual: Vec<Condition>,
}

impl Filter {
    /// Returns the clause as a `WHERE ...` suffix.
    #[must_use]
    pub fn where_sql(&self) -> String {
        if self.clause.is_empty() { String::new() } else { format!(" WHERE {}", self.clause) }
    }
}

/// Compiles conditions into a filter.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for unknown columns.
pub fn compile(container: Container, conditions: &[Condition]) -> Result<Filter, StorageError> {
    let mut filter = Filter::default();
    let mut parts = Vec::new();
    for condition in conditions {
        let column = container.require_column(&condition.column)?;
        match compile_one(column, condition) {
            Some((sql, params)) => {
                parts.push(sql);
                filter.params.extend(params);
            }
            None => filter.residual.push(condition.clone()),
        }
    }
    filter.clause = parts.join(" AND ");
    Ok(filter)
}

/// A SQL fragment and its positional parameters.
type Fragment = (String, Vec<SqlValue>);

/// Fragment matching no row.
fn never() -> Fragment {
    ("0".to_string(), Vec::new())
}

/// Compiles one condition, or returns `None` when it needs in-memory evaluation.
fn compile_one(column: &ColumnSpec, condition: &Condition) -> Option<Fragment> {
    let name = quote(column.name);
    match condition.operator {
        Operator::Equal => equality(column, &name, &condition.value),
        Operator::NotEqual => {
            let (sql, params) = equality(column, &name, &condition.value)?;
            Some((format!("({name} IS NULL OR NOT {sql})"), params))
        }
        operator => {
            if !condition.value.is_numeric() || !column.kind.is_numeric() {
                return Some(never());
            }
            let literal = integer_literal(&condition.value)?;
            Some((
                format!("(typeof({name}) IN ('integer', 'real') AND {name} {} ?)", operator.sql_symbol()),
                vec![SqlValue::Integer(literal)],
            ))
        }
    }
}

/// Builds the exact equality fragment, or `None` when it needs in-memory evaluation.
fn equality(column: &ColumnSpec, name: &str, literal: &StoredValue) -> Option<Fragment> {
    match literal {
        StoredValue::Text(text) if column.kind == ColumnKind::Text => Some((
            format!("(typeof({name}) = 'text' AND {name} = ? COLLATE NOCASE)"),
            vec![SqlValue::Text(text.clone())],
        )),
        StoredValue::Bool(flag) if column.kind == ColumnKind::Boolean => {
            let test = if *flag { "<> 0" } else { "= 0" };
            Some((format!("(typeof({name}) = 'integer' AND {name} {test})"), Vec::new()))
        }
        StoredValue::Number(_) if column.kind.is_numeric() => {
            let literal = integer_literal(literal)?;
            Some((
                format!("(typeof({name}) IN ('integer', 'real') AND {name} = ?)"),
                vec![SqlValue::Integer(literal)],
            ))
        }
        _ => Some(never()),
    }
}

/// Returns an `i64` literal for integral numbers within range.
fn integer_literal(value: &StoredValue) -> Option<i64> {
    let number = value.as_decimal()?;
    if !number.is_integer() {
        return None;
    }
    number.to_i64()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test assertions use unwrap for brevity.")]

    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;

    #[test]
    fn id_tables_declare_an_integer_primary_key() {
        let ddl = create_table(Container::Kicks, "warden_kicks");
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"warden_kicks\""));
        assert!(ddl.contains("\"id\" INTEGER PRIMARY KEY"));
        assert!(ddl.contains("\"reason\" TEXT"));
        let log = create_table(Container::PublicMessages, "warden_public_messages");
        assert!(!log.contains("PRIMARY KEY"));
    }

    #[test]
    fn prefixes_are_restricted_to_identifier_bytes() {
        assert!(is_valid_prefix("warden_"));
        assert!(is_valid_prefix(""));
        assert!(!is_valid_prefix("warden\""));
        assert!(!is_valid_prefix("a b"));
    }

    #[test]
    fn text_and_numbers_compile_to_guarded_clauses() {
        let filter = compile(
            Container::Profiles,
            &[Condition::equal("player_name", "Bob"), Condition::new("last_seen", Operator::LessThan, 10_i64)],
        )
        .unwrap();
        assert!(filter.clause.contains("COLLATE NOCASE"));
        assert!(filter.clause.contains("< ?"));
        assert_eq!(filter.params.len(), 2);
        assert!(filter.residual.is_empty());
        assert!(filter.where_sql().starts_with(" WHERE "));
    }

    #[test]
    fn booleans_compile_without_parameters() {
        let filter = compile(Container::Bans, &[Condition::equal("active", true)]).unwrap();
        assert!(filter.params.is_empty());
        assert!(filter.clause.contains("<> 0"));
    }

    #[test]
    fn fractional_literals_fall_back_to_residual() {
        let fraction = StoredValue::Number(BigDecimal::from_str("1.5").unwrap());
        let filter =
            compile(Container::Profiles, &[Condition::new("last_seen", Operator::GreaterThan, fraction)]).unwrap();
        assert!(filter.clause.is_empty());
        assert_eq!(filter.residual.len(), 1);
    }

    #[test]
    fn mismatched_literals_never_match() {
        let filter = compile(Container::Profiles, &[Condition::new("player_name", Operator::LessThan, 3_i64)]).unwrap();
        assert_eq!(filter.clause, "0");
        let filter = compile(Container::Profiles, &[Condition::not_equal("player_name", 3_i64)]).unwrap();
        assert_eq!(filter.clause, "(\"player_name\" IS NULL OR NOT 0)");
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let err = compile(Container::Bans, &[Condition::equal("nope", 1_i64)]).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn integer_columns_reject_fractions_on_bind() {
        let column = Container::Profiles.column("messages_sent").unwrap();
        let fraction = StoredValue::Number(BigDecimal::from_str("2.5").unwrap());
        assert!(bind_value(column, Some(&fraction)).is_err());
        assert_eq!(bind_value(column, None).unwrap(), SqlValue::Null);
    }

    #[test]
    fn boolean_columns_read_integers_as_flags() {
        let column = Container::Bans.column("active").unwrap();
        assert_eq!(read_value(column, ValueRef::Integer(1)).unwrap(), Some(StoredValue::Bool(true)));
        assert_eq!(read_value(column, ValueRef::Null).unwrap(), None);
        assert!(read_value(column, ValueRef::Blob(b"x")).is_err());
    }
}
