// crates/warden-store-yaml/src/connector.rs
// ============================================================================
// Module: YAML Storage Connector
// Description: StorageConnector over one YAML config tree per container.
// Purpose: Provide the hierarchical flat-file backend.
// Dependencies: serde_yaml, tracing, warden-store-core
// ============================================================================

//! ## Overview
//! Each container is a `<kebab-name>.yml` file whose top-level keys are row
//! IDs and whose leaves are addressed as `"<id>.<column>"` with hyphenated
//! column names. The ID is the key itself and is never written as a leaf.
//! Append-only logs are stored the same way under internal sequence keys.
//!
//! There is no index: every query walks the top-level keys in ID order and
//! evaluates the conditions per row. The next ID is always the largest
//! numeric key plus one, so the highest ID is reused after it is removed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde_yaml::Mapping;
use serde_yaml::Value;
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
use warden_store_core::flatfile::DocumentFormat;
use warden_store_core::flatfile::DocumentStore;
use warden_store_core::flatfile::parse_row_key;

use crate::codec::decode;
use crate::codec::disk_column;
use crate::codec::encode;
use crate::tree::ConfigTree;
use crate::tree::PATH_SEPARATOR;

// ============================================================================
// SECTION: Format
// ============================================================================

/// YAML encoding of container documents.
pub struct YamlFormat;

impl DocumentFormat for YamlFormat {
    type Document = ConfigTree;

    const EXTENSION: &'static str = "yml";

    fn parse(container: Container, bytes: &[u8]) -> Result<ConfigTree, StorageError> {
        ConfigTree::parse(bytes)
            .map_err(|err| StorageError::Corrupt(format!("{container}.{}: {err}", Self::EXTENSION)))
    }

    fn render(container: Container, document: &ConfigTree) -> Result<Vec<u8>, StorageError> {
        document
            .render()
            .map(String::into_bytes)
            .map_err(|err| StorageError::Io(format!("render {container}: {err}")))
    }
}

// ============================================================================
// SECTION: Connector
// ============================================================================

/// Hierarchical-config flat-file connector.
pub struct YamlConnector {
    /// Per-container trees and their files.
    store: DocumentStore<YamlFormat>,
}

impl YamlConnector {
    /// Opens the connector over a storage folder, loading existing files.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the folder cannot be created or a file
    /// cannot be read or decoded.
    pub fn open(folder: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = DocumentStore::open(folder)?;
        debug!(folder = %store.folder().display(), "opened yaml storage");
        Ok(Self {
            store,
        })
    }

    /// Returns the storage folder.
    #[must_use]
    pub fn folder(&self) -> &Path {
        self.store.folder()
    }

    /// Inserts a row, skipping it when a row matches a non-empty `guard`.
    fn insert_guarded(
        &self,
        container: Container,
        row: Row,
        guard: &[Condition],
    ) -> Result<Option<i64>, StorageError> {
        let explicit = validate_insert(container, &row)?;
        let shared_next =
            if container.has_id() && container.id_space() != container && explicit.is_none() {
                Some(self.next_id(container.id_space())?)
            } else {
                None
            };
        self.store.write(container, |tree| {
            if !guard.is_empty() && !matching_keys(tree, container, guard)?.is_empty() {
                return Ok((None, false));
            }
            let key = match explicit.or(shared_next) {
                Some(id) => id,
                None => next_key(container, tree)?,
            };
            if tree.contains(&key.to_string()) {
                return Err(StorageError::InvalidArgument(format!("{container} id {key} is already taken")));
            }
            tree.set(&key.to_string(), Some(empty_row()));
            for (column, value) in &row {
                if column != ID_COLUMN {
                    tree.set(&leaf_path(key, column), Some(encode(value)));
                }
            }
            Ok((container.has_id().then_some(key), true))
        })
    }
}

impl StorageConnector for YamlConnector {
    fn backend(&self) -> BackendKind {
        BackendKind::Yaml
    }

    fn select(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Option<StoredValue>, StorageError> {
        container.require_column(column)?;
        validate_conditions(container, conditions)?;
        self.store.read(container, |tree| {
            for key in row_keys(tree) {
                let mut row = decode_row(tree, container, key)?;
                if row_matches(&row, conditions) {
                    return Ok(row.remove(column));
                }
            }
            Ok(None)
        })
    }

    fn count(&self, container: Container, conditions: &[Condition]) -> Result<usize, StorageError> {
        validate_conditions(container, conditions)?;
        self.store.read(container, |tree| Ok(matching_keys(tree, container, conditions)?.len()))
    }

    fn update(
        &self,
        container: Container,
        column: &str,
        value: Option<StoredValue>,
        conditions: &[Condition],
    ) -> Result<usize, StorageError> {
        validate_write(container, column, value.as_ref())?;
        validate_conditions(container, conditions)?;
        let leaf = value.as_ref().map(encode);
        self.store.write(container, |tree| {
            let keys = matching_keys(tree, container, conditions)?;
            let mut changed = false;
            for key in &keys {
                changed |= tree.set(&leaf_path(*key, column), leaf.clone());
            }
            Ok((keys.len(), changed))
        })
    }

    fn delete(&self, container: Container, conditions: &[Condition]) -> Result<usize, StorageError> {
        validate_conditions(container, conditions)?;
        self.store.write(container, |tree| {
            let keys = matching_keys(tree, container, conditions)?;
            for key in &keys {
                tree.remove(&key.to_string());
            }
            Ok((keys.len(), !keys.is_empty()))
        })
    }

    fn column_values(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Vec<StoredValue>, StorageError> {
        container.require_column(column)?;
        validate_conditions(container, conditions)?;
        self.store.read(container, |tree| {
            let mut values = Vec::new();
            for key in row_keys(tree) {
                let mut row = decode_row(tree, container, key)?;
                if row_matches(&row, conditions)
                    && let Some(value) = row.remove(column)
                {
                    values.push(value);
                }
            }
            Ok(values)
        })
    }

    fn row_values(
        &self,
        container: Container,
        id: i64,
    ) -> Result<Option<Vec<Option<StoredValue>>>, StorageError> {
        container.require_id_column()?;
        self.store.read(container, |tree| {
            if !tree.contains(&id.to_string()) {
                return Ok(None);
            }
            let mut row = decode_row(tree, container, id)?;
            let mut values: Vec<Option<StoredValue>> =
                container.columns().iter().map(|column| row.remove(column.name)).collect();
            if let Some(first) = values.first_mut() {
                *first = Some(StoredValue::from(id));
            }
            Ok(Some(values))
        })
    }

    fn select_rows(&self, container: Container, conditions: &[Condition]) -> Result<Vec<Row>, StorageError> {
        validate_conditions(container, conditions)?;
        self.store.read(container, |tree| {
            let mut rows = Vec::new();
            for key in row_keys(tree) {
                let row = decode_row(tree, container, key)?;
                if row_matches(&row, conditions) {
                    rows.push(row);
                }
            }
            Ok(rows)
        })
    }

    fn insert(&self, container: Container, row: Row) -> Result<Option<i64>, StorageError> {
        self.insert_guarded(container, row, &[])
    }

    fn insert_unique(&self, container: Container, row: Row, guard: &[Condition]) -> Result<Option<i64>, StorageError> {
        validate_unique_guard(container, guard)?;
        self.insert_guarded(container, row, guard)
    }

    fn increment(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Option<StoredValue>, StorageError> {
        validate_increment(container, column)?;
        validate_conditions(container, conditions)?;
        self.store.write(container, |tree| {
            for key in row_keys(tree) {
                let row = decode_row(tree, container, key)?;
                if row_matches(&row, conditions) {
                    let next = incremented(container, column, row.get(column))?;
                    tree.set(&leaf_path(key, column), Some(encode(&next)));
                    return Ok((Some(next), true));
                }
            }
            Ok((None, false))
        })
    }

    fn ids(&self, container: Container) -> Result<Vec<i64>, StorageError> {
        container.require_id_column()?;
        self.store.read(container, |tree| Ok(row_keys(tree)))
    }

    fn next_id(&self, container: Container) -> Result<i64, StorageError> {
        container.require_id_column()?;
        let space = container.id_space();
        self.store.read(space, |tree| next_key(space, tree))
    }

    fn remove_entry(&self, container: Container, id: i64) -> Result<bool, StorageError> {
        container.require_id_column()?;
        self.store.write(container, |tree| {
            let removed = tree.remove(&id.to_string());
            Ok((removed, removed))
        })
    }

    fn remove_entries(&self, container: Container, ids: &[i64]) -> Result<usize, StorageError> {
        container.require_id_column()?;
        self.store.write(container, |tree| {
            let removed = ids.iter().filter(|id| tree.remove(&id.to_string())).count();
            Ok((removed, removed > 0))
        })
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
        self.store.write(container, |tree| {
            let key = id.to_string();
            let mut changed = false;
            if !tree.contains(&key) {
                changed |= tree.set(&key, Some(empty_row()));
            }
            changed |= tree.set(&leaf_path(id, column), value.as_ref().map(encode));
            Ok(((), changed))
        })
    }

    fn missing_data_containers(&self) -> Result<Vec<Container>, StorageError> {
        Ok(self.store.missing())
    }

    fn create_data_container(&self, container: Container) -> Result<(), StorageError> {
        self.store.create(container)
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.store.flush_all()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the dotted path of a row leaf.
fn leaf_path(key: i64, column: &str) -> String {
    format!("{key}{PATH_SEPARATOR}{}", disk_column(column))
}

/// Returns an empty row mapping.
fn empty_row() -> Value {
    Value::Mapping(Mapping::new())
}

/// Returns the numeric top-level keys in ascending order.
fn row_keys(tree: &ConfigTree) -> Vec<i64> {
    let mut keys: Vec<i64> = tree.keys().filter_map(parse_row_key).collect();
    keys.sort_unstable();
    keys
}

/// Returns the largest numeric key plus one.
fn next_key(container: Container, tree: &ConfigTree) -> Result<i64, StorageError> {
    successor_id(container, row_keys(tree).last().copied().unwrap_or(0))
}

/// Decodes every declared column of a row.
fn decode_row(tree: &ConfigTree, container: Container, key: i64) -> Result<Row, StorageError> {
    let mut row = Row::new();
    for column in container.columns() {
        if column.name == ID_COLUMN {
            row.insert(ID_COLUMN.to_string(), StoredValue::from(key));
            continue;
        }
        if let Some(leaf) = tree.get(&leaf_path(key, column.name))
            && let Some(value) = decode(column.kind, leaf)?
        {
            row.insert(column.name.to_string(), value);
        }
    }
    Ok(row)
}

/// Returns true when a decoded row satisfies every condition.
fn row_matches(row: &Row, conditions: &[Condition]) -> bool {
    matches_all(conditions, |column| row.get(column).cloned())
}

/// Returns the keys of every matching row.
fn matching_keys(
    tree: &ConfigTree,
    container: Container,
    conditions: &[Condition],
) -> Result<Vec<i64>, StorageError> {
    let mut keys = Vec::new();
    for key in row_keys(tree) {
        if row_matches(&decode_row(tree, container, key)?, conditions) {
            keys.push(key);
        }
    }
    Ok(keys)
}
