// crates/warden-store-json/src/connector.rs
// ============================================================================
// Module: JSON Storage Connector
// Description: StorageConnector over one JSON document per container.
// Purpose: Provide the JSON flat-file backend with a persisted ID counter.
// Dependencies: serde_json, tracing, warden-store-core
// ============================================================================

//! ## Overview
//! Each container is a `<kebab-name>.json` file (see [`JsonDocument`]). Rows
//! are keyed by ID; columns are stored under [`adapt_position`] keys. ID
//! allocation trusts the `currentID` counter: inserts with an explicit ID and
//! upserts raise it, deletions never lower it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde_json::Map;
use serde_json::Value;
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

use crate::document::JsonDocument;
use crate::document::decode;
use crate::document::encode;
use crate::naming::adapt_position;

// ============================================================================
// SECTION: Format
// ============================================================================

/// JSON encoding of container documents.
pub struct JsonFormat;

impl DocumentFormat for JsonFormat {
    type Document = JsonDocument;

    const EXTENSION: &'static str = "json";

    fn parse(container: Container, bytes: &[u8]) -> Result<JsonDocument, StorageError> {
        JsonDocument::parse(bytes).map_err(|err| match err {
            StorageError::Corrupt(message) => {
                StorageError::Corrupt(format!("{container}.{}: {message}", Self::EXTENSION))
            }
            other => other,
        })
    }

    fn render(_container: Container, document: &JsonDocument) -> Result<Vec<u8>, StorageError> {
        document.render()
    }
}

// ============================================================================
// SECTION: Connector
// ============================================================================

/// JSON-document flat-file connector.
pub struct JsonConnector {
    /// Per-container documents and their files.
    store: DocumentStore<JsonFormat>,
}

impl JsonConnector {
    /// Opens the connector over a storage folder, loading existing files.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the folder cannot be created or a file
    /// cannot be read or decoded.
    pub fn open(folder: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = DocumentStore::open(folder)?;
        debug!(folder = %store.folder().display(), "opened json storage");
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
        self.store.write(container, |document| {
            if !guard.is_empty() && !matching_ids(document, container, guard)?.is_empty() {
                return Ok((None, false));
            }
            let id = match explicit.or(shared_next) {
                Some(id) => id,
                None => successor_id(container, document.current_id())?,
            };
            if document.contains(id) {
                return Err(StorageError::InvalidArgument(format!("{container} id {id} is already taken")));
            }
            let (target, _) = document.upsert_row(id);
            for (column, value) in &row {
                if column != ID_COLUMN {
                    target.insert(adapt_position(column), encode(value));
                }
            }
            Ok((container.has_id().then_some(id), true))
        })
    }
}

impl StorageConnector for JsonConnector {
    fn backend(&self) -> BackendKind {
        BackendKind::Json
    }

    fn select(
        &self,
        container: Container,
        column: &str,
        conditions: &[Condition],
    ) -> Result<Option<StoredValue>, StorageError> {
        container.require_column(column)?;
        validate_conditions(container, conditions)?;
        self.store.read(container, |document| {
            for id in document.ids() {
                let mut row = decode_row(document, container, id)?;
                if row_matches(&row, conditions) {
                    return Ok(row.remove(column));
                }
            }
            Ok(None)
        })
    }

    fn count(&self, container: Container, conditions: &[Condition]) -> Result<usize, StorageError> {
        validate_conditions(container, conditions)?;
        self.store.read(container, |document| Ok(matching_ids(document, container, conditions)?.len()))
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
        let key = adapt_position(column);
        let leaf = value.as_ref().map(encode);
        self.store.write(container, |document| {
            let ids = matching_ids(document, container, conditions)?;
            let mut changed = false;
            for id in &ids {
                if let Some(row) = document.row_mut(*id) {
                    changed |= write_leaf(row, &key, leaf.clone());
                }
            }
            Ok((ids.len(), changed))
        })
    }

    fn delete(&self, container: Container, conditions: &[Condition]) -> Result<usize, StorageError> {
        validate_conditions(container, conditions)?;
        self.store.write(container, |document| {
            let ids = matching_ids(document, container, conditions)?;
            for id in &ids {
                document.remove(*id);
            }
            Ok((ids.len(), !ids.is_empty()))
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
        self.store.read(container, |document| {
            let mut values = Vec::new();
            for id in document.ids() {
                let mut row = decode_row(document, container, id)?;
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
        self.store.read(container, |document| {
            if !document.contains(id) {
                return Ok(None);
            }
            let mut row = decode_row(document, container, id)?;
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
        self.store.read(container, |document| {
            let mut rows = Vec::new();
            for id in document.ids() {
                let row = decode_row(document, container, id)?;
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
        let key = adapt_position(column);
        self.store.write(container, |document| {
            let Some(id) = matching_ids(document, container, conditions)?.first().copied() else {
                return Ok((None, false));
            };
            let row = decode_row(document, container, id)?;
            let next = incremented(container, column, row.get(column))?;
            if let Some(target) = document.row_mut(id) {
                target.insert(key, encode(&next));
            }
            Ok((Some(next), true))
        })
    }

    fn ids(&self, container: Container) -> Result<Vec<i64>, StorageError> {
        container.require_id_column()?;
        self.store.read(container, |document| Ok(document.ids().collect()))
    }

    fn next_id(&self, container: Container) -> Result<i64, StorageError> {
        container.require_id_column()?;
        let space = container.id_space();
        self.store.read(space, |document| successor_id(space, document.current_id()))
    }

    fn remove_entry(&self, container: Container, id: i64) -> Result<bool, StorageError> {
        container.require_id_column()?;
        self.store.write(container, |document| {
            let removed = document.remove(id);
            Ok((removed, removed))
        })
    }

    fn remove_entries(&self, container: Container, ids: &[i64]) -> Result<usize, StorageError> {
        container.require_id_column()?;
        self.store.write(container, |document| {
            let removed = ids.iter().filter(|id| document.remove(**id)).count();
            Ok((removed, removed > 0))
        })
    }

    fn reserve_ids(&self, container: Container, highest: i64) -> Result<(), StorageError> {
        container.require_id_column()?;
        self.store.write(container.id_space(), |document| {
            let raised = highest > document.current_id();
            document.observe(highest);
            Ok(((), raised))
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
        let key = adapt_position(column);
        self.store.write(container, |document| {
            let counter = document.current_id();
            let (row, created) = document.upsert_row(id);
            let changed = write_leaf(row, &key, value.as_ref().map(encode));
            Ok(((), changed || created || id > counter))
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

/// Writes or removes a row leaf and reports whether the row changed.
fn write_leaf(row: &mut Map<String, Value>, key: &str, leaf: Option<Value>) -> bool {
    match leaf {
        Some(leaf) => row.insert(key.to_string(), leaf.clone()).as_ref() != Some(&leaf),
        None => row.remove(key).is_some(),
    }
}

/// Decodes every declared column of a row.
fn decode_row(document: &JsonDocument, container: Container, id: i64) -> Result<Row, StorageError> {
    let mut row = Row::new();
    let Some(stored) = document.row(id) else {
        return Ok(row);
    };
    for column in container.columns() {
        if column.name == ID_COLUMN {
            row.insert(ID_COLUMN.to_string(), StoredValue::from(id));
            continue;
        }
        if let Some(leaf) = stored.get(&adapt_position(column.name))
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

/// Returns the IDs of every matching row.
fn matching_ids(
    document: &JsonDocument,
    container: Container,
    conditions: &[Condition],
) -> Result<Vec<i64>, StorageError> {
    let mut ids = Vec::new();
    for id in document.ids() {
        if row_matches(&decode_row(document, container, id)?, conditions) {
            ids.push(id);
        }
    }
    Ok(ids)
}
