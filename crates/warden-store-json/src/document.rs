// crates/warden-store-json/src/document.rs
// ============================================================================
// Module: JSON Container Document
// Description: In-memory form of one JSON container file.
// Purpose: Hold rows keyed by ID together with the persisted ID counter.
// Dependencies: bigdecimal, serde_json, warden-store-core
// ============================================================================

//! ## Overview
//! A container file is one JSON object. Every key except [`CURRENT_ID_KEY`]
//! is a positive row ID whose value is an object of camelCase column keys.
//! `currentID` records the highest ID ever allocated and is never lowered,
//! so IDs freed by deletion are not handed out again. On load the counter is
//! raised to the largest stored key if a hand edit left it behind.
//!
//! Numbers are parsed with `arbitrary_precision` and converted through
//! [`BigDecimal`] text, so no value passes through a float.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use warden_store_core::ColumnKind;
use warden_store_core::StorageError;
use warden_store_core::StoredValue;
use warden_store_core::flatfile::parse_row_key;
use warden_store_core::numeric::decimal_from_text;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Reserved key holding the ID counter.
pub const CURRENT_ID_KEY: &str = "currentID";

// ============================================================================
// SECTION: Document
// ============================================================================

/// Rows of one JSON container plus its ID counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonDocument {
    /// Highest ID ever allocated.
    current_id: i64,
    /// Row objects keyed by ID.
    rows: BTreeMap<i64, Map<String, Value>>,
}

impl JsonDocument {
    /// Parses a container file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] when the file is not an object of
    /// row objects, or the counter is not a non-negative integer.
    pub fn parse(bytes: &[u8]) -> Result<Self, StorageError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|err| StorageError::Corrupt(format!("invalid json: {err}")))?;
        let Value::Object(object) = value else {
            return Err(StorageError::Corrupt("json root must be an object".to_string()));
        };
        let mut document = Self::default();
        for (key, value) in object {
            if key == CURRENT_ID_KEY {
                document.current_id = counter_value(&value)?;
                continue;
            }
            let id = parse_row_key(&key)
                .ok_or_else(|| StorageError::Corrupt(format!("unexpected json key {key}")))?;
            let Value::Object(row) = value else {
                return Err(StorageError::Corrupt(format!("row {id} must be an object")));
            };
            document.rows.insert(id, row);
        }
        if let Some(max) = document.rows.keys().next_back() {
            document.current_id = document.current_id.max(*max);
        }
        Ok(document)
    }

    /// Renders the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when serialization fails.
    pub fn render(&self) -> Result<Vec<u8>, StorageError> {
        let mut object = Map::new();
        object.insert(CURRENT_ID_KEY.to_string(), Value::Number(Number::from(self.current_id)));
        for (id, row) in &self.rows {
            object.insert(id.to_string(), Value::Object(row.clone()));
        }
        serde_json::to_vec_pretty(&Value::Object(object))
            .map_err(|err| StorageError::Io(format!("render json: {err}")))
    }

    /// Returns the highest ID ever allocated.
    #[must_use]
    pub const fn current_id(&self) -> i64 {
        self.current_id
    }

    /// Raises the counter to at least `id`.
    pub fn observe(&mut self, id: i64) {
        self.current_id = self.current_id.max(id);
    }

    /// Returns row IDs in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.rows.keys().copied()
    }

    /// Returns a row by ID.
    #[must_use]
    pub fn row(&self, id: i64) -> Option<&Map<String, Value>> {
        self.rows.get(&id)
    }

    /// Returns a mutable row by ID.
    pub fn row_mut(&mut self, id: i64) -> Option<&mut Map<String, Value>> {
        self.rows.get_mut(&id)
    }

    /// Returns the row with `id`, creating an empty one and raising the counter.
    pub fn upsert_row(&mut self, id: i64) -> (&mut Map<String, Value>, bool) {
        self.observe(id);
        let created = !self.rows.contains_key(&id);
        (self.rows.entry(id).or_default(), created)
    }

    /// Removes a row, leaving the counter unchanged.
    pub fn remove(&mut self, id: i64) -> bool {
        self.rows.remove(&id).is_some()
    }

    /// Returns true when the row exists.
    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }
}

// ============================================================================
// SECTION: Values
// ============================================================================

/// Encodes a stored value as JSON without passing through a float.
#[must_use]
pub fn encode(value: &StoredValue) -> Value {
    match value {
        StoredValue::Bool(flag) => Value::Bool(*flag),
        StoredValue::Text(text) => Value::String(text.clone()),
        StoredValue::Number(number) => {
            if number.is_integer()
                && let Some(integer) = number.to_i64()
            {
                return Value::Number(Number::from(integer));
            }
            let text = number.normalized().to_string();
            Number::from_str(&text).map_or(Value::String(text), Value::Number)
        }
    }
}

/// Decodes a JSON leaf for a column of the given kind.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] for arrays, objects, and numbers that
/// do not parse as decimals.
pub fn decode(kind: ColumnKind, value: &Value) -> Result<Option<StoredValue>, StorageError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(StoredValue::Bool(*flag))),
        Value::Number(number) => BigDecimal::from_str(&number.to_string())
            .map(|decimal| Some(StoredValue::Number(decimal)))
            .map_err(|err| StorageError::Corrupt(format!("json number {number}: {err}"))),
        Value::String(text) => {
            if kind.is_numeric()
                && let Some(number) = decimal_from_text(text)
            {
                return Ok(Some(StoredValue::Number(number)));
            }
            Ok(Some(StoredValue::Text(text.clone())))
        }
        Value::Array(_) | Value::Object(_) => {
            Err(StorageError::Corrupt(format!("unsupported json leaf: {value}")))
        }
    }
}

/// Reads the ID counter.
fn counter_value(value: &Value) -> Result<i64, StorageError> {
    value
        .as_i64()
        .filter(|counter| *counter >= 0)
        .ok_or_else(|| StorageError::Corrupt(format!("{CURRENT_ID_KEY} must be a non-negative integer")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test assertions use unwrap for brevity.")]

    use super::*;

    #[test]
    fn counter_is_raised_to_the_largest_key() {
        let document = JsonDocument::parse(br#"{"currentID": 2, "9": {"reason": "x"}}"#).unwrap();
        assert_eq!(document.current_id(), 9);
    }

    #[test]
    fn removal_never_lowers_the_counter() {
        let mut document = JsonDocument::default();
        document.upsert_row(1);
        document.upsert_row(2);
        assert!(document.remove(2));
        assert_eq!(document.current_id(), 2);
        document.observe(1);
        assert_eq!(document.current_id(), 2);
    }

    #[test]
    fn decimals_keep_every_digit() {
        let text = "3.141592653589793238462643383279";
        let number = BigDecimal::from_str(text).unwrap();
        let encoded = encode(&StoredValue::Number(number.clone()));
        assert_eq!(encoded.to_string(), text);
        assert_eq!(decode(ColumnKind::BigInt, &encoded).unwrap(), Some(StoredValue::Number(number)));
    }

    #[test]
    fn rejects_foreign_keys_and_shapes() {
        assert!(JsonDocument::parse(br#"{"players": {}}"#).is_err());
        assert!(JsonDocument::parse(br#"{"1": 5}"#).is_err());
        assert!(JsonDocument::parse(br#"{"currentID": -3}"#).is_err());
        assert!(JsonDocument::parse(b"[]").is_err());
    }
}
