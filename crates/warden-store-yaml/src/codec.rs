// crates/warden-store-yaml/src/codec.rs
// ============================================================================
// Module: YAML Value Codec
// Description: Conversion between stored values and YAML scalars.
// Purpose: Keep decimals exact in a format whose numbers are i64/u64/f64.
// Dependencies: bigdecimal, serde_yaml, warden-store-core
// ============================================================================

//! ## Overview
//! Integers within `i64` and decimals that survive an `f64` round trip are
//! written as YAML numbers. Any other decimal is written as its canonical
//! text and read back as a number because the column is declared numeric.
//! Column names are hyphenated on disk.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;
use serde_yaml::Number;
use serde_yaml::Value;
use warden_store_core::ColumnKind;
use warden_store_core::StorageError;
use warden_store_core::StoredValue;
use warden_store_core::numeric::decimal_from_f64;
use warden_store_core::numeric::decimal_from_text;

// ============================================================================
// SECTION: Column Names
// ============================================================================

/// Returns the hyphenated on-disk spelling of a column.
#[must_use]
pub fn disk_column(column: &str) -> String {
    column.replace('_', "-")
}

// ============================================================================
// SECTION: Values
// ============================================================================

/// Encodes a stored value as a YAML scalar.
#[must_use]
pub fn encode(value: &StoredValue) -> Value {
    match value {
        StoredValue::Bool(flag) => Value::Bool(*flag),
        StoredValue::Text(text) => Value::String(text.clone()),
        StoredValue::Number(number) => encode_number(number),
    }
}

/// Encodes a decimal without losing precision.
fn encode_number(number: &BigDecimal) -> Value {
    if number.is_integer()
        && let Some(integer) = number.to_i64()
    {
        return Value::Number(Number::from(integer));
    }
    let exact_float = number
        .to_f64()
        .filter(|float| decimal_from_f64(*float).is_ok_and(|back| &back == number));
    match exact_float {
        Some(float) => Value::Number(Number::from(float)),
        None => Value::String(number.normalized().to_string()),
    }
}

/// Decodes a YAML leaf for a column of the given kind.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] for sequences, mappings, tagged values,
/// and non-finite floats.
pub fn decode(kind: ColumnKind, value: &Value) -> Result<Option<StoredValue>, StorageError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(StoredValue::Bool(*flag))),
        Value::Number(number) => decode_number(number).map(Some),
        Value::String(text) => {
            if kind.is_numeric()
                && let Some(number) = decimal_from_text(text)
            {
                return Ok(Some(StoredValue::Number(number)));
            }
            Ok(Some(StoredValue::Text(text.clone())))
        }
        Value::Sequence(_) => Err(StorageError::Corrupt("unsupported yaml leaf: sequence".to_string())),
        Value::Mapping(_) => Err(StorageError::Corrupt("unsupported yaml leaf: mapping".to_string())),
        Value::Tagged(tagged) => {
            Err(StorageError::Corrupt(format!("unsupported yaml leaf: tag {}", tagged.tag)))
        }
    }
}

/// Decodes a YAML number.
fn decode_number(number: &Number) -> Result<StoredValue, StorageError> {
    if let Some(integer) = number.as_i64() {
        return Ok(StoredValue::from(integer));
    }
    if let Some(integer) = number.as_u64() {
        return Ok(StoredValue::Number(BigDecimal::from(integer)));
    }
    let float = number.as_f64().unwrap_or(f64::NAN);
    decimal_from_f64(float)
        .map(StoredValue::Number)
        .map_err(|_| StorageError::Corrupt(format!("non-finite yaml number: {number}")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test assertions use unwrap for brevity.")]

    use std::str::FromStr;

    use super::*;

    #[test]
    fn wide_decimals_survive_as_text() {
        let wide = BigDecimal::from_str("12345678901234567890.000000000001").unwrap();
        let encoded = encode(&StoredValue::Number(wide.clone()));
        assert!(encoded.is_string());
        assert_eq!(decode(ColumnKind::BigInt, &encoded).unwrap(), Some(StoredValue::Number(wide)));
    }

    #[test]
    fn short_decimals_stay_numbers() {
        let value = StoredValue::Number(BigDecimal::from_str("2.5").unwrap());
        let encoded = encode(&value);
        assert!(encoded.is_f64());
        assert_eq!(decode(ColumnKind::BigInt, &encoded).unwrap(), Some(value));
        assert!(encode(&StoredValue::from(-4_i64)).is_i64());
    }

    #[test]
    fn numeric_text_in_text_columns_stays_text() {
        let leaf = Value::String("42".to_string());
        assert_eq!(decode(ColumnKind::Text, &leaf).unwrap(), Some(StoredValue::from("42")));
        assert_eq!(decode(ColumnKind::BigInt, &leaf).unwrap(), Some(StoredValue::from(42_i64)));
        assert_eq!(decode(ColumnKind::Text, &Value::Null).unwrap(), None);
    }

    #[test]
    fn columns_are_hyphenated() {
        assert_eq!(disk_column("times_banned"), "times-banned");
        assert_eq!(disk_column("id"), "id");
    }
}
