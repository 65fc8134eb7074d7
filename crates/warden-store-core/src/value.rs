// crates/warden-store-core/src/value.rs
// ============================================================================
// Module: Warden Store Values
// Description: Weakly typed column values and row maps.
// Purpose: Carry values between callers and backends without losing precision.
// Dependencies: bigdecimal
// ============================================================================

//! ## Overview
//! A [`StoredValue`] is a boolean, a string, or an arbitrary-precision
//! decimal. Every native numeric width is widened into [`BigDecimal`] so
//! that a 16-bit stored value equals a 64-bit literal of the same magnitude.
//! Absence is modelled with `Option<StoredValue>`, never with a variant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use bigdecimal::BigDecimal;

// ============================================================================
// SECTION: Values
// ============================================================================

/// A single column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    /// Boolean flag.
    Bool(bool),
    /// UTF-8 text.
    Text(String),
    /// Arbitrary-precision decimal.
    Number(BigDecimal),
}

/// A row keyed by logical column name.
pub type Row = BTreeMap<String, StoredValue>;

impl StoredValue {
    /// Returns the decimal payload for numeric values.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Self::Number(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the text payload for string values.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the boolean payload for flag values.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns true for numeric values.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Returns a stable label for the value kind.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Number(_) => "number",
        }
    }
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => value.fmt(f),
            Self::Text(value) => f.write_str(value),
            Self::Number(value) => value.normalized().fmt(f),
        }
    }
}

impl From<bool> for StoredValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i16> for StoredValue {
    fn from(value: i16) -> Self {
        Self::Number(BigDecimal::from(value))
    }
}

impl From<i32> for StoredValue {
    fn from(value: i32) -> Self {
        Self::Number(BigDecimal::from(value))
    }
}

impl From<i64> for StoredValue {
    fn from(value: i64) -> Self {
        Self::Number(BigDecimal::from(value))
    }
}

impl From<BigDecimal> for StoredValue {
    fn from(value: BigDecimal) -> Self {
        Self::Number(value)
    }
}
