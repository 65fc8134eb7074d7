// crates/warden-store-core/src/numeric.rs
// ============================================================================
// Module: Warden Store Numeric Coercion
// Description: Conversions between native values and stored decimals.
// Purpose: Give typed accessors one coercion path for every backend.
// Dependencies: bigdecimal, crate::value
// ============================================================================

//! ## Overview
//! Document backends keep numbers as [`BigDecimal`]; callers want `i16`,
//! `i32`, `i64`, `f64`, `bool`, or `String`. [`FieldValue`] converts in both
//! directions. Reads are lenient in the same way a weakly typed document is:
//! numeric text parses as a number and integer reads truncate the fraction.
//! Magnitudes that do not fit the requested width are rejected. Non-finite
//! floats never enter the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;

use crate::error::StorageError;
use crate::value::StoredValue;

// ============================================================================
// SECTION: Decimal Conversion
// ============================================================================

/// Converts a finite `f64` into a decimal through its shortest textual form.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for NaN or infinite values.
pub fn decimal_from_f64(value: f64) -> Result<BigDecimal, StorageError> {
    if !value.is_finite() {
        return Err(StorageError::InvalidArgument(format!("non-finite number: {value}")));
    }
    BigDecimal::from_str(&value.to_string())
        .map_err(|err| StorageError::InvalidArgument(err.to_string()))
}

/// Converts a finite `f32` into a decimal through its shortest textual form.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for NaN or infinite values.
pub fn decimal_from_f32(value: f32) -> Result<BigDecimal, StorageError> {
    if !value.is_finite() {
        return Err(StorageError::InvalidArgument(format!("non-finite number: {value}")));
    }
    BigDecimal::from_str(&value.to_string())
        .map_err(|err| StorageError::InvalidArgument(err.to_string()))
}

/// Parses decimal text, returning `None` for anything that is not a finite number.
#[must_use]
pub fn decimal_from_text(text: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(text.trim()).ok()
}

/// Builds a numeric stored value from a finite float.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] for NaN or infinite values.
pub fn number_from_f64(value: f64) -> Result<StoredValue, StorageError> {
    decimal_from_f64(value).map(StoredValue::Number)
}

/// Returns the decimal view of a stored value, parsing numeric text.
fn numeric_view(value: &StoredValue) -> Option<BigDecimal> {
    match value {
        StoredValue::Number(number) => Some(number.clone()),
        StoredValue::Text(text) => decimal_from_text(text),
        StoredValue::Bool(_) => None,
    }
}

/// Truncates a stored value to an integer of the requested width.
fn integer_from_stored<T>(value: &StoredValue, label: &str) -> Result<T, StorageError>
where
    T: TryFrom<i64>,
{
    let decimal = numeric_view(value).ok_or_else(|| {
        StorageError::Corrupt(format!("expected {label}, found {}", value.kind_label()))
    })?;
    let wide = decimal
        .to_i64()
        .ok_or_else(|| StorageError::Corrupt(format!("{decimal} does not fit {label}")))?;
    T::try_from(wide).map_err(|_| StorageError::Corrupt(format!("{decimal} does not fit {label}")))
}

// ============================================================================
// SECTION: Typed Values
// ============================================================================

/// A native type that can be read from and written to a column.
pub trait FieldValue: Sized {
    /// Stable type label used in error messages.
    const LABEL: &'static str;

    /// Coerces a stored value into the native type.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] when the stored value cannot be
    /// represented as `Self`.
    fn from_stored(value: StoredValue) -> Result<Self, StorageError>;

    /// Converts the native value into its stored form.
    fn into_stored(self) -> StoredValue;
}

/// Coerces an optional stored value into an optional native value.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] when a present value cannot be coerced.
pub fn coerce<T: FieldValue>(value: Option<StoredValue>) -> Result<Option<T>, StorageError> {
    value.map(T::from_stored).transpose()
}

impl FieldValue for bool {
    const LABEL: &'static str = "bool";

    fn from_stored(value: StoredValue) -> Result<Self, StorageError> {
        match value {
            StoredValue::Bool(flag) => Ok(flag),
            StoredValue::Text(text) if text.eq_ignore_ascii_case("true") => Ok(true),
            StoredValue::Text(text) if text.eq_ignore_ascii_case("false") => Ok(false),
            StoredValue::Number(number) => Ok(number != BigDecimal::from(0)),
            StoredValue::Text(text) => Err(StorageError::Corrupt(format!("expected bool, found {text}"))),
        }
    }

    fn into_stored(self) -> StoredValue {
        StoredValue::Bool(self)
    }
}

impl FieldValue for String {
    const LABEL: &'static str = "string";

    fn from_stored(value: StoredValue) -> Result<Self, StorageError> {
        Ok(match value {
            StoredValue::Text(text) => text,
            other => other.to_string(),
        })
    }

    fn into_stored(self) -> StoredValue {
        StoredValue::Text(self)
    }
}

impl FieldValue for i16 {
    const LABEL: &'static str = "i16";

    fn from_stored(value: StoredValue) -> Result<Self, StorageError> {
        integer_from_stored(&value, Self::LABEL)
    }

    fn into_stored(self) -> StoredValue {
        StoredValue::from(self)
    }
}

impl FieldValue for i32 {
    const LABEL: &'static str = "i32";

    fn from_stored(value: StoredValue) -> Result<Self, StorageError> {
        integer_from_stored(&value, Self::LABEL)
    }

    fn into_stored(self) -> StoredValue {
        StoredValue::from(self)
    }
}

impl FieldValue for i64 {
    const LABEL: &'static str = "i64";

    fn from_stored(value: StoredValue) -> Result<Self, StorageError> {
        integer_from_stored(&value, Self::LABEL)
    }

    fn into_stored(self) -> StoredValue {
        StoredValue::from(self)
    }
}

impl FieldValue for f64 {
    const LABEL: &'static str = "f64";

    fn from_stored(value: StoredValue) -> Result<Self, StorageError> {
        numeric_view(&value).and_then(|decimal| decimal.to_f64()).ok_or_else(|| {
            StorageError::Corrupt(format!("expected f64, found {}", value.kind_label()))
        })
    }

    /// Non-finite floats are stored as text because no decimal can hold them.
    fn into_stored(self) -> StoredValue {
        number_from_f64(self).unwrap_or_else(|_| StoredValue::Text(self.to_string()))
    }
}

impl FieldValue for BigDecimal {
    const LABEL: &'static str = "decimal";

    fn from_stored(value: StoredValue) -> Result<Self, StorageError> {
        numeric_view(&value).ok_or_else(|| {
            StorageError::Corrupt(format!("expected decimal, found {}", value.kind_label()))
        })
    }

    fn into_stored(self) -> StoredValue {
        StoredValue::Number(self)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::float_cmp,
        reason = "Test assertions use unwrap and exact float literals."
    )]

    use super::*;

    #[test]
    fn widths_widen_to_equal_decimals() {
        assert_eq!(StoredValue::from(7_i16), StoredValue::from(7_i64));
        assert_eq!(StoredValue::from(7_i32), StoredValue::Number(decimal_from_f64(7.0).unwrap()));
    }

    #[test]
    fn integer_reads_truncate_and_range_check() {
        let value = StoredValue::Number(BigDecimal::from_str("12.9").unwrap());
        assert_eq!(i32::from_stored(value).unwrap(), 12);
        let wide = StoredValue::from(70_000_i64);
        assert!(matches!(i16::from_stored(wide), Err(StorageError::Corrupt(_))));
        assert_eq!(i64::from_stored(StoredValue::from(" 42 ")).unwrap(), 42);
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        assert!(decimal_from_f64(f64::NAN).is_err());
        assert!(decimal_from_f64(f64::INFINITY).is_err());
        assert!(decimal_from_f32(f32::NEG_INFINITY).is_err());
        assert!(decimal_from_text("NaN").is_none());
    }

    #[test]
    fn strings_render_any_value() {
        assert_eq!(String::from_stored(StoredValue::from(5_i32)).unwrap(), "5");
        assert_eq!(String::from_stored(StoredValue::Bool(true)).unwrap(), "true");
        assert_eq!(f64::from_stored(StoredValue::from("2.5")).unwrap(), 2.5);
    }

    #[test]
    fn coerce_preserves_absence() {
        assert_eq!(coerce::<i32>(None).unwrap(), None);
        assert_eq!(coerce::<bool>(Some(StoredValue::from("TRUE"))).unwrap(), Some(true));
    }
}
