// crates/warden-store-core/src/condition.rs
// ============================================================================
// Module: Warden Store Conditions
// Description: Row filter predicates and their evaluation.
// Purpose: Provide one filter semantics shared by every backend.
// Dependencies: bigdecimal, crate::value
// ============================================================================

//! ## Overview
//! A [`Condition`] compares one column of a row against a literal. A row
//! matches a condition list when every condition holds; evaluation stops at
//! the first failure.
//!
//! - Equality on strings ignores ASCII case.
//! - Equality on numbers compares decimal values, so widths do not matter.
//! - Ordering operators only hold when both sides are numeric.
//! - An absent column never equals anything and is never ordered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;

use crate::value::StoredValue;

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Comparison operator for a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Values are equal.
    Equal,
    /// Values are not equal.
    NotEqual,
    /// Stored value is greater than the literal.
    GreaterThan,
    /// Stored value is less than the literal.
    LessThan,
    /// Stored value is greater than or equal to the literal.
    GreaterOrEqual,
    /// Stored value is less than or equal to the literal.
    LessOrEqual,
}

impl Operator {
    /// Returns true for the four ordering operators.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        !matches!(self, Self::Equal | Self::NotEqual)
    }

    /// Returns the SQL spelling of the operator.
    #[must_use]
    pub const fn sql_symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
        }
    }
}

// ============================================================================
// SECTION: Conditions
// ============================================================================

/// A single filter predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Logical column name.
    pub column: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Literal compared against the stored value.
    pub value: StoredValue,
}

impl Condition {
    /// Creates a condition.
    #[must_use]
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<StoredValue>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    /// Creates an equality condition.
    #[must_use]
    pub fn equal(column: impl Into<String>, value: impl Into<StoredValue>) -> Self {
        Self::new(column, Operator::Equal, value)
    }

    /// Creates an inequality condition.
    #[must_use]
    pub fn not_equal(column: impl Into<String>, value: impl Into<StoredValue>) -> Self {
        Self::new(column, Operator::NotEqual, value)
    }

    /// Returns true when the stored value satisfies this condition.
    #[must_use]
    pub fn matches(&self, stored: Option<&StoredValue>) -> bool {
        evaluate(self, stored)
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates a condition against a stored value.
#[must_use]
pub fn evaluate(condition: &Condition, stored: Option<&StoredValue>) -> bool {
    let Some(stored) = stored else {
        return condition.operator == Operator::NotEqual;
    };
    match condition.operator {
        Operator::Equal => values_equal(stored, &condition.value),
        Operator::NotEqual => !values_equal(stored, &condition.value),
        Operator::GreaterThan => ordering(stored, &condition.value).is_some_and(Ordering::is_gt),
        Operator::LessThan => ordering(stored, &condition.value).is_some_and(Ordering::is_lt),
        Operator::GreaterOrEqual => ordering(stored, &condition.value).is_some_and(Ordering::is_ge),
        Operator::LessOrEqual => ordering(stored, &condition.value).is_some_and(Ordering::is_le),
    }
}

/// Returns true when every condition holds for the row.
///
/// `lookup` resolves a logical column name to the row's stored value.
pub fn matches_all<F>(conditions: &[Condition], mut lookup: F) -> bool
where
    F: FnMut(&str) -> Option<StoredValue>,
{
    conditions.iter().all(|condition| evaluate(condition, lookup(&condition.column).as_ref()))
}

/// Equality with case-insensitive text and width-agnostic numbers.
fn values_equal(stored: &StoredValue, expected: &StoredValue) -> bool {
    match (stored, expected) {
        (StoredValue::Text(left), StoredValue::Text(right)) => left.eq_ignore_ascii_case(right),
        (StoredValue::Number(left), StoredValue::Number(right)) => left == right,
        _ => stored == expected,
    }
}

/// Orders two numeric values; anything else is unordered.
fn ordering(stored: &StoredValue, expected: &StoredValue) -> Option<Ordering> {
    let left = stored.as_decimal()?;
    let right = expected.as_decimal()?;
    Some(left.cmp(right))
}
