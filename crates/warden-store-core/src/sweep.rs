// crates/warden-store-core/src/sweep.rs
// ============================================================================
// Module: Warden Store Player Sweep
// Description: Removal of profiles not seen within the retention period.
// Purpose: Keep profile and secondary IP containers bounded.
// Dependencies: tracing, crate::{condition, connector, error, field, schema}
// ============================================================================

//! ## Overview
//! The sweep removes every profile whose `last_seen` is strictly older than
//! `now - retention`, together with the secondary IP row sharing its ID.
//! Each container is persisted once per pass. The sweep is synchronous;
//! callers dispatch it onto a background worker. Once started it runs to
//! completion.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use tracing::debug;
use tracing::info;

use crate::condition::Condition;
use crate::condition::Operator;
use crate::connector::ConnectorExt;
use crate::connector::StorageConnector;
use crate::error::StorageError;
use crate::field;
use crate::schema::Container;
use crate::schema::ID_COLUMN;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Configuration sentinel disabling the sweep.
pub const RETENTION_DISABLED: i64 = -1;
/// Milliseconds per day.
const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1_000;

// ============================================================================
// SECTION: Types
// ============================================================================

/// How long profiles are kept after the player was last seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Never remove profiles.
    Disabled,
    /// Remove profiles older than the duration.
    After(Duration),
}

impl Retention {
    /// Builds a retention from a day count where `-1` disables the sweep.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for zero or other negative values.
    pub fn from_days(days: i64) -> Result<Self, StorageError> {
        if days == RETENTION_DISABLED {
            return Ok(Self::Disabled);
        }
        let days = u64::try_from(days)
            .ok()
            .filter(|days| *days > 0)
            .ok_or_else(|| StorageError::InvalidArgument(format!("invalid retention days: {days}")))?;
        Ok(Self::After(Duration::from_millis(days.saturating_mul(MILLIS_PER_DAY))))
    }

    /// Returns the cutoff timestamp, or `None` when disabled.
    #[must_use]
    pub fn cutoff(self, now_millis: i64) -> Option<i64> {
        match self {
            Self::Disabled => None,
            Self::After(period) => {
                let period = i64::try_from(period.as_millis()).unwrap_or(i64::MAX);
                Some(now_millis.saturating_sub(period))
            }
        }
    }
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Profiles last seen before this timestamp were removed.
    pub cutoff: i64,
    /// Number of profiles removed.
    pub removed: usize,
    /// Wall time spent in the pass.
    pub elapsed: Duration,
}

// ============================================================================
// SECTION: Sweep
// ============================================================================

/// Removes stale profiles and their secondary IP rows.
///
/// Returns `None` when retention is disabled.
///
/// # Errors
///
/// Returns [`StorageError`] when reading or removing rows fails.
pub fn sweep_stale_players<C: StorageConnector + ?Sized>(
    connector: &C,
    retention: Retention,
    now_millis: i64,
) -> Result<Option<SweepReport>, StorageError> {
    let Some(cutoff) = retention.cutoff(now_millis) else {
        debug!("player sweep disabled");
        return Ok(None);
    };
    let started = Instant::now();
    let stale = connector.column_values_as::<i64>(
        Container::Profiles,
        ID_COLUMN,
        &[Condition::new(field::LAST_SEEN.column(), Operator::LessThan, cutoff)],
    )?;
    let removed = connector.remove_entries(Container::Profiles, &stale)?;
    connector.remove_entries(Container::SecondaryIps, &stale)?;
    let elapsed = started.elapsed();
    info!(
        backend = connector.backend().as_str(),
        removed,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "removed stale player profiles"
    );
    Ok(Some(SweepReport {
        cutoff,
        removed,
        elapsed,
    }))
}

/// Returns the current unix epoch in milliseconds.
#[must_use]
pub fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
