// crates/warden-store/src/migrate.rs
// ============================================================================
// Module: Backend Migration
// Description: Copies every container from one connector into another.
// Purpose: Move moderation data between YAML, JSON, and SQLite storage.
// Dependencies: warden-store-core
// ============================================================================

//! ## Overview
//! Rows are copied with their IDs, so references between containers (for
//! example `player_id` on punishments) stay valid. The destination must be
//! empty; this is checked for every container before the first row is
//! written. After copying, the destination reserves every ID the source has
//! handed out, so a counter-based target never reissues an ID that was
//! freed before the migration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use warden_store_core::BackendKind;
use warden_store_core::Container;
use warden_store_core::StorageConnector;
use warden_store_core::StorageError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of a completed migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Backend the rows were read from.
    pub source: BackendKind,
    /// Backend the rows were written to.
    pub target: BackendKind,
    /// Rows copied per container.
    pub copied: BTreeMap<Container, usize>,
}

impl MigrationReport {
    /// Returns the total number of rows copied.
    #[must_use]
    pub fn total(&self) -> usize {
        self.copied.values().sum()
    }
}

// ============================================================================
// SECTION: Copy
// ============================================================================

/// Copies every container from `source` into an empty `destination`.
///
/// # Errors
///
/// Returns [`StorageError::InvalidArgument`] when the destination already
/// holds rows, or the first read or write failure.
pub fn copy_containers(
    source: &dyn StorageConnector,
    destination: &dyn StorageConnector,
) -> Result<MigrationReport, StorageError> {
    for container in Container::ALL {
        if destination.count(container, &[])? > 0 {
            return Err(StorageError::InvalidArgument(format!(
                "{} {container} is not empty",
                destination.backend()
            )));
        }
    }
    let mut copied = BTreeMap::new();
    for container in Container::ALL {
        let rows = source.select_rows(container, &[])?;
        let count = rows.len();
        for row in rows {
            destination.insert(container, row)?;
        }
        if container.has_id() && container.id_space() == container {
            destination.reserve_ids(container, highest_issued(source, container)?)?;
        }
        copied.insert(container, count);
    }
    destination.flush()?;
    Ok(MigrationReport {
        source: source.backend(),
        target: destination.backend(),
        copied,
    })
}

/// Returns the highest ID the source has handed out for a container.
fn highest_issued(source: &dyn StorageConnector, container: Container) -> Result<i64, StorageError> {
    match source.next_id(container) {
        Ok(next) => Ok(next - 1),
        Err(StorageError::InvalidArgument(_)) => Ok(source.ids(container)?.last().copied().unwrap_or(0)),
        Err(err) => Err(err),
    }
}
