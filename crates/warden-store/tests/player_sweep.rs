// crates/warden-store/tests/player_sweep.rs
// ============================================================================
// Module: Player Sweep Tests
// Description: Validate stale profile removal on every backend.
// Purpose: Ensure only profiles strictly older than the cutoff are removed,
//          together with their secondary IP rows.
// Dependencies: warden-store, warden-store-core, tempfile
// ============================================================================

//! ## Overview
//! Profiles are written with `last_seen` one millisecond before, exactly at,
//! and one millisecond after the cutoff. The sweep is driven through
//! [`warden_store::StorageManager::sweep_now`] with a fixed clock.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

// ============================================================================
// SECTION: Imports
// ============================================================================

use warden_store_core::BackendKind;
use warden_store_core::Container;
use warden_store_core::StorageConnector;

use crate::common::BACKENDS;
use crate::common::loaded_with;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Milliseconds in one day.
const DAY_MS: i64 = 86_400_000;
/// Fixed clock used by every sweep.
const NOW: i64 = 1_700_000_000_000;
/// Cutoff for a one-day retention at [`NOW`].
const CUTOFF: i64 = NOW - DAY_MS;

/// Writes a profile with a last seen time and one secondary IP.
fn seed(connector: &dyn StorageConnector, id: i64, last_seen: i64) {
    connector.set_data(Container::Profiles, "player_name", id, Some(format!("player{id}").into())).unwrap();
    connector.set_data(Container::Profiles, "last_seen", id, Some(last_seen.into())).unwrap();
    connector.set_data(Container::SecondaryIps, "ip_addresses", id, Some(format!("10.0.0.{id}").into())).unwrap();
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn only_profiles_older_than_the_cutoff_are_removed() {
    for backend in BACKENDS {
        let harness = loaded_with(backend, |config| config.cleanup.retention_days = 1);
        let connector = harness.manager.connector().unwrap();
        seed(connector.as_ref(), 1, CUTOFF);
        seed(connector.as_ref(), 2, CUTOFF + 1);
        seed(connector.as_ref(), 3, CUTOFF - 1);

        let report = harness.manager.sweep_now(NOW).unwrap().unwrap();
        assert_eq!(report.cutoff, CUTOFF, "{backend}");
        assert_eq!(report.removed, 1, "{backend}");
        assert_eq!(connector.ids(Container::Profiles).unwrap(), vec![1, 2], "{backend}");
        assert_eq!(connector.ids(Container::SecondaryIps).unwrap(), vec![1, 2], "{backend}");

        let again = harness.manager.sweep_now(NOW).unwrap().unwrap();
        assert_eq!(again.removed, 0, "{backend}");
    }
}

#[test]
fn sweeping_the_highest_id_follows_each_id_policy() {
    for (backend, expected_next) in [(BackendKind::Yaml, 3), (BackendKind::Json, 4), (BackendKind::Sqlite, 3)] {
        let harness = loaded_with(backend, |config| config.cleanup.retention_days = 1);
        let connector = harness.manager.connector().unwrap();
        for (id, last_seen) in [(1, NOW), (2, NOW), (3, 0)] {
            let mut row = warden_store_core::Row::new();
            row.insert("last_seen".to_string(), last_seen.into());
            assert_eq!(connector.insert(Container::Profiles, row).unwrap(), Some(id));
        }
        assert_eq!(harness.manager.sweep_now(NOW).unwrap().unwrap().removed, 1);
        assert_eq!(connector.next_id(Container::Profiles).unwrap(), expected_next, "{backend}");
    }
}

#[test]
fn profiles_without_last_seen_survive() {
    for backend in BACKENDS {
        let harness = loaded_with(backend, |config| config.cleanup.retention_days = 1);
        let connector = harness.manager.connector().unwrap();
        connector.set_data(Container::Profiles, "player_name", 1, Some("ghost".into())).unwrap();
        assert_eq!(harness.manager.sweep_now(NOW).unwrap().unwrap().removed, 0, "{backend}");
        assert_eq!(connector.ids(Container::Profiles).unwrap(), vec![1], "{backend}");
    }
}

#[test]
fn disabled_retention_skips_the_sweep() {
    let harness = loaded_with(BackendKind::Yaml, |config| config.cleanup.retention_days = -1);
    let connector = harness.manager.connector().unwrap();
    seed(connector.as_ref(), 1, 0);
    assert_eq!(harness.manager.sweep_now(NOW).unwrap(), None);
    assert_eq!(connector.ids(Container::Profiles).unwrap(), vec![1]);
}
