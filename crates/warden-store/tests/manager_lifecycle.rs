// crates/warden-store/tests/manager_lifecycle.rs
// ============================================================================
// Module: Manager Lifecycle Tests
// Description: Load, unload, switch, editions, and background sweeps.
// Purpose: Ensure the manager owns exactly one connector at a time and the
//          background sweep runs on the host runtime.
// Dependencies: warden-store, warden-store-config, warden-store-core, tempfile, tokio
// ============================================================================

//! ## Overview
//! Lifecycle transitions are exercised against real backends in a temporary
//! folder; background sweeps run on tokio test runtimes.

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

use tempfile::TempDir;
use warden_store::ManagerError;
use warden_store::StorageManager;
use warden_store_config::ConfigError;
use warden_store_core::BackendKind;
use warden_store_core::Container;
use warden_store_core::Edition;
use warden_store_core::NewPunishment;
use warden_store_core::PunishmentKind;
use warden_store_core::StorageError;

use crate::common::config_for;
use crate::common::loaded;
use crate::common::loaded_with;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a punishment of `kind` for profile 1.
fn punishment(kind: PunishmentKind) -> NewPunishment {
    NewPunishment {
        kind,
        player_id: 1,
        operator: "console".to_string(),
        reason: "test".to_string(),
        issued_at: 100,
        expires_at: Some(200),
    }
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

#[test]
fn operations_require_load() {
    let dir = TempDir::new().unwrap();
    let mut manager = StorageManager::new(config_for(&dir, BackendKind::Sqlite)).unwrap();
    assert!(!manager.is_loaded());
    assert!(matches!(manager.connector(), Err(ManagerError::NotLoaded)));
    assert!(matches!(manager.sweep_now(0), Err(ManagerError::NotLoaded)));
    assert!(matches!(manager.migrate_to(BackendKind::Json), Err(ManagerError::NotLoaded)));
    assert!(!dir.path().join("warden.db").exists());

    manager.load().unwrap();
    manager.load().unwrap();
    assert!(dir.path().join("warden.db").exists());
    manager.unload().unwrap();
    assert!(!manager.is_loaded());
    manager.unload().unwrap();
}

#[test]
fn invalid_configuration_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&dir, BackendKind::Yaml);
    config.cleanup.retention_days = 0;
    assert!(matches!(StorageManager::new(config), Err(ManagerError::Config(ConfigError::Invalid(_)))));
}

#[test]
fn loading_creates_flat_files() {
    let harness = loaded(BackendKind::Yaml);
    for container in Container::ALL {
        assert!(harness.dir.path().join(container.file_name("yml")).exists(), "{container}");
    }
}

#[test]
fn switching_reloads_the_new_backend() {
    let mut harness = loaded(BackendKind::Yaml);
    harness.manager.connector().unwrap().set_data(Container::Profiles, "player_name", 1, Some("Bob".into())).unwrap();
    harness.manager.switch_backend(BackendKind::Json).unwrap();
    assert!(harness.manager.is_loaded());
    let connector = harness.manager.connector().unwrap();
    assert_eq!(connector.backend(), BackendKind::Json);
    assert_eq!(connector.count(Container::Profiles, &[]).unwrap(), 0);

    harness.manager.switch_backend(BackendKind::Yaml).unwrap();
    let connector = harness.manager.connector().unwrap();
    assert_eq!(connector.count(Container::Profiles, &[]).unwrap(), 1);
}

#[test]
fn switching_while_unloaded_stays_unloaded() {
    let dir = TempDir::new().unwrap();
    let mut manager = StorageManager::new(config_for(&dir, BackendKind::Yaml)).unwrap();
    manager.switch_backend(BackendKind::Sqlite).unwrap();
    assert_eq!(manager.backend(), BackendKind::Sqlite);
    assert!(!manager.is_loaded());
}

// ============================================================================
// SECTION: Editions
// ============================================================================

#[test]
fn standard_edition_manages_punishments() {
    let harness = loaded(BackendKind::Sqlite);
    let ledger = harness.manager.punishments().unwrap();
    let id = ledger.insert(&punishment(PunishmentKind::Mute)).unwrap();
    assert_eq!(ledger.active_for(PunishmentKind::Mute, 1).unwrap().len(), 1);
    assert!(ledger.disable(PunishmentKind::Mute, id).unwrap());
    assert!(!ledger.disable(PunishmentKind::Mute, id).unwrap());
    assert!(ledger.active_for(PunishmentKind::Mute, 1).unwrap().is_empty());

    let kick = ledger.insert(&punishment(PunishmentKind::Kick)).unwrap();
    let record = ledger.get(PunishmentKind::Kick, kick).unwrap().unwrap();
    assert!(!record.active);
    assert_eq!(record.expires_at, None);
}

#[test]
fn lite_edition_reads_but_never_writes_punishments() {
    let harness = loaded_with(BackendKind::Json, |config| config.edition = Edition::Lite);
    assert_eq!(harness.manager.edition(), Edition::Lite);
    let ledger = harness.manager.punishments().unwrap();
    let err = ledger.insert(&punishment(PunishmentKind::Ban)).unwrap_err();
    assert!(matches!(err, StorageError::Unsupported(_)));
    assert!(matches!(ledger.disable(PunishmentKind::Ban, 1), Err(StorageError::Unsupported(_))));
    assert_eq!(ledger.get(PunishmentKind::Ban, 1).unwrap(), None);
}

// ============================================================================
// SECTION: Background Sweep
// ============================================================================

#[test]
fn background_sweep_needs_a_runtime() {
    let harness = loaded(BackendKind::Yaml);
    assert!(matches!(harness.manager.clean_old_players(), Err(ManagerError::NoRuntime)));
}

#[tokio::test]
async fn background_sweep_removes_stale_profiles() {
    let harness = loaded(BackendKind::Sqlite);
    let connector = harness.manager.connector().unwrap();
    connector.set_data(Container::Profiles, "last_seen", 1, Some(1_i64.into())).unwrap();
    connector.set_data(Container::Profiles, "last_seen", 2, Some(i64::MAX.into())).unwrap();

    let report = harness.manager.clean_old_players().unwrap().await.unwrap().unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(connector.ids(Container::Profiles).unwrap(), vec![2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disabled_background_sweep_resolves_to_none() {
    let harness = loaded_with(BackendKind::Json, |config| config.cleanup.retention_days = -1);
    harness.manager.connector().unwrap().set_data(Container::Profiles, "last_seen", 1, Some(1_i64.into())).unwrap();
    assert_eq!(harness.manager.clean_old_players().unwrap().await.unwrap(), None);
    assert_eq!(harness.manager.connector().unwrap().count(Container::Profiles, &[]).unwrap(), 1);
}
