// crates/warden-store/tests/common/mod.rs
// =============================================================================
// Module: Manager Test Helpers
// Description: Shared fixtures for storage manager integration tests.
// Purpose: Build loaded managers over each backend in a temporary folder.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use tempfile::TempDir;
use warden_store::StorageManager;
use warden_store_config::WardenStoreConfig;
use warden_store_core::BackendKind;
use warden_store_core::Row;
use warden_store_core::StoredValue;

/// Every backend, in the order parity suites run them.
pub const BACKENDS: [BackendKind; 3] = [BackendKind::Yaml, BackendKind::Json, BackendKind::Sqlite];

/// A loaded manager and the folder backing it.
pub struct Harness {
    /// Storage folder; dropped last.
    pub dir: TempDir,
    /// Loaded manager.
    pub manager: StorageManager,
}

/// Returns a configuration storing everything under `dir`.
pub fn config_for(dir: &TempDir, backend: BackendKind) -> WardenStoreConfig {
    let mut config = WardenStoreConfig::default();
    config.storage.backend = backend;
    config.storage.folder = dir.path().to_path_buf();
    config
}

/// Returns a loaded manager over `backend` with default settings.
pub fn loaded(backend: BackendKind) -> Harness {
    loaded_with(backend, |_| {})
}

/// Returns a loaded manager after adjusting its configuration.
pub fn loaded_with(backend: BackendKind, adjust: impl FnOnce(&mut WardenStoreConfig)) -> Harness {
    let dir = TempDir::new().expect("temp dir");
    let mut config = config_for(&dir, backend);
    adjust(&mut config);
    let mut manager = StorageManager::new(config).expect("valid config");
    manager.load().expect("load storage");
    Harness {
        dir,
        manager,
    }
}

/// Builds a row from column/value pairs.
pub fn row(entries: &[(&str, StoredValue)]) -> Row {
    entries.iter().map(|(column, value)| ((*column).to_string(), value.clone())).collect()
}
