// crates/warden-store/src/backend.rs
// ============================================================================
// Module: Backend Construction
// Description: Opens the connector for a backend kind and provisions it.
// Purpose: Keep backend wiring in one place for the manager and migration.
// Dependencies: tracing, warden-store-config, warden-store-{core,yaml,json,sqlite}
// ============================================================================

//! ## Overview
//! [`open_connector`] turns a [`BackendKind`] plus configuration into a shared
//! connector. [`provision`] creates every container the backend reports as
//! missing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use tracing::info;
use warden_store_config::WardenStoreConfig;
use warden_store_core::BackendKind;
use warden_store_core::Container;
use warden_store_core::StorageConnector;
use warden_store_core::StorageError;
use warden_store_json::JsonConnector;
use warden_store_sqlite::SqliteConnector;
use warden_store_yaml::YamlConnector;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Connector shared between the manager and background work.
pub type SharedConnector = Arc<dyn StorageConnector>;

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Opens the connector for `kind` using the configured locations.
///
/// # Errors
///
/// Returns [`StorageError`] when the backend cannot be opened.
pub fn open_connector(config: &WardenStoreConfig, kind: BackendKind) -> Result<SharedConnector, StorageError> {
    let connector: SharedConnector = match kind {
        BackendKind::Yaml => Arc::new(YamlConnector::open(config.storage.folder.clone())?),
        BackendKind::Json => Arc::new(JsonConnector::open(config.storage.folder.clone())?),
        BackendKind::Sqlite => Arc::new(SqliteConnector::open(config.sqlite_connector_config())?),
    };
    Ok(connector)
}

/// Creates every container the connector reports as missing.
///
/// Returns the containers that were created.
///
/// # Errors
///
/// Returns [`StorageError`] when inspection or creation fails.
pub fn provision(connector: &dyn StorageConnector) -> Result<Vec<Container>, StorageError> {
    let missing = connector.missing_data_containers()?;
    for container in &missing {
        connector.create_data_container(*container)?;
        info!(backend = connector.backend().as_str(), container = container.name(), "created data container");
    }
    Ok(missing)
}
