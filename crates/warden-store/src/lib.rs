// crates/warden-store/src/lib.rs
// ============================================================================
// Module: Warden Store
// Description: Storage manager over the YAML, JSON, and SQLite connectors.
// Purpose: Give the host one object that owns storage lifecycle.
// Dependencies: thiserror, tokio, tracing, warden-store-*
// ============================================================================

//! ## Overview
//! `warden-store` wires configuration to a concrete
//! [`warden_store_core::StorageConnector`]. [`StorageManager`] loads and
//! unloads the backend, hands out the connector and punishment ledger,
//! schedules the stale profile sweep, and migrates data between backends.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod backend;
pub mod manager;
pub mod migrate;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use backend::SharedConnector;
pub use backend::open_connector;
pub use backend::provision;
pub use manager::ManagerError;
pub use manager::StorageManager;
pub use migrate::MigrationReport;
pub use migrate::copy_containers;
