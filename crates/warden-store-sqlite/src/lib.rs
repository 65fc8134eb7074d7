// crates/warden-store-sqlite/src/lib.rs
// ============================================================================
// Module: Warden Store SQLite Backend
// Description: Relational storage connector on embedded SQLite.
// Purpose: Offer the database backend alongside the flat-file connectors.
// Dependencies: bigdecimal, rusqlite, serde, tracing, warden-store-core
// ============================================================================

//! ## Overview
//! This crate provides [`SqliteConnector`], a
//! [`warden_store_core::StorageConnector`] keeping one table per container in
//! a single `SQLite` database. [`SqliteJournalMode`] and [`SqliteSyncMode`]
//! are shared with the configuration crate.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod sql;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::DEFAULT_BUSY_TIMEOUT_MS;
pub use store::DEFAULT_TABLE_PREFIX;
pub use store::SqliteConnector;
pub use store::SqliteConnectorConfig;
pub use store::SqliteJournalMode;
pub use store::SqliteSyncMode;
