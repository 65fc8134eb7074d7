// crates/warden-store-config/src/lib.rs
// ============================================================================
// Module: Warden Store Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for warden-store.toml semantics.
// Dependencies: serde, thiserror, toml, warden-store-core, warden-store-sqlite
// ============================================================================

//! ## Overview
//! `warden-store-config` defines the configuration model for Warden Store:
//! edition, backend selection, storage location, `SQLite` tuning, and the
//! stale profile retention. Validation is strict and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
