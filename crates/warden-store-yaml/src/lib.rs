// crates/warden-store-yaml/src/lib.rs
// ============================================================================
// Module: Warden Store YAML Backend
// Description: Hierarchical-config flat-file storage connector.
// Purpose: Store moderation data as human-editable YAML trees.
// Dependencies: bigdecimal, serde_yaml, thiserror, tracing, warden-store-core
// ============================================================================

//! ## Overview
//! This crate provides [`YamlConnector`], a [`warden_store_core::StorageConnector`]
//! keeping one `.yml` file per container. Rows live under their ID as
//! top-level keys and are read and written through dotted leaf paths on a
//! [`ConfigTree`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod codec;
pub mod connector;
pub mod tree;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use connector::YamlConnector;
pub use connector::YamlFormat;
pub use tree::ConfigTree;
pub use tree::TreeError;
