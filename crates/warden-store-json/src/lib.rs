// crates/warden-store-json/src/lib.rs
// ============================================================================
// Module: Warden Store JSON Backend
// Description: JSON-document flat-file storage connector.
// Purpose: Store moderation data as JSON objects with exact decimals.
// Dependencies: bigdecimal, serde_json, tracing, warden-store-core
// ============================================================================

//! ## Overview
//! This crate provides [`JsonConnector`], a
//! [`warden_store_core::StorageConnector`] keeping one `.json` file per
//! container. Column keys are camelCase via [`adapt_position`], numbers are
//! arbitrary precision, and IDs come from a persisted `currentID` counter.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod connector;
pub mod document;
pub mod naming;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use connector::JsonConnector;
pub use connector::JsonFormat;
pub use document::CURRENT_ID_KEY;
pub use document::JsonDocument;
pub use naming::adapt_position;
