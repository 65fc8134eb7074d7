// crates/warden-store-core/src/lib.rs
// ============================================================================
// Module: Warden Store Core
// Description: Storage contract, schema registry, and shared record helpers.
// Purpose: Define the backend-neutral surface of the moderation store.
// Dependencies: bigdecimal, serde, tempfile, thiserror, tracing, uuid
// ============================================================================

//! ## Overview
//! `warden-store-core` defines everything the storage backends share: the
//! closed [`Container`] registry, the [`StorageConnector`] contract, filter
//! [`Condition`]s, and the weakly typed [`StoredValue`]. The player and
//! punishment layers and the stale-player sweep are written purely against
//! the contract, so every backend behaves the same under them.
//!
//! File backends build on [`flatfile::DocumentStore`], which owns the
//! per-container locks and full-file rewrites.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod condition;
pub mod connector;
pub mod error;
pub mod field;
pub mod flatfile;
pub mod numeric;
pub mod player;
pub mod punishment;
pub mod schema;
pub mod sweep;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use condition::Condition;
pub use condition::Operator;
pub use connector::BackendKind;
pub use connector::ConnectorExt;
pub use connector::StorageConnector;
pub use error::StorageError;
pub use field::PlayerField;
pub use numeric::FieldValue;
pub use player::NewPlayer;
pub use player::PlayerIdentity;
pub use player::PlayerProfile;
pub use player::PlayerRecords;
pub use punishment::Edition;
pub use punishment::NewPunishment;
pub use punishment::PunishmentKind;
pub use punishment::PunishmentLedger;
pub use punishment::PunishmentRecord;
pub use schema::ColumnKind;
pub use schema::ColumnSpec;
pub use schema::Container;
pub use schema::ID_COLUMN;
pub use sweep::Retention;
pub use sweep::SweepReport;
pub use sweep::sweep_stale_players;
pub use sweep::unix_millis;
pub use value::Row;
pub use value::StoredValue;
