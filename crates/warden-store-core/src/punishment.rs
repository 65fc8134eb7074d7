// crates/warden-store-core/src/punishment.rs
// ============================================================================
// Module: Warden Store Punishment Ledger
// Description: Punishment record helpers gated by product edition.
// Purpose: Insert, update, disable, and load bans, mutes, warnings, and kicks.
// Dependencies: serde, crate::{condition, connector, error, numeric, schema, value}
// ============================================================================

//! ## Overview
//! [`PunishmentLedger`] wraps any connector with typed punishment helpers.
//! The reduced [`Edition::Lite`] keeps punishment history readable but
//! rejects every mutation with [`StorageError::Unsupported`]; the gate is an
//! edition decision and applies to every backend alike.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::condition::Condition;
use crate::connector::StorageConnector;
use crate::connector::validate_writable_column;
use crate::error::StorageError;
use crate::numeric::FieldValue;
use crate::schema::Container;
use crate::schema::ID_COLUMN;
use crate::value::Row;
use crate::value::StoredValue;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Product edition controlling which capabilities are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Edition {
    /// Full punishment management.
    #[default]
    Standard,
    /// Read-only punishment history.
    Lite,
}

/// Kind of punishment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunishmentKind {
    /// Server ban.
    Ban,
    /// Chat mute.
    Mute,
    /// Warning.
    Warning,
    /// Kick.
    Kick,
}

impl PunishmentKind {
    /// Every punishment kind.
    pub const ALL: [Self; 4] = [Self::Ban, Self::Mute, Self::Warning, Self::Kick];

    /// Returns the container holding records of this kind.
    #[must_use]
    pub const fn container(self) -> Container {
        match self {
            Self::Ban => Container::Bans,
            Self::Mute => Container::Mutes,
            Self::Warning => Container::Warnings,
            Self::Kick => Container::Kicks,
        }
    }

    /// Returns true for kinds with an expiry and an active flag.
    #[must_use]
    pub const fn is_timed(self) -> bool {
        !matches!(self, Self::Kick)
    }
}

/// A punishment about to be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPunishment {
    /// Punishment kind.
    pub kind: PunishmentKind,
    /// Punished profile ID.
    pub player_id: i32,
    /// Issuer name.
    pub operator: String,
    /// Reason text.
    pub reason: String,
    /// Issue time (unix millis).
    pub issued_at: i64,
    /// Expiry time (unix millis); `None` is permanent. Ignored for kicks.
    pub expires_at: Option<i64>,
}

/// A stored punishment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunishmentRecord {
    /// Record ID within its container.
    pub id: i64,
    /// Punishment kind.
    pub kind: PunishmentKind,
    /// Punished profile ID.
    pub player_id: i32,
    /// Issuer name.
    pub operator: String,
    /// Reason text.
    pub reason: String,
    /// Issue time (unix millis).
    pub issued_at: i64,
    /// Expiry time (unix millis), `None` when permanent or not applicable.
    pub expires_at: Option<i64>,
    /// Whether the punishment is in force. Kicks are never active.
    pub active: bool,
}

/// Stored expiry value for permanent punishments.
const PERMANENT: i64 = -1;

// ============================================================================
// SECTION: Ledger
// ============================================================================

/// Punishment helpers over a connector.
pub struct PunishmentLedger<'a, C: StorageConnector + ?Sized> {
    /// Underlying connector.
    connector: &'a C,
    /// Active edition.
    edition: Edition,
}

impl<'a, C: StorageConnector + ?Sized> PunishmentLedger<'a, C> {
    /// Creates a ledger for the given edition.
    #[must_use]
    pub const fn new(connector: &'a C, edition: Edition) -> Self {
        Self {
            connector,
            edition,
        }
    }

    /// Returns the active edition.
    #[must_use]
    pub const fn edition(&self) -> Edition {
        self.edition
    }

    /// Stores a new punishment and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unsupported`] in the lite edition.
    pub fn insert(&self, punishment: &NewPunishment) -> Result<i64, StorageError> {
        self.require_mutation("insert")?;
        let mut row = Row::new();
        row.insert("player_id".to_string(), StoredValue::from(punishment.player_id));
        row.insert("operator".to_string(), StoredValue::from(punishment.operator.as_str()));
        row.insert("reason".to_string(), StoredValue::from(punishment.reason.as_str()));
        row.insert("issued_at".to_string(), StoredValue::from(punishment.issued_at));
        if punishment.kind.is_timed() {
            row.insert(
                "expires_at".to_string(),
                StoredValue::from(punishment.expires_at.unwrap_or(PERMANENT)),
            );
            row.insert("active".to_string(), StoredValue::Bool(true));
        }
        self.connector.insert(punishment.kind.container(), row)?.ok_or_else(|| {
            StorageError::Backend("punishment insert did not allocate an id".to_string())
        })
    }

    /// Updates one column of a punishment, returning whether it exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unsupported`] in the lite edition and
    /// [`StorageError::InvalidArgument`] for unknown or ID columns.
    pub fn update(
        &self,
        kind: PunishmentKind,
        id: i64,
        column: &str,
        value: Option<StoredValue>,
    ) -> Result<bool, StorageError> {
        self.require_mutation("update")?;
        validate_writable_column(kind.container(), column)?;
        let updated =
            self.connector.update(kind.container(), column, value, &[Condition::equal(ID_COLUMN, id)])?;
        Ok(updated > 0)
    }

    /// Marks a timed punishment inactive, returning whether it was active.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unsupported`] in the lite edition and
    /// [`StorageError::InvalidArgument`] for kicks.
    pub fn disable(&self, kind: PunishmentKind, id: i64) -> Result<bool, StorageError> {
        self.require_mutation("disable")?;
        if !kind.is_timed() {
            return Err(StorageError::InvalidArgument("kicks cannot be disabled".to_string()));
        }
        let updated = self.connector.update(
            kind.container(),
            "active",
            Some(StoredValue::Bool(false)),
            &[Condition::equal(ID_COLUMN, id), Condition::equal("active", true)],
        )?;
        Ok(updated > 0)
    }

    /// Loads a punishment by ID.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails or the row is malformed.
    pub fn get(&self, kind: PunishmentKind, id: i64) -> Result<Option<PunishmentRecord>, StorageError> {
        let rows = self.connector.select_rows(kind.container(), &[Condition::equal(ID_COLUMN, id)])?;
        rows.into_iter().next().map(|row| record_from_row(kind, row)).transpose()
    }

    /// Returns the active punishments of a player, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails or a row is malformed.
    pub fn active_for(
        &self,
        kind: PunishmentKind,
        player_id: i32,
    ) -> Result<Vec<PunishmentRecord>, StorageError> {
        if !kind.is_timed() {
            return Ok(Vec::new());
        }
        let rows = self.connector.select_rows(
            kind.container(),
            &[Condition::equal("player_id", player_id), Condition::equal("active", true)],
        )?;
        let mut records =
            rows.into_iter().map(|row| record_from_row(kind, row)).collect::<Result<Vec<_>, _>>()?;
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    /// Rejects mutations outside the standard edition.
    fn require_mutation(&self, operation: &str) -> Result<(), StorageError> {
        match self.edition {
            Edition::Standard => Ok(()),
            Edition::Lite => Err(StorageError::Unsupported(format!(
                "punishment {operation} is not available in the lite edition"
            ))),
        }
    }
}

/// Decodes a punishment row.
fn record_from_row(kind: PunishmentKind, mut row: Row) -> Result<PunishmentRecord, StorageError> {
    let mut take = |column: &str| row.remove(column);
    let id = required::<i64>(take(ID_COLUMN), ID_COLUMN)?;
    let player_id = required::<i32>(take("player_id"), "player_id")?;
    let operator = take("operator").map(String::from_stored).transpose()?.unwrap_or_default();
    let reason = take("reason").map(String::from_stored).transpose()?.unwrap_or_default();
    let issued_at = required::<i64>(take("issued_at"), "issued_at")?;
    let expires_at = take("expires_at")
        .map(i64::from_stored)
        .transpose()?
        .filter(|expires_at| *expires_at != PERMANENT);
    let active = take("active").map(bool::from_stored).transpose()?.unwrap_or(false);
    Ok(PunishmentRecord {
        id,
        kind,
        player_id,
        operator,
        reason,
        issued_at,
        expires_at,
        active,
    })
}

/// Coerces a required column.
fn required<T: FieldValue>(value: Option<StoredValue>, column: &str) -> Result<T, StorageError> {
    value
        .map(T::from_stored)
        .transpose()?
        .ok_or_else(|| StorageError::Corrupt(format!("punishment row missing {column}")))
}
