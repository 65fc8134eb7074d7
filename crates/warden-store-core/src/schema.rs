// crates/warden-store-core/src/schema.rs
// ============================================================================
// Module: Warden Store Schema Registry
// Description: Closed set of storage containers and their column layouts.
// Purpose: Provide compile-time table definitions shared by every backend.
// Dependencies: crate::error
// ============================================================================

//! ## Overview
//! Containers are the logical tables of the store. The set is closed and
//! defined at compile time; each container has an ordered column list and,
//! except for the two message logs, an integer `id` column at position 0.
//! Lookups by external identifier return `None` instead of failing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use crate::error::StorageError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the ID column for every ID-bearing container.
pub const ID_COLUMN: &str = "id";

// ============================================================================
// SECTION: Column Definitions
// ============================================================================

/// Value kind declared for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer (timestamps).
    BigInt,
    /// 16-bit integer.
    SmallInt,
    /// UTF-8 text.
    Text,
    /// Boolean flag.
    Boolean,
}

impl ColumnKind {
    /// Returns true when values of this kind are numeric.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::BigInt | Self::SmallInt)
    }
}

/// A single declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Logical column name (`snake_case`).
    pub name: &'static str,
    /// Declared value kind.
    pub kind: ColumnKind,
}

/// Builds a column definition.
const fn column(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
    }
}

/// Columns shared by bans, mutes, and warnings.
const TIMED_PUNISHMENT_COLUMNS: &[ColumnSpec] = &[
    column(ID_COLUMN, ColumnKind::BigInt),
    column("player_id", ColumnKind::Integer),
    column("operator", ColumnKind::Text),
    column("reason", ColumnKind::Text),
    column("issued_at", ColumnKind::BigInt),
    column("expires_at", ColumnKind::BigInt),
    column("active", ColumnKind::Boolean),
];

/// Kick columns; kicks never expire and are never active.
const KICK_COLUMNS: &[ColumnSpec] = &[
    column(ID_COLUMN, ColumnKind::BigInt),
    column("player_id", ColumnKind::Integer),
    column("operator", ColumnKind::Text),
    column("reason", ColumnKind::Text),
    column("issued_at", ColumnKind::BigInt),
];

/// Player profile columns.
const PROFILE_COLUMNS: &[ColumnSpec] = &[
    column(ID_COLUMN, ColumnKind::Integer),
    column("uuid", ColumnKind::Text),
    column("player_name", ColumnKind::Text),
    column("ip_address", ColumnKind::Text),
    column("first_join", ColumnKind::BigInt),
    column("last_seen", ColumnKind::BigInt),
    column("messages_sent", ColumnKind::Integer),
    column("commands_sent", ColumnKind::Integer),
    column("times_banned", ColumnKind::Integer),
    column("times_muted", ColumnKind::Integer),
    column("times_warned", ColumnKind::Integer),
    column("times_kicked", ColumnKind::Integer),
    column("punish_level", ColumnKind::SmallInt),
];

/// Secondary IP address columns, keyed by profile ID.
const SECONDARY_IP_COLUMNS: &[ColumnSpec] =
    &[column(ID_COLUMN, ColumnKind::Integer), column("ip_addresses", ColumnKind::Text)];

/// Public chat log columns.
const PUBLIC_MESSAGE_COLUMNS: &[ColumnSpec] = &[
    column("player_id", ColumnKind::Integer),
    column("message", ColumnKind::Text),
    column("sent_at", ColumnKind::BigInt),
];

/// Private message log columns.
const PRIVATE_MESSAGE_COLUMNS: &[ColumnSpec] = &[
    column("sender_id", ColumnKind::Integer),
    column("receiver_id", ColumnKind::Integer),
    column("message", ColumnKind::Text),
    column("sent_at", ColumnKind::BigInt),
];

// ============================================================================
// SECTION: Containers
// ============================================================================

/// Immutable definition of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Logical name (`snake_case`).
    pub name: &'static str,
    /// Ordered column list.
    pub columns: &'static [ColumnSpec],
    /// Whether column 0 is an integer row ID.
    pub has_id: bool,
}

/// Logical storage containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Container {
    /// Ban records.
    Bans,
    /// Mute records.
    Mutes,
    /// Warning records.
    Warnings,
    /// Kick records.
    Kicks,
    /// Player profiles.
    Profiles,
    /// Secondary IP addresses per profile.
    SecondaryIps,
    /// Public chat log (append-only).
    PublicMessages,
    /// Private message log (append-only).
    PrivateMessages,
}

impl Container {
    /// Every container in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Bans,
        Self::Mutes,
        Self::Warnings,
        Self::Kicks,
        Self::Profiles,
        Self::SecondaryIps,
        Self::PublicMessages,
        Self::PrivateMessages,
    ];

    /// Returns the static definition of the container.
    #[must_use]
    pub const fn spec(self) -> ContainerSpec {
        match self {
            Self::Bans => spec("bans", TIMED_PUNISHMENT_COLUMNS, true),
            Self::Mutes => spec("mutes", TIMED_PUNISHMENT_COLUMNS, true),
            Self::Warnings => spec("warnings", TIMED_PUNISHMENT_COLUMNS, true),
            Self::Kicks => spec("kicks", KICK_COLUMNS, true),
            Self::Profiles => spec("profiles", PROFILE_COLUMNS, true),
            Self::SecondaryIps => spec("secondary_ips", SECONDARY_IP_COLUMNS, true),
            Self::PublicMessages => spec("public_messages", PUBLIC_MESSAGE_COLUMNS, false),
            Self::PrivateMessages => spec("private_messages", PRIVATE_MESSAGE_COLUMNS, false),
        }
    }

    /// Returns the logical container name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.spec().name
    }

    /// Returns the ordered column list.
    #[must_use]
    pub const fn columns(self) -> &'static [ColumnSpec] {
        self.spec().columns
    }

    /// Returns true when the container has an integer ID column.
    #[must_use]
    pub const fn has_id(self) -> bool {
        self.spec().has_id
    }

    /// Returns the ID column label, or `None` for append-only logs.
    #[must_use]
    pub const fn id_column(self) -> Option<&'static str> {
        if self.has_id() { Some(ID_COLUMN) } else { None }
    }

    /// Returns the container whose ID space this container allocates from.
    #[must_use]
    pub const fn id_space(self) -> Self {
        match self {
            Self::SecondaryIps => Self::Profiles,
            other => other,
        }
    }

    /// Looks up a column definition by logical name.
    #[must_use]
    pub fn column(self, name: &str) -> Option<&'static ColumnSpec> {
        self.columns().iter().find(|column| column.name == name)
    }

    /// Returns the position of a column in schema order.
    #[must_use]
    pub fn column_index(self, name: &str) -> Option<usize> {
        self.columns().iter().position(|column| column.name == name)
    }

    /// Returns the on-disk file name for a file backend.
    #[must_use]
    pub fn file_name(self, extension: &str) -> String {
        format!("{}.{extension}", self.name().replace('_', "-"))
    }

    /// Returns the relational table name with an optional prefix.
    #[must_use]
    pub fn table_name(self, prefix: &str) -> String {
        format!("{prefix}{}", self.name())
    }

    /// Resolves a container from an external identifier.
    ///
    /// Accepts the logical name or its kebab-case form, ignoring ASCII case
    /// and surrounding whitespace.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let normalized = identifier.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|container| container.name() == normalized)
    }

    /// Resolves a container from a prefixed relational table name.
    #[must_use]
    pub fn from_table_name(prefix: &str, table: &str) -> Option<Self> {
        table.strip_prefix(prefix).and_then(Self::from_identifier)
    }

    /// Validates a column name against the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] when the column is unknown.
    pub fn require_column(self, name: &str) -> Result<&'static ColumnSpec, StorageError> {
        self.column(name).ok_or_else(|| {
            StorageError::InvalidArgument(format!("unknown column {name} in {}", self.name()))
        })
    }

    /// Validates that the container supports ID-addressed operations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for containers without an
    /// ID column.
    pub fn require_id_column(self) -> Result<&'static str, StorageError> {
        self.id_column().ok_or_else(|| {
            StorageError::InvalidArgument(format!("{} has no id column", self.name()))
        })
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds a container definition.
const fn spec(name: &'static str, columns: &'static [ColumnSpec], has_id: bool) -> ContainerSpec {
    ContainerSpec {
        name,
        columns,
        has_id,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
