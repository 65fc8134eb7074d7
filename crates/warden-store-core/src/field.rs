// crates/warden-store-core/src/field.rs
// ============================================================================
// Module: Warden Store Profile Fields
// Description: Statically typed descriptors for profile columns.
// Purpose: Read and write profile data without manual casting.
// Dependencies: crate::schema
// ============================================================================

//! ## Overview
//! Each [`PlayerField`] names one column of [`Container::Profiles`] and
//! carries its native value type as a type parameter, so
//! `player_data(PLAYER_NAME, ..)` yields a `String` and
//! `player_data(PUNISH_LEVEL, ..)` yields an `i16`. The set is closed;
//! [`ALL_COLUMNS`] lists it in schema order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::marker::PhantomData;

use crate::schema::Container;
use crate::schema::ID_COLUMN;

// ============================================================================
// SECTION: Field Descriptor
// ============================================================================

/// Typed accessor for one profile column.
pub struct PlayerField<T> {
    /// Logical column name.
    column: &'static str,
    /// Whether the column is a monotonically incremented counter.
    counter: bool,
    /// Native value type.
    marker: PhantomData<fn() -> T>,
}

impl<T> PlayerField<T> {
    /// Builds a descriptor.
    const fn new(column: &'static str, counter: bool) -> Self {
        Self {
            column,
            counter,
            marker: PhantomData,
        }
    }

    /// Returns the logical column name.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        self.column
    }

    /// Returns true for counter fields accepted by stat increments.
    #[must_use]
    pub const fn is_counter(&self) -> bool {
        self.counter
    }

    /// Returns true for the immutable ID field.
    #[must_use]
    pub fn is_id(&self) -> bool {
        self.column == ID_COLUMN
    }

    /// Returns the container the field belongs to.
    #[must_use]
    pub const fn container(&self) -> Container {
        Container::Profiles
    }
}

impl<T> Clone for PlayerField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PlayerField<T> {}

impl<T> fmt::Debug for PlayerField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerField")
            .field("column", &self.column)
            .field("counter", &self.counter)
            .finish()
    }
}

// ============================================================================
// SECTION: Profile Fields
// ============================================================================

/// Internal profile ID (immutable).
pub const ID: PlayerField<i32> = PlayerField::new(ID_COLUMN, false);
/// Stable external identity.
pub const UUID: PlayerField<String> = PlayerField::new("uuid", false);
/// Last known player name.
pub const PLAYER_NAME: PlayerField<String> = PlayerField::new("player_name", false);
/// Last known IP address.
pub const IP_ADDRESS: PlayerField<String> = PlayerField::new("ip_address", false);
/// First join time (unix millis).
pub const FIRST_JOIN: PlayerField<i64> = PlayerField::new("first_join", false);
/// Last seen time (unix millis).
pub const LAST_SEEN: PlayerField<i64> = PlayerField::new("last_seen", false);
/// Chat messages sent.
pub const MESSAGES_SENT: PlayerField<i32> = PlayerField::new("messages_sent", true);
/// Commands sent.
pub const COMMANDS_SENT: PlayerField<i32> = PlayerField::new("commands_sent", true);
/// Bans received.
pub const TIMES_BANNED: PlayerField<i32> = PlayerField::new("times_banned", true);
/// Mutes received.
pub const TIMES_MUTED: PlayerField<i32> = PlayerField::new("times_muted", true);
/// Warnings received.
pub const TIMES_WARNED: PlayerField<i32> = PlayerField::new("times_warned", true);
/// Kicks received.
pub const TIMES_KICKED: PlayerField<i32> = PlayerField::new("times_kicked", true);
/// Escalation level for repeat offenders.
pub const PUNISH_LEVEL: PlayerField<i16> = PlayerField::new("punish_level", false);

/// Every profile column in schema order.
pub const ALL_COLUMNS: [&str; 13] = [
    ID.column,
    UUID.column,
    PLAYER_NAME.column,
    IP_ADDRESS.column,
    FIRST_JOIN.column,
    LAST_SEEN.column,
    MESSAGES_SENT.column,
    COMMANDS_SENT.column,
    TIMES_BANNED.column,
    TIMES_MUTED.column,
    TIMES_WARNED.column,
    TIMES_KICKED.column,
    PUNISH_LEVEL.column,
];

// ============================================================================
// SECTION: Tests
// ============================================================================
