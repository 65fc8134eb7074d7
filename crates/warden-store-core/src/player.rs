// crates/warden-store-core/src/player.rs
// ============================================================================
// Module: Warden Store Player Records
// Description: Player-indexed convenience layer over the connector contract.
// Purpose: Address profiles by UUID or internal ID with typed fields.
// Dependencies: uuid, crate::{condition, connector, field, numeric, schema, value}
// ============================================================================

//! ## Overview
//! [`PlayerRecords`] is implemented for every [`StorageConnector`] and only
//! uses the contract, so all backends share one implementation. Profiles are
//! addressed by a [`PlayerIdentity`]; typed reads and writes go through
//! [`PlayerField`] descriptors. Secondary IP addresses live in
//! [`Container::SecondaryIps`] under the profile's ID as a comma-separated
//! list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use uuid::Uuid;

use crate::condition::Condition;
use crate::connector::ConnectorExt;
use crate::connector::StorageConnector;
use crate::error::StorageError;
use crate::field;
use crate::field::PlayerField;
use crate::numeric::FieldValue;
use crate::schema::Container;
use crate::schema::ID_COLUMN;
use crate::value::Row;
use crate::value::StoredValue;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Column of [`Container::SecondaryIps`] holding the address list.
const IP_LIST_COLUMN: &str = "ip_addresses";
/// Separator between secondary addresses.
const IP_LIST_SEPARATOR: char = ',';

// ============================================================================
// SECTION: Types
// ============================================================================

/// Way of addressing a stored player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerIdentity {
    /// Stable external identity.
    Uuid(Uuid),
    /// Internal profile ID.
    Id(i32),
}

impl PlayerIdentity {
    /// Returns the condition selecting this player's profile row.
    #[must_use]
    pub fn condition(&self) -> Condition {
        match self {
            Self::Uuid(uuid) => Condition::equal(field::UUID.column(), uuid.to_string()),
            Self::Id(id) => Condition::equal(ID_COLUMN, i64::from(*id)),
        }
    }
}

impl From<Uuid> for PlayerIdentity {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<i32> for PlayerIdentity {
    fn from(value: i32) -> Self {
        Self::Id(value)
    }
}

impl fmt::Display for PlayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(uuid) => uuid.fmt(f),
            Self::Id(id) => write!(f, "#{id}"),
        }
    }
}

/// Data required to register a new player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    /// Stable external identity.
    pub uuid: Uuid,
    /// Current player name.
    pub name: String,
    /// Current IP address.
    pub ip_address: String,
    /// Join time (unix millis), used for first join and last seen.
    pub joined_at: i64,
}

/// Identity and activity summary of a stored player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    /// Internal profile ID.
    pub id: i32,
    /// Stable external identity.
    pub uuid: Uuid,
    /// Last known name.
    pub name: String,
    /// Last known IP address.
    pub ip_address: Option<String>,
    /// First join time (unix millis).
    pub first_join: Option<i64>,
    /// Last seen time (unix millis).
    pub last_seen: Option<i64>,
}

impl PlayerProfile {
    /// Builds a profile from a stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] when identity columns are missing or malformed.
    pub fn from_row(mut row: Row) -> Result<Self, StorageError> {
        let id = take_required::<i32>(&mut row, field::ID.column())?;
        let uuid_text = take_required::<String>(&mut row, field::UUID.column())?;
        let uuid = Uuid::parse_str(&uuid_text)
            .map_err(|err| StorageError::Corrupt(format!("profile {id} uuid: {err}")))?;
        Ok(Self {
            id,
            uuid,
            name: take_optional::<String>(&mut row, field::PLAYER_NAME.column())?.unwrap_or_default(),
            ip_address: take_optional(&mut row, field::IP_ADDRESS.column())?,
            first_join: take_optional(&mut row, field::FIRST_JOIN.column())?,
            last_seen: take_optional(&mut row, field::LAST_SEEN.column())?,
        })
    }
}

/// Removes and coerces an optional column from a row.
fn take_optional<T: FieldValue>(row: &mut Row, column: &str) -> Result<Option<T>, StorageError> {
    row.remove(column).map(T::from_stored).transpose()
}

/// Removes and coerces a required column from a row.
fn take_required<T: FieldValue>(row: &mut Row, column: &str) -> Result<T, StorageError> {
    take_optional(row, column)?
        .ok_or_else(|| StorageError::Corrupt(format!("profile row missing {column}")))
}

// ============================================================================
// SECTION: Player Records
// ============================================================================

/// Player-indexed operations available on every connector.
pub trait PlayerRecords: StorageConnector {
    /// Reads a typed profile field.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the read fails or the value cannot be coerced.
    fn player_data<T: FieldValue>(
        &self,
        field: PlayerField<T>,
        identity: &PlayerIdentity,
    ) -> Result<Option<T>, StorageError> {
        self.select_as(Container::Profiles, field.column(), &[identity.condition()])
    }

    /// Writes a typed profile field, returning whether the player exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for the ID field.
    fn set_player_data<T: FieldValue>(
        &self,
        field: PlayerField<T>,
        identity: &PlayerIdentity,
        value: Option<T>,
    ) -> Result<bool, StorageError> {
        if field.is_id() {
            return Err(StorageError::InvalidArgument("player id is immutable".to_string()));
        }
        let updated = self.update(
            Container::Profiles,
            field.column(),
            value.map(FieldValue::into_stored),
            &[identity.condition()],
        )?;
        Ok(updated > 0)
    }

    /// Increments a counter field and returns the new value.
    ///
    /// Returns `None` when the player is not stored. The increment is a
    /// single connector call, so concurrent increments are never lost.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for non-counter fields or on overflow.
    fn increment_player_stat(
        &self,
        field: PlayerField<i32>,
        identity: &PlayerIdentity,
    ) -> Result<Option<i32>, StorageError> {
        if !field.is_counter() {
            return Err(StorageError::InvalidArgument(format!(
                "{} is not a counter field",
                field.column()
            )));
        }
        self.increment(Container::Profiles, field.column(), &[identity.condition()])?
            .map(i32::from_stored)
            .transpose()
    }

    /// Returns true when a profile exists for the identity.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    fn is_player_stored(&self, identity: &PlayerIdentity) -> Result<bool, StorageError> {
        self.exists(Container::Profiles, &[identity.condition()])
    }

    /// Returns true when any profile uses the address as primary or secondary IP.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    fn is_player_ip_stored(&self, ip_address: &str) -> Result<bool, StorageError> {
        if self.exists(Container::Profiles, &[Condition::equal(field::IP_ADDRESS.column(), ip_address)])? {
            return Ok(true);
        }
        Ok(!secondary_owners(self, ip_address)?.is_empty())
    }

    /// Loads a profile by internal ID.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails or the row is malformed.
    fn player(&self, id: i32) -> Result<Option<PlayerProfile>, StorageError> {
        let rows = self.select_rows(Container::Profiles, &[PlayerIdentity::Id(id).condition()])?;
        rows.into_iter().next().map(PlayerProfile::from_row).transpose()
    }

    /// Returns players whose primary IP matches, optionally including secondary IPs.
    ///
    /// Results are ordered by profile ID.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails or a row is malformed.
    fn players_by_ip(
        &self,
        ip_address: &str,
        include_secondary: bool,
    ) -> Result<Vec<PlayerProfile>, StorageError> {
        let rows = self.select_rows(
            Container::Profiles,
            &[Condition::equal(field::IP_ADDRESS.column(), ip_address)],
        )?;
        let mut players =
            rows.into_iter().map(PlayerProfile::from_row).collect::<Result<Vec<_>, _>>()?;
        if include_secondary {
            for id in secondary_owners(self, ip_address)? {
                if players.iter().any(|player| player.id == id) {
                    continue;
                }
                if let Some(player) = self.player(id)? {
                    players.push(player);
                }
            }
        }
        players.sort_by_key(|player| player.id);
        Ok(players)
    }

    /// Registers a new player and returns the allocated profile ID.
    ///
    /// The UUID check and the insert are one connector call.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] when the UUID is already
    /// stored or the profile ID space is exhausted.
    fn insert_new_player(&self, player: &NewPlayer) -> Result<i32, StorageError> {
        let mut row = Row::new();
        row.insert(field::UUID.column().to_string(), StoredValue::from(player.uuid.to_string()));
        row.insert(field::PLAYER_NAME.column().to_string(), StoredValue::from(player.name.as_str()));
        row.insert(
            field::IP_ADDRESS.column().to_string(),
            StoredValue::from(player.ip_address.as_str()),
        );
        row.insert(field::FIRST_JOIN.column().to_string(), StoredValue::from(player.joined_at));
        row.insert(field::LAST_SEEN.column().to_string(), StoredValue::from(player.joined_at));
        for counter in [
            field::MESSAGES_SENT,
            field::COMMANDS_SENT,
            field::TIMES_BANNED,
            field::TIMES_MUTED,
            field::TIMES_WARNED,
            field::TIMES_KICKED,
        ] {
            row.insert(counter.column().to_string(), StoredValue::from(0_i32));
        }
        row.insert(field::PUNISH_LEVEL.column().to_string(), StoredValue::from(0_i16));
        let guard = [PlayerIdentity::Uuid(player.uuid).condition()];
        let Some(id) = self.insert_unique(Container::Profiles, row, &guard)? else {
            return Err(StorageError::InvalidArgument(format!(
                "player {} is already stored",
                player.uuid
            )));
        };
        i32::try_from(id)
            .map_err(|_| StorageError::Corrupt(format!("profile id {id} exceeds its column")))
    }

    /// Returns the secondary IP addresses recorded for a player.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend fails.
    fn secondary_ips(&self, player_id: i32) -> Result<Vec<String>, StorageError> {
        let list = self.select_as::<String>(
            Container::SecondaryIps,
            IP_LIST_COLUMN,
            &[Condition::equal(ID_COLUMN, i64::from(player_id))],
        )?;
        Ok(list.as_deref().map(split_ip_list).unwrap_or_default())
    }

    /// Records an additional IP address for a player.
    ///
    /// Returns false when the address is already the player's primary or a
    /// recorded secondary address.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] when the player is not stored.
    fn add_secondary_ip(&self, player_id: i32, ip_address: &str) -> Result<bool, StorageError> {
        let identity = PlayerIdentity::Id(player_id);
        if !self.is_player_stored(&identity)? {
            return Err(StorageError::InvalidArgument(format!("player {identity} is not stored")));
        }
        let primary = self.player_data(field::IP_ADDRESS, &identity)?;
        if primary.as_deref().is_some_and(|primary| primary.eq_ignore_ascii_case(ip_address)) {
            return Ok(false);
        }
        let mut addresses = self.secondary_ips(player_id)?;
        if addresses.iter().any(|known| known.eq_ignore_ascii_case(ip_address)) {
            return Ok(false);
        }
        addresses.push(ip_address.to_string());
        self.set_data(
            Container::SecondaryIps,
            IP_LIST_COLUMN,
            i64::from(player_id),
            Some(StoredValue::Text(addresses.join(","))),
        )?;
        Ok(true)
    }
}

impl<C: StorageConnector + ?Sized> PlayerRecords for C {}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Splits a stored address list.
fn split_ip_list(list: &str) -> Vec<String> {
    list.split(IP_LIST_SEPARATOR)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns profile IDs whose secondary list contains the address.
fn secondary_owners<C: StorageConnector + ?Sized>(
    connector: &C,
    ip_address: &str,
) -> Result<BTreeSet<i32>, StorageError> {
    let mut owners = BTreeSet::new();
    for mut row in connector.select_rows(Container::SecondaryIps, &[])? {
        let Some(list) = take_optional::<String>(&mut row, IP_LIST_COLUMN)? else {
            continue;
        };
        if split_ip_list(&list).iter().any(|entry| entry.eq_ignore_ascii_case(ip_address)) {
            owners.insert(take_required::<i32>(&mut row, ID_COLUMN)?);
        }
    }
    Ok(owners)
}
