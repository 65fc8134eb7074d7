// crates/warden-store-json/tests/json_connector.rs
// ============================================================================
// Module: JSON Connector Tests
// Description: Validate the JSON backend's document layout and ID counter.
// Purpose: Ensure camelCase keys, exact decimals, and never-reused IDs.
// Dependencies: warden-store-json, warden-store-core, serde_json, proptest, tempfile
// ============================================================================

//! ## Overview
//! Exercises the JSON connector against real files. Covers the reserved
//! `currentID` counter, key naming, arbitrary-precision numbers, and
//! reload after reopen.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use proptest::prelude::*;
use tempfile::TempDir;
use warden_store_core::Condition;
use warden_store_core::Container;
use warden_store_core::Operator;
use warden_store_core::Row;
use warden_store_core::StorageConnector;
use warden_store_core::StoredValue;
use warden_store_json::CURRENT_ID_KEY;
use warden_store_json::JsonConnector;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn ban(player_id: i32, expires_at: i64) -> Row {
    let mut row = Row::new();
    row.insert("player_id".to_string(), StoredValue::from(player_id));
    row.insert("operator".to_string(), StoredValue::from("Mod"));
    row.insert("reason".to_string(), StoredValue::from("griefing"));
    row.insert("issued_at".to_string(), StoredValue::from(1_000_i64));
    row.insert("expires_at".to_string(), StoredValue::from(expires_at));
    row.insert("active".to_string(), StoredValue::Bool(true));
    row
}

fn read_json(dir: &TempDir, file: &str) -> serde_json::Value {
    let bytes = fs::read(dir.path().join(file)).expect("read json file");
    serde_json::from_slice(&bytes).expect("parse json file")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn rows_use_camel_case_keys_and_a_counter() {
    let dir = TempDir::new().unwrap();
    let connector = JsonConnector::open(dir.path()).unwrap();
    assert_eq!(connector.insert(Container::Bans, ban(5, -1)).unwrap(), Some(1));

    let document = read_json(&dir, "bans.json");
    assert_eq!(document[CURRENT_ID_KEY].as_i64(), Some(1));
    assert_eq!(document["1"]["playerID"].as_i64(), Some(5));
    assert_eq!(document["1"]["expiresAt"].as_i64(), Some(-1));
    assert_eq!(document["1"]["active"].as_bool(), Some(true));
    assert!(document["1"].get("ID").is_none());
}

#[test]
fn deleted_ids_are_never_reused() {
    let dir = TempDir::new().unwrap();
    let connector = JsonConnector::open(dir.path()).unwrap();
    for _ in 0..3 {
        connector.insert(Container::Bans, ban(1, 50)).unwrap();
    }
    assert!(connector.remove_entry(Container::Bans, 3).unwrap());
    assert_eq!(connector.next_id(Container::Bans).unwrap(), 4);
    assert_eq!(connector.insert(Container::Bans, ban(1, 50)).unwrap(), Some(4));
    assert_eq!(connector.ids(Container::Bans).unwrap(), vec![1, 2, 4]);
}

#[test]
fn upserts_raise_the_counter() {
    let dir = TempDir::new().unwrap();
    let connector = JsonConnector::open(dir.path()).unwrap();
    connector.set_data(Container::Profiles, "player_name", 40, Some("Eve".into())).unwrap();
    assert_eq!(connector.next_id(Container::Profiles).unwrap(), 41);
    assert_eq!(connector.next_id(Container::SecondaryIps).unwrap(), 41);
    let document = read_json(&dir, "profiles.json");
    assert_eq!(document[CURRENT_ID_KEY].as_i64(), Some(40));
    assert_eq!(document["40"]["playerName"].as_str(), Some("Eve"));
}

#[test]
fn counter_and_rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let connector = JsonConnector::open(dir.path()).unwrap();
        connector.insert(Container::Mutes, ban(2, 99)).unwrap();
        connector.insert(Container::Mutes, ban(3, 99)).unwrap();
        connector.remove_entry(Container::Mutes, 2).unwrap();
        connector.flush().unwrap();
    }
    let connector = JsonConnector::open(dir.path()).unwrap();
    assert_eq!(connector.next_id(Container::Mutes).unwrap(), 3);
    let expired = connector
        .count(Container::Mutes, &[Condition::new("expires_at", Operator::LessOrEqual, 99_i64)])
        .unwrap();
    assert_eq!(expired, 1);
}

#[test]
fn ip_columns_use_uppercase_tokens() {
    let dir = TempDir::new().unwrap();
    let connector = JsonConnector::open(dir.path()).unwrap();
    connector.set_data(Container::Profiles, "ip_address", 1, Some("10.0.0.1".into())).unwrap();
    connector.set_data(Container::SecondaryIps, "ip_addresses", 1, Some("10.0.0.2".into())).unwrap();
    assert_eq!(read_json(&dir, "profiles.json")["1"]["IPAddress"].as_str(), Some("10.0.0.1"));
    assert_eq!(read_json(&dir, "secondary-ips.json")["1"]["IPAddresses"].as_str(), Some("10.0.0.2"));
}

#[test]
fn clearing_a_column_removes_the_key() {
    let dir = TempDir::new().unwrap();
    let connector = JsonConnector::open(dir.path()).unwrap();
    connector.set_data(Container::Profiles, "uuid", 1, Some("abc".into())).unwrap();
    connector.set_data(Container::Profiles, "uuid", 1, None).unwrap();
    assert_eq!(connector.select(Container::Profiles, "uuid", &[Condition::equal("id", 1_i64)]).unwrap(), None);
    assert!(read_json(&dir, "profiles.json")["1"].get("UUID").is_none());
    assert_eq!(connector.ids(Container::Profiles).unwrap(), vec![1]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn bigint_values_round_trip_exactly(value in any::<i64>()) {
        let dir = TempDir::new().unwrap();
        let connector = JsonConnector::open(dir.path()).unwrap();
        connector.set_data(Container::Kicks, "issued_at", 1, Some(StoredValue::from(value))).unwrap();
        let reopened = JsonConnector::open(dir.path()).unwrap();
        let stored = reopened.select(Container::Kicks, "issued_at", &[Condition::equal("id", 1_i64)]).unwrap();
        prop_assert_eq!(stored, Some(StoredValue::from(value)));
    }
}
