// crates/warden-store/tests/backend_parity.rs
// ============================================================================
// Module: Backend Parity Tests
// Description: Run one contract suite against every backend.
// Purpose: Ensure YAML, JSON, and SQLite answer identical call sequences
//          identically.
// Dependencies: warden-store, warden-store-core, tempfile
// ============================================================================

//! ## Overview
//! Each test loops over [`common::BACKENDS`] and asserts the same observable
//! results. Differences in ID reuse are covered by the per-backend suites.

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

mod common;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bigdecimal::BigDecimal;
use warden_store_core::Condition;
use warden_store_core::ConnectorExt;
use warden_store_core::Container;
use warden_store_core::Operator;
use warden_store_core::StoredValue;

use crate::common::BACKENDS;
use crate::common::loaded;
use crate::common::row;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn values_round_trip_including_absence() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        let by_id = [Condition::equal("id", 1_i64)];
        connector.set_data(Container::Profiles, "player_name", 1, Some("Bob".into())).unwrap();
        connector.set_data(Container::Profiles, "messages_sent", 1, Some(12_i32.into())).unwrap();
        connector.set_data(Container::Profiles, "last_seen", 1, Some(i64::MAX.into())).unwrap();
        assert_eq!(
            connector.select_as::<String>(Container::Profiles, "player_name", &by_id).unwrap(),
            Some("Bob".to_string()),
            "{backend}"
        );
        assert_eq!(connector.select_as::<i32>(Container::Profiles, "messages_sent", &by_id).unwrap(), Some(12));
        assert_eq!(connector.select_as::<i64>(Container::Profiles, "last_seen", &by_id).unwrap(), Some(i64::MAX));
        assert_eq!(connector.select(Container::Profiles, "uuid", &by_id).unwrap(), None, "{backend}");
        connector.set_data(Container::Profiles, "player_name", 1, None).unwrap();
        assert_eq!(connector.select(Container::Profiles, "player_name", &by_id).unwrap(), None, "{backend}");
    }
}

#[test]
fn inserted_ids_increase() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        let mut ids = Vec::new();
        for reason in ["spam", "grief", "xray"] {
            let entry = row(&[("player_id", 1_i32.into()), ("reason", reason.into()), ("active", true.into())]);
            ids.push(connector.insert(Container::Bans, entry).unwrap().unwrap());
        }
        assert_eq!(ids, vec![1, 2, 3], "{backend}");
        assert_eq!(connector.next_id(Container::Bans).unwrap(), 4, "{backend}");
        assert_eq!(connector.ids(Container::Bans).unwrap(), vec![1, 2, 3], "{backend}");
    }
}

#[test]
fn delete_is_idempotent() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        for sent_at in [1_i64, 2, 3] {
            let entry = row(&[("player_id", 4_i32.into()), ("message", "hello".into()), ("sent_at", sent_at.into())]);
            assert_eq!(connector.insert(Container::PublicMessages, entry).unwrap(), None, "{backend}");
        }
        let stale = [Condition::new("sent_at", Operator::LessOrEqual, 2_i64)];
        assert_eq!(connector.delete(Container::PublicMessages, &stale).unwrap(), 2, "{backend}");
        assert_eq!(connector.delete(Container::PublicMessages, &stale).unwrap(), 0, "{backend}");
        assert_eq!(connector.count(Container::PublicMessages, &[]).unwrap(), 1, "{backend}");
    }
}

#[test]
fn text_equality_ignores_case() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        connector.set_data(Container::Profiles, "player_name", 1, Some("Bob".into())).unwrap();
        connector.set_data(Container::Profiles, "player_name", 2, Some("alice".into())).unwrap();
        let matching = connector.column_values_as::<i64>(Container::Profiles, "id", &[Condition::equal("player_name", "BOB")]).unwrap();
        assert_eq!(matching, vec![1], "{backend}");
        let others = connector.count(Container::Profiles, &[Condition::not_equal("player_name", "bob")]).unwrap();
        assert_eq!(others, 1, "{backend}");
    }
}

#[test]
fn numbers_compare_across_widths() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        connector.set_data(Container::Profiles, "punish_level", 1, Some(3_i16.into())).unwrap();
        let wide = StoredValue::Number(BigDecimal::from_str("3.000").unwrap());
        assert_eq!(connector.count(Container::Profiles, &[Condition::equal("punish_level", wide)]).unwrap(), 1, "{backend}");
        assert_eq!(connector.count(Container::Profiles, &[Condition::equal("punish_level", 3_i64)]).unwrap(), 1, "{backend}");
        let below = StoredValue::Number(BigDecimal::from_str("2.5").unwrap());
        assert_eq!(
            connector.count(Container::Profiles, &[Condition::new("punish_level", Operator::GreaterThan, below)]).unwrap(),
            1,
            "{backend}"
        );
    }
}

#[test]
fn ordering_on_text_never_matches() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        connector.set_data(Container::Profiles, "player_name", 1, Some("Bob".into())).unwrap();
        for operator in [Operator::LessThan, Operator::GreaterThan, Operator::LessOrEqual, Operator::GreaterOrEqual] {
            let count = connector.count(Container::Profiles, &[Condition::new("player_name", operator, "Bob")]).unwrap();
            assert_eq!(count, 0, "{backend} {operator:?}");
        }
    }
}

#[test]
fn absent_values_only_satisfy_not_equal() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        connector.set_data(Container::Profiles, "player_name", 1, Some("Bob".into())).unwrap();
        let count = |condition: Condition| connector.count(Container::Profiles, &[condition]).unwrap();
        assert_eq!(count(Condition::equal("uuid", "x")), 0, "{backend}");
        assert_eq!(count(Condition::not_equal("uuid", "x")), 1, "{backend}");
        assert_eq!(count(Condition::new("last_seen", Operator::GreaterOrEqual, 0_i64)), 0, "{backend}");
    }
}

#[test]
fn conditions_combine_with_and() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        for (player_id, active) in [(1_i32, true), (1, false), (2, true)] {
            let entry = row(&[("player_id", player_id.into()), ("reason", "x".into()), ("active", active.into())]);
            connector.insert(Container::Mutes, entry).unwrap();
        }
        let conditions = [Condition::equal("player_id", 1_i32), Condition::equal("active", true)];
        assert_eq!(connector.column_values_as::<i64>(Container::Mutes, "id", &conditions).unwrap(), vec![1], "{backend}");
        let touched = connector.update(Container::Mutes, "reason", Some("appeal".into()), &conditions).unwrap();
        assert_eq!(touched, 1, "{backend}");
        assert_eq!(
            connector.count(Container::Mutes, &[Condition::equal("reason", "APPEAL")]).unwrap(),
            1,
            "{backend}"
        );
    }
}

#[test]
fn row_values_force_the_id_first() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        connector.set_data(Container::SecondaryIps, "ip_addresses", 9, Some("10.0.0.1,10.0.0.2".into())).unwrap();
        let values = connector.row_values(Container::SecondaryIps, 9).unwrap().unwrap();
        assert_eq!(values, vec![Some(StoredValue::from(9_i64)), Some(StoredValue::from("10.0.0.1,10.0.0.2"))], "{backend}");
        assert_eq!(connector.row_values(Container::SecondaryIps, 10).unwrap(), None, "{backend}");
    }
}

#[test]
fn invalid_arguments_fail_before_io() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        let kind = |result: Result<(), warden_store_core::StorageError>| result.unwrap_err().kind();
        assert_eq!(kind(connector.remove_entry(Container::PrivateMessages, 1).map(|_| ())), "invalid_argument");
        assert_eq!(kind(connector.next_id(Container::PublicMessages).map(|_| ())), "invalid_argument");
        assert_eq!(kind(connector.select(Container::Bans, "nope", &[]).map(|_| ())), "invalid_argument");
        assert_eq!(
            kind(connector.set_data(Container::Profiles, "messages_sent", 1, Some(i64::MAX.into()))),
            "invalid_argument",
            "{backend}"
        );
        assert_eq!(kind(connector.set_data(Container::Profiles, "player_name", 1, Some(true.into()))), "invalid_argument");
        assert!(connector.ids(Container::Profiles).unwrap().is_empty(), "{backend}");
    }
}

#[test]
fn provisioning_leaves_nothing_missing() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        assert!(connector.missing_data_containers().unwrap().is_empty(), "{backend}");
        for container in Container::ALL {
            assert_eq!(connector.count(container, &[]).unwrap(), 0, "{backend} {container}");
        }
    }
}

#[test]
fn exhausted_id_space_never_overwrites_rows() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        let last = [Condition::equal("id", i64::MAX)];
        connector.set_data(Container::Bans, "reason", i64::MAX, Some("original".into())).unwrap();

        let err = connector.insert(Container::Bans, row(&[("reason", "second".into())])).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument", "{backend}");
        assert_eq!(connector.next_id(Container::Bans).unwrap_err().kind(), "invalid_argument", "{backend}");
        assert_eq!(
            connector.select_as::<String>(Container::Bans, "reason", &last).unwrap(),
            Some("original".to_string()),
            "{backend}"
        );
        assert_eq!(connector.count(Container::Bans, &[]).unwrap(), 1, "{backend}");
    }
}

#[test]
fn unique_inserts_skip_guarded_rows() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        let guard = [Condition::equal("uuid", "ABC")];
        let profile = row(&[("uuid", "abc".into()), ("player_name", "Bob".into())]);

        assert_eq!(connector.insert_unique(Container::Profiles, profile.clone(), &guard).unwrap(), Some(1));
        assert_eq!(connector.insert_unique(Container::Profiles, profile.clone(), &guard).unwrap(), None);
        assert_eq!(connector.count(Container::Profiles, &[]).unwrap(), 1, "{backend}");
        assert!(connector.insert_unique(Container::Profiles, profile, &[]).is_err());
    }
}

#[test]
fn increments_touch_the_first_matching_row() {
    for backend in BACKENDS {
        let harness = loaded(backend);
        let connector = harness.manager.connector().unwrap();
        connector.set_data(Container::Profiles, "player_name", 1, Some("Bob".into())).unwrap();
        connector.set_data(Container::Profiles, "punish_level", 2, Some(i16::MAX.into())).unwrap();
        let bob = [Condition::equal("player_name", "bob")];

        let first = connector.increment(Container::Profiles, "times_kicked", &bob).unwrap();
        assert_eq!(first, Some(StoredValue::from(1_i32)), "{backend}");
        let second = connector.increment(Container::Profiles, "times_kicked", &bob).unwrap();
        assert_eq!(second, Some(StoredValue::from(2_i32)), "{backend}");
        let nobody = [Condition::equal("player_name", "nobody")];
        assert_eq!(connector.increment(Container::Profiles, "times_kicked", &nobody).unwrap(), None);

        let full = [Condition::equal("id", 2_i64)];
        let err = connector.increment(Container::Profiles, "punish_level", &full).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument", "{backend}");
        assert_eq!(
            connector.select_as::<i16>(Container::Profiles, "punish_level", &full).unwrap(),
            Some(i16::MAX),
            "{backend}"
        );
    }
}
