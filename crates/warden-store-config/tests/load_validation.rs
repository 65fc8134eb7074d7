//! Loading and validation tests for warden-store-config.
// crates/warden-store-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate file loading limits and field constraints.
// Purpose: Ensure malformed or unsafe configuration fails closed.
// =============================================================================

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use warden_store_config::ConfigError;
use warden_store_config::MAX_CONFIG_FILE_SIZE;
use warden_store_config::WardenStoreConfig;

mod common;

use common::TestResult;
use common::assert_invalid;

#[test]
fn load_reads_an_explicit_path() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("warden-store.toml");
    fs::write(&path, "[storage]\nbackend = \"json\"\n").map_err(|err| err.to_string())?;
    let config = WardenStoreConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.storage.backend.as_str() != "json" {
        return Err("backend should be json".to_string());
    }
    Ok(())
}

#[test]
fn load_reports_missing_files_as_io() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    match WardenStoreConfig::load(Some(&dir.path().join("absent.toml"))) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got {}", describe(other))),
    }
}

#[test]
fn load_rejects_oversized_files() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(MAX_CONFIG_FILE_SIZE));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    assert_invalid(WardenStoreConfig::load(Some(&path)), "exceeds size limit")
}

#[test]
fn load_rejects_non_utf8() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("latin1.toml");
    fs::write(&path, [0x66, 0x6f, 0xff, 0x0a]).map_err(|err| err.to_string())?;
    assert_invalid(WardenStoreConfig::load(Some(&path)), "utf-8")
}

#[test]
fn load_rejects_overlong_path_components() -> TestResult {
    let path = PathBuf::from("a".repeat(300)).join("warden-store.toml");
    assert_invalid(WardenStoreConfig::load(Some(&path)), "component too long")
}

#[test]
fn malformed_toml_is_a_parse_error() -> TestResult {
    match WardenStoreConfig::from_toml("[storage\nbackend = ") {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {}", describe(other))),
    }
}

#[test]
fn unknown_backend_is_a_parse_error() -> TestResult {
    match WardenStoreConfig::from_toml("[storage]\nbackend = \"mongo\"\n") {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {}", describe(other))),
    }
}

#[test]
fn empty_folder_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.folder = PathBuf::from("  ");
    assert_invalid(config.validate(), "storage.folder must be non-empty")
}

#[test]
fn unsafe_table_prefix_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.table_prefix = "warden-".to_string();
    assert_invalid(config.validate(), "storage.table_prefix must be ASCII")?;
    config.storage.table_prefix = "p".repeat(64);
    assert_invalid(config.validate(), "storage.table_prefix exceeds max length")
}

#[test]
fn empty_table_prefix_is_allowed() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.table_prefix = String::new();
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn zero_busy_timeout_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.sqlite.busy_timeout_ms = 0;
    assert_invalid(config.validate(), "busy_timeout_ms must be greater than zero")
}

#[test]
fn retention_must_be_disabled_or_positive() -> TestResult {
    for days in [0, -2, -90] {
        let mut config = common::minimal_config().map_err(|err| err.to_string())?;
        config.cleanup.retention_days = days;
        assert_invalid(config.validate(), "cleanup.retention_days must be -1 or at least 1")?;
    }
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.cleanup.retention_days = 1;
    config.validate().map_err(|err| err.to_string())
}

fn describe(result: Result<WardenStoreConfig, ConfigError>) -> String {
    match result {
        Ok(_) => "a valid config".to_string(),
        Err(err) => err.to_string(),
    }
}
