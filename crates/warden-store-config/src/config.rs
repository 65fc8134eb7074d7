// crates/warden-store-config/src/config.rs
// ============================================================================
// Module: Warden Store Configuration
// Description: Configuration loading and validation for Warden Store.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, thiserror, toml, warden-store-core, warden-store-sqlite
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and falls back to defaults; whatever is present
//! is validated before use and invalid values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use warden_store_core::BackendKind;
use warden_store_core::Edition;
use warden_store_core::Retention;
use warden_store_core::sweep::RETENTION_DISABLED;
use warden_store_sqlite::DEFAULT_BUSY_TIMEOUT_MS;
use warden_store_sqlite::DEFAULT_TABLE_PREFIX;
use warden_store_sqlite::SqliteConnectorConfig;
use warden_store_sqlite::SqliteJournalMode;
use warden_store_sqlite::SqliteSyncMode;
use warden_store_sqlite::sql::is_valid_prefix;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "warden-store.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "WARDEN_STORE_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum table prefix length.
const MAX_TABLE_PREFIX_LENGTH: usize = 32;
/// Default storage folder.
const DEFAULT_STORAGE_FOLDER: &str = "data";
/// Database file name used when no explicit `SQLite` path is configured.
pub const DEFAULT_DATABASE_FILE: &str = "warden.db";
/// Default profile retention in days.
const DEFAULT_RETENTION_DAYS: i64 = 90;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Top-level Warden Store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WardenStoreConfig {
    /// Product edition.
    #[serde(default)]
    pub edition: Edition,
    /// Backend selection and location.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Stale profile cleanup.
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl WardenStoreConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path argument wins, then [`CONFIG_ENV_VAR`], then
    /// `warden-store.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        self.cleanup.validate()
    }

    /// Returns the profile retention policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `retention_days` is out of range.
    pub fn retention(&self) -> Result<Retention, ConfigError> {
        self.cleanup.retention()
    }

    /// Returns the `SQLite` database path, defaulting into the storage folder.
    #[must_use]
    pub fn sqlite_path(&self) -> PathBuf {
        self.storage
            .sqlite
            .path
            .clone()
            .unwrap_or_else(|| self.storage.folder.join(DEFAULT_DATABASE_FILE))
    }

    /// Builds the `SQLite` connector configuration.
    #[must_use]
    pub fn sqlite_connector_config(&self) -> SqliteConnectorConfig {
        SqliteConnectorConfig {
            path: self.sqlite_path(),
            table_prefix: self.storage.table_prefix.clone(),
            busy_timeout_ms: self.storage.sqlite.busy_timeout_ms,
            journal_mode: self.storage.sqlite.journal_mode,
            sync_mode: self.storage.sqlite.sync_mode,
        }
    }
}

/// Backend selection and storage location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Active backend.
    #[serde(default)]
    pub backend: BackendKind,
    /// Folder holding flat files (and the default database).
    #[serde(default = "default_storage_folder")]
    pub folder: PathBuf,
    /// Prefix for relational table names.
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    /// `SQLite` settings.
    #[serde(default)]
    pub sqlite: SqliteSettings,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            folder: default_storage_folder(),
            table_prefix: default_table_prefix(),
            sqlite: SqliteSettings::default(),
        }
    }
}

impl StorageConfig {
    /// Validates storage settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("storage.folder", &self.folder.to_string_lossy())?;
        if self.table_prefix.len() > MAX_TABLE_PREFIX_LENGTH {
            return Err(ConfigError::Invalid("storage.table_prefix exceeds max length".to_string()));
        }
        if !is_valid_prefix(&self.table_prefix) {
            return Err(ConfigError::Invalid(
                "storage.table_prefix must be ASCII alphanumeric or underscore".to_string(),
            ));
        }
        self.sqlite.validate()
    }
}

/// `SQLite` settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteSettings {
    /// Explicit database path.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl SqliteSettings {
    /// Validates `SQLite` settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("storage.sqlite.path", &path.to_string_lossy())?;
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "storage.sqlite.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stale profile cleanup settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CleanupConfig {
    /// Days since last seen before a profile is removed; `-1` disables.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl CleanupConfig {
    /// Validates cleanup settings.
    fn validate(self) -> Result<(), ConfigError> {
        self.retention().map(|_| ())
    }

    /// Converts the day count into a retention policy.
    fn retention(self) -> Result<Retention, ConfigError> {
        Retention::from_days(self.retention_days).map_err(|_| {
            ConfigError::Invalid(format!(
                "cleanup.retention_days must be {RETENTION_DISABLED} or at least 1"
            ))
        })
    }
}

/// Returns the default storage folder.
fn default_storage_folder() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_FOLDER)
}

/// Returns the default table prefix.
fn default_table_prefix() -> String {
    DEFAULT_TABLE_PREFIX.to_string()
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default retention in days.
const fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
