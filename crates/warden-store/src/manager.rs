// crates/warden-store/src/manager.rs
// ============================================================================
// Module: Storage Manager
// Description: Owns the active connector and its lifecycle.
// Purpose: Select, load, switch, and migrate backends; schedule the sweep.
// Dependencies: thiserror, tokio, tracing, warden-store-config, warden-store-core
// ============================================================================

//! ## Overview
//! [`StorageManager`] is the context object the host creates once from
//! configuration. `load` opens the configured backend and creates missing
//! containers; `unload` flushes and drops it. The stale profile sweep runs on
//! a tokio blocking worker of the host's runtime and never reports failures
//! to the caller beyond a log line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::info;
use tracing::warn;
use warden_store_config::ConfigError;
use warden_store_config::WardenStoreConfig;
use warden_store_core::BackendKind;
use warden_store_core::Edition;
use warden_store_core::PunishmentLedger;
use warden_store_core::Retention;
use warden_store_core::StorageConnector;
use warden_store_core::StorageError;
use warden_store_core::SweepReport;
use warden_store_core::sweep_stale_players;
use warden_store_core::unix_millis;

use crate::backend::SharedConnector;
use crate::backend::open_connector;
use crate::backend::provision;
use crate::migrate::MigrationReport;
use crate::migrate::copy_containers;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Storage manager errors.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// No connector is loaded.
    #[error("storage is not loaded")]
    NotLoaded,
    /// Background work was requested outside a tokio runtime.
    #[error("no tokio runtime available for background work")]
    NoRuntime,
    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Connector failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ============================================================================
// SECTION: Manager
// ============================================================================

/// Owner of the active storage connector.
pub struct StorageManager {
    /// Validated configuration.
    config: WardenStoreConfig,
    /// Profile retention derived from the configuration.
    retention: Retention,
    /// Backend used by the next `load`.
    backend: BackendKind,
    /// Active connector, when loaded.
    connector: Option<SharedConnector>,
}

impl StorageManager {
    /// Creates an unloaded manager for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Config`] when the configuration is invalid.
    pub fn new(config: WardenStoreConfig) -> Result<Self, ManagerError> {
        config.validate()?;
        let retention = config.retention()?;
        let backend = config.storage.backend;
        Ok(Self {
            config,
            retention,
            backend,
            connector: None,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &WardenStoreConfig {
        &self.config
    }

    /// Returns the selected backend.
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Returns the configured edition.
    #[must_use]
    pub const fn edition(&self) -> Edition {
        self.config.edition
    }

    /// Returns true when a connector is loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.connector.is_some()
    }

    /// Opens the selected backend and creates missing containers.
    ///
    /// Loading an already loaded manager is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Storage`] when the backend cannot be opened or
    /// provisioned.
    pub fn load(&mut self) -> Result<(), ManagerError> {
        if self.connector.is_some() {
            return Ok(());
        }
        let connector = open_connector(&self.config, self.backend)?;
        let created = provision(connector.as_ref())?;
        info!(backend = self.backend.as_str(), created = created.len(), "storage loaded");
        self.connector = Some(connector);
        Ok(())
    }

    /// Flushes and drops the active connector.
    ///
    /// On failure the connector stays loaded.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Storage`] when flushing fails.
    pub fn unload(&mut self) -> Result<(), ManagerError> {
        let Some(connector) = self.connector.take() else {
            return Ok(());
        };
        if let Err(err) = connector.flush() {
            self.connector = Some(connector);
            return Err(err.into());
        }
        info!(backend = self.backend.as_str(), "storage unloaded");
        Ok(())
    }

    /// Selects another backend, reloading when a connector was active.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError`] when unloading or loading fails.
    pub fn switch_backend(&mut self, kind: BackendKind) -> Result<(), ManagerError> {
        if kind == self.backend {
            return Ok(());
        }
        let was_loaded = self.is_loaded();
        self.unload()?;
        info!(from = self.backend.as_str(), to = kind.as_str(), "switching storage backend");
        self.backend = kind;
        if was_loaded {
            self.load()?;
        }
        Ok(())
    }

    /// Returns the active connector.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::NotLoaded`] before `load`.
    pub fn connector(&self) -> Result<SharedConnector, ManagerError> {
        self.connector.clone().ok_or(ManagerError::NotLoaded)
    }

    /// Returns the punishment ledger for the configured edition.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::NotLoaded`] before `load`.
    pub fn punishments(&self) -> Result<PunishmentLedger<'_, dyn StorageConnector>, ManagerError> {
        let connector = self.connector.as_deref().ok_or(ManagerError::NotLoaded)?;
        Ok(PunishmentLedger::new(connector, self.config.edition))
    }

    /// Runs the stale profile sweep on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError`] when not loaded or the sweep fails.
    pub fn sweep_now(&self, now_millis: i64) -> Result<Option<SweepReport>, ManagerError> {
        let connector = self.connector.as_deref().ok_or(ManagerError::NotLoaded)?;
        Ok(sweep_stale_players(connector, self.retention, now_millis)?)
    }

    /// Dispatches the stale profile sweep onto a blocking worker.
    ///
    /// The task resolves to `None` when retention is disabled or the sweep
    /// failed; failures are logged with their kind and message.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::NotLoaded`] before `load` and
    /// [`ManagerError::NoRuntime`] outside a tokio runtime.
    pub fn clean_old_players(&self) -> Result<JoinHandle<Option<SweepReport>>, ManagerError> {
        let connector = self.connector()?;
        let handle = Handle::try_current().map_err(|_| ManagerError::NoRuntime)?;
        let retention = self.retention;
        Ok(handle.spawn_blocking(move || run_sweep(connector.as_ref(), retention, unix_millis())))
    }

    /// Copies every container into a freshly opened `target` backend.
    ///
    /// The active backend is left unchanged; call
    /// [`StorageManager::switch_backend`] afterwards to use the copy.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::NotLoaded`] before `load`, and
    /// [`ManagerError::Storage`] when `target` is the active backend, is not
    /// empty, or a copy step fails.
    pub fn migrate_to(&self, target: BackendKind) -> Result<MigrationReport, ManagerError> {
        let source = self.connector()?;
        if target == self.backend {
            return Err(StorageError::InvalidArgument(format!("{target} is already the active backend")).into());
        }
        let destination = open_connector(&self.config, target)?;
        provision(destination.as_ref())?;
        let report = copy_containers(source.as_ref(), destination.as_ref())?;
        info!(
            source = report.source.as_str(),
            target = report.target.as_str(),
            rows = report.total(),
            "storage migration complete"
        );
        Ok(report)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs one sweep pass, logging instead of returning failures.
fn run_sweep(connector: &dyn StorageConnector, retention: Retention, now_millis: i64) -> Option<SweepReport> {
    match sweep_stale_players(connector, retention, now_millis) {
        Ok(report) => report,
        Err(err) => {
            warn!(
                backend = connector.backend().as_str(),
                kind = err.kind(),
                message = err.message(),
                "player sweep failed"
            );
            None
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
