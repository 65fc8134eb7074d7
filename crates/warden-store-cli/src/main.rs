// crates/warden-store-cli/src/main.rs
// ============================================================================
// Module: Warden Store CLI Entry Point
// Description: Command dispatcher for storage administration.
// Purpose: Provision, inspect, sweep, and migrate Warden Store data offline.
// Dependencies: clap, thiserror, tracing, tracing-subscriber, warden-store
// ============================================================================

//! ## Overview
//! The `warden-store` binary operates on the same configuration file as the
//! host. Every command except `init` loads the configuration, opens the
//! selected backend through [`StorageManager`], and reports on stdout.
//! Diagnostics go to stderr through `tracing`.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::builder::PossibleValuesParser;
use clap::builder::TypedValueParser;
use thiserror::Error;
use tracing::Level;
use tracing::debug;
use warden_store::ManagerError;
use warden_store::StorageManager;
use warden_store::open_connector;
use warden_store::provision;
use warden_store_config::ConfigError;
use warden_store_config::WardenStoreConfig;
use warden_store_config::config_toml_example;
use warden_store_core::BackendKind;
use warden_store_core::Container;
use warden_store_core::StorageError;
use warden_store_core::unix_millis;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "warden-store", version, disable_help_subcommand = true)]
struct Cli {
    /// Configuration file (overrides `WARDEN_STORE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Backend to operate on instead of the configured one.
    #[arg(long, value_name = "BACKEND", value_parser = backend_parser(), global = true)]
    backend: Option<BackendKind>,
    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a configuration template with every default spelled out.
    Init,
    /// Create missing data containers.
    Provision,
    /// Print row counts per container.
    Stats,
    /// Remove profiles past the configured retention.
    Sweep(SweepCommand),
    /// Copy every container into another, empty backend.
    Migrate(MigrateCommand),
}

/// Arguments for `sweep`.
#[derive(Args, Debug)]
struct SweepCommand {
    /// Reference time in unix milliseconds (defaults to now).
    #[arg(long, value_name = "MILLIS")]
    now: Option<i64>,
}

/// Arguments for `migrate`.
#[derive(Args, Debug)]
struct MigrateCommand {
    /// Destination backend.
    #[arg(long, value_name = "BACKEND", value_parser = backend_parser())]
    to: BackendKind,
}

/// Parses backend names, listing the accepted ones in help and errors.
fn backend_parser() -> impl TypedValueParser<Value = BackendKind> {
    PossibleValuesParser::new(BackendKind::ALL.map(BackendKind::as_str)).try_map(|name| name.parse::<BackendKind>())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failures.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Storage manager failure.
    #[error(transparent)]
    Manager(#[from] ManagerError),
    /// Connector failure outside the manager.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut stdout = std::io::stdout().lock();
    match run(cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Installs the stderr log subscriber.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        let _ = writeln!(std::io::stderr(), "log subscriber already installed");
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli, out: &mut impl Write) -> CliResult<()> {
    let settings = || load_config(cli.config.as_deref(), cli.backend);
    match cli.command {
        Commands::Init => {
            out.write_all(config_toml_example().as_bytes())?;
            Ok(())
        }
        Commands::Provision => command_provision(&settings()?, out),
        Commands::Stats => command_stats(settings()?, out),
        Commands::Sweep(command) => command_sweep(settings()?, &command, out),
        Commands::Migrate(command) => command_migrate(settings()?, &command, out),
    }
}

/// Loads configuration and applies the backend override.
fn load_config(path: Option<&Path>, backend: Option<BackendKind>) -> CliResult<WardenStoreConfig> {
    let mut config = WardenStoreConfig::load(path)?;
    if let Some(backend) = backend {
        config.storage.backend = backend;
    }
    debug!(
        backend = config.storage.backend.as_str(),
        folder = %config.storage.folder.display(),
        "configuration loaded"
    );
    Ok(config)
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `provision` command.
fn command_provision(config: &WardenStoreConfig, out: &mut impl Write) -> CliResult<()> {
    let backend = config.storage.backend;
    let connector = open_connector(config, backend)?;
    let created = provision(connector.as_ref())?;
    connector.flush()?;
    if created.is_empty() {
        writeln!(out, "{backend}: all containers present")?;
    }
    for container in created {
        writeln!(out, "{backend}: created {container}")?;
    }
    Ok(())
}

/// Executes the `stats` command.
fn command_stats(config: WardenStoreConfig, out: &mut impl Write) -> CliResult<()> {
    let mut manager = loaded_manager(config)?;
    let connector = manager.connector()?;
    writeln!(out, "backend: {}", manager.backend())?;
    for container in Container::ALL {
        let rows = connector.count(container, &[])?;
        writeln!(out, "{:<18}{rows}", container.name())?;
    }
    manager.unload()?;
    Ok(())
}

/// Executes the `sweep` command.
fn command_sweep(config: WardenStoreConfig, command: &SweepCommand, out: &mut impl Write) -> CliResult<()> {
    let mut manager = loaded_manager(config)?;
    let now = command.now.unwrap_or_else(unix_millis);
    match manager.sweep_now(now)? {
        Some(report) => writeln!(
            out,
            "removed {} profiles last seen before {} ({} ms)",
            report.removed,
            report.cutoff,
            report.elapsed.as_millis()
        )?,
        None => writeln!(out, "profile retention is disabled")?,
    }
    manager.unload()?;
    Ok(())
}

/// Executes the `migrate` command.
fn command_migrate(config: WardenStoreConfig, command: &MigrateCommand, out: &mut impl Write) -> CliResult<()> {
    let mut manager = loaded_manager(config)?;
    let report = manager.migrate_to(command.to)?;
    for (container, rows) in &report.copied {
        writeln!(out, "{:<18}{rows}", container.name())?;
    }
    writeln!(out, "copied {} rows from {} to {}", report.total(), report.source, report.target)?;
    manager.unload()?;
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds and loads a manager for the configured backend.
fn loaded_manager(config: WardenStoreConfig) -> CliResult<StorageManager> {
    let mut manager = StorageManager::new(config)?;
    manager.load()?;
    Ok(manager)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = writeln!(std::io::stderr(), "{message}");
    ExitCode::FAILURE
}
