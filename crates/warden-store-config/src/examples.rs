// crates/warden-store-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starter file for operators and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for Warden Store configuration. The output is static
//! and always passes [`crate::WardenStoreConfig::validate`].

/// Returns a canonical example `warden-store.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"edition = "standard"

[storage]
backend = "yaml"
folder = "data"
table_prefix = "warden_"

[storage.sqlite]
# path = "data/warden.db"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"

[cleanup]
# -1 disables the stale profile sweep.
retention_days = 90
"#,
    )
}
