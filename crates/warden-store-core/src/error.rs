// crates/warden-store-core/src/error.rs
// ============================================================================
// Module: Warden Store Errors
// Description: Unified error type for every storage backend.
// Purpose: Let callers handle file and database failures through one enum.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every connector returns [`StorageError`]. File backends report disk
//! failures as [`StorageError::Io`]; the relational backend reports engine
//! failures as [`StorageError::Backend`]. Argument validation happens before
//! any I/O and surfaces as [`StorageError::InvalidArgument`]. A miss on a
//! lookup is never an error; it is an `Option::None`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Storage errors shared by every connector implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// File backend I/O failure.
    #[error("storage io error: {0}")]
    Io(String),
    /// Database engine or query failure.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// Stored data could not be decoded.
    #[error("storage corruption: {0}")]
    Corrupt(String),
    /// Caller supplied an argument the schema does not allow.
    #[error("invalid storage argument: {0}")]
    InvalidArgument(String),
    /// Capability is not available in the active edition.
    #[error("unsupported storage operation: {0}")]
    Unsupported(String),
}

impl StorageError {
    /// Returns a stable label for the error kind, used in log lines.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Backend(_) => "backend",
            Self::Corrupt(_) => "corrupt",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Unsupported(_) => "unsupported",
        }
    }

    /// Returns the error message without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Io(message)
            | Self::Backend(message)
            | Self::Corrupt(message)
            | Self::InvalidArgument(message)
            | Self::Unsupported(message) => message,
        }
    }
}
