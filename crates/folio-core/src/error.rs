//! Error types for Folio core operations.
//!
//! This module defines well-structured error types using `thiserror` for
//! library-level errors, while higher-level code can use `anyhow` for
//! convenient error handling.
//!
//! Scans never produce errors: unreadable folders and files are skipped and
//! cancellation is reported through [`ScanOutcome`](crate::cancel::ScanOutcome).
//! Only persistence, configuration and the single-writer guard fail upward.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using FolioError
pub type Result<T> = std::result::Result<T, FolioError>;

/// Core error types for Folio operations.
#[derive(Error, Debug)]
pub enum FolioError {
    // === Snapshot Errors ===
    /// The snapshot file is missing
    #[error("index snapshot not found at {path}")]
    SnapshotNotFound { path: PathBuf },

    /// The snapshot file exists but is corrupted or unreadable
    #[error("index snapshot is corrupted: {reason}")]
    SnapshotCorrupted { reason: String },

    /// The snapshot was written by a different format version
    #[error("index snapshot version mismatch: found {found}, expected {expected}")]
    SnapshotVersionMismatch { found: u32, expected: u32 },

    // === Index Errors ===
    /// A rebuild was requested while another one is still running
    #[error("an index rebuild is already in progress")]
    RebuildInProgress,

    // === Configuration Errors ===
    /// Configuration file parsing failed
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    // === I/O Errors ===
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// Serialization/deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl FolioError {
    /// Returns true if this error means the persisted index is unusable and a
    /// rebuild is needed.
    pub fn requires_rebuild(&self) -> bool {
        matches!(
            self,
            FolioError::SnapshotNotFound { .. }
                | FolioError::SnapshotCorrupted { .. }
                | FolioError::SnapshotVersionMismatch { .. }
        )
    }

    /// Create a snapshot corruption error
    pub fn corrupted(reason: impl Into<String>) -> Self {
        FolioError::SnapshotCorrupted {
            reason: reason.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(reason: impl Into<String>) -> Self {
        FolioError::Serialization(reason.into())
    }
}

impl From<bincode::Error> for FolioError {
    fn from(err: bincode::Error) -> Self {
        FolioError::serialization(err.to_string())
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        FolioError::serialization(err.to_string())
    }
}
