//! Path-related error types.
//!
//! Provides semantic errors for path operations without exposing
//! implementation details or adapter-specific concerns.

use std::path::PathBuf;
use thiserror::Error;

use super::ensure::DirectoryRole;

/// Errors that can occur during path resolution and directory operations.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the user's cache directory.
    #[error("Cannot determine system cache directory")]
    NoCacheDir,

    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    /// Could not determine the user's config directory.
    #[error("Cannot determine system config directory")]
    NoConfigDir,

    /// A managed directory path exists but is a file.
    #[error("{role} {path} exists but is not a directory")]
    NotADirectory { role: DirectoryRole, path: PathBuf },

    /// Failed to create a managed directory.
    #[error("Failed to create {role} {path}: {reason}")]
    CreateFailed {
        role: DirectoryRole,
        path: PathBuf,
        reason: String,
    },

    /// Files cannot be written and renamed inside a managed directory.
    #[error("{role} {path} is not writable: {reason}")]
    NotWritable {
        role: DirectoryRole,
        path: PathBuf,
        reason: String,
    },

    /// A managed directory resolved to an empty path.
    #[error("{0} path cannot be empty")]
    EmptyPath(DirectoryRole),
}
