//! Error types for dependency management.
//!
//! Every fallible operation in the workspace returns [`DepsError`]. The
//! variants are grouped into coarse [`ErrorCategory`] values so adapters can
//! decide whether to show help text, retry, or abort without matching on
//! every variant.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::paths::PathError;

/// Coarse classification of a [`DepsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request construction, connection, or non-2xx status.
    Transport,
    /// Malformed catalog or registry JSON.
    Decode,
    /// Content hash mismatch.
    Integrity,
    /// Permission problems, missing directories, failed writes.
    Filesystem,
    /// The caller cancelled the operation.
    Cancelled,
    /// The requested artifact is not cached or not installed.
    NotFound,
    /// Invalid settings or registry configuration.
    Config,
}

/// Errors that can occur during catalog, download, install and fetch operations.
#[derive(Debug, Error)]
pub enum DepsError {
    // === Transport ===
    /// The HTTP request could not be built or sent.
    #[error("Request failed for {url}: {message}")]
    Request {
        /// Target URL.
        url: String,
        /// Underlying transport message.
        message: String,
    },

    /// The server answered with a non-success status or the stream broke.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        status_code: Option<u16>,
    },

    // === Decode ===
    /// A JSON document could not be parsed.
    #[error("Failed to decode {what}: {message}")]
    Decode {
        /// What was being decoded (e.g. "cached catalog").
        what: String,
        /// Parser message.
        message: String,
    },

    // === Integrity ===
    /// Downloaded bytes hash to a different digest than the catalog declares.
    #[error("Integrity check failed for {name}: expected {expected}, got {actual}")]
    IntegrityFailed {
        /// Artifact name.
        name: String,
        /// Declared SHA-256 digest.
        expected: String,
        /// Computed SHA-256 digest.
        actual: String,
    },

    // === Filesystem ===
    /// An I/O operation failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted, including the path.
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Path resolution failed.
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// An archive could not be read or its payload could not be written.
    #[error("Failed to extract {archive}: {message}")]
    Extraction {
        /// Archive origin (URL or path).
        archive: String,
        /// Detailed error message.
        message: String,
    },

    // === Not found ===
    /// The artifact has not been downloaded into the cache.
    #[error("{name} is not in the cache. Download it first.")]
    NotCached {
        /// Artifact name.
        name: String,
    },

    /// The artifact has no entry in the installed manifest.
    #[error("{name} is not installed")]
    NotInstalled {
        /// Artifact name.
        name: String,
    },

    /// The manifest records the artifact but its file is gone.
    #[error("{name} is recorded as installed but {path} is missing")]
    MissingFile {
        /// Artifact name.
        name: String,
        /// Expected location.
        path: PathBuf,
    },

    // === Control ===
    /// The operation was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DepsError {
    /// Wrap an I/O error with a description of the attempted operation on `path`.
    pub fn io(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            context: format!("Failed to {action} {}", path.display()),
            source,
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a network error with HTTP status code.
    pub fn network_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a decode error.
    pub fn decode(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            what: what.into(),
            message: err.to_string(),
        }
    }

    /// Create an integrity check failed error.
    pub fn integrity_failed(
        name: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::IntegrityFailed {
            name: name.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an extraction error.
    pub fn extraction(archive: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Extraction {
            archive: archive.into(),
            message: err.to_string(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Request { .. } | Self::Network { .. } => ErrorCategory::Transport,
            Self::Decode { .. } => ErrorCategory::Decode,
            Self::IntegrityFailed { .. } => ErrorCategory::Integrity,
            Self::Io { .. } | Self::Path(_) | Self::Extraction { .. } => {
                ErrorCategory::Filesystem
            }
            Self::NotCached { .. } | Self::NotInstalled { .. } | Self::MissingFile { .. } => {
                ErrorCategory::NotFound
            }
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Config(_) => ErrorCategory::Config,
        }
    }

    /// Check if retrying the same operation might succeed.
    ///
    /// A status-less network failure, a 5xx or a 429 may clear up on its own.
    /// Any other status (404, 403, ...) will be answered the same way again.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Request { .. } | Self::IntegrityFailed { .. } => true,
            Self::Network { status_code, .. } => match *status_code {
                None => true,
                Some(code) => code >= 500 || code == 429,
            },
            _ => false,
        }
    }

    /// Check if this is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Convenience result type for dependency operations.
pub type DepsResult<T> = Result<T, DepsError>;
