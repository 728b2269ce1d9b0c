//! Path utilities for gpudeps directories.
//!
//! This module provides the canonical resolution of the three directories the
//! dependency manager works with:
//! - Cache directory (verified downloads, extracted vendor binaries)
//! - Library install directory (system-visible artifacts)
//! - Config directory (local manifests, cached catalog, settings)
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately
//! - Components receive a resolved [`DepsPaths`] value and never consult the
//!   environment themselves

mod ensure;
mod error;
mod resolver;
mod roots;

#[cfg(test)]
mod test_utils;

// Error type
pub use error::PathError;

// Directory roots
pub use roots::{cache_root, config_root, lib_root};

// Directory operations
pub use ensure::{DirectoryRole, ensure_directory};

// Resolved directory set handed to components
pub use resolver::DepsPaths;
