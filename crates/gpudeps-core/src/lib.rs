//! Core domain types, local state and ports for gpudeps.
//!
//! This crate has no network code. It defines what an artifact, a catalog and
//! a local manifest are, how they are persisted, where they live on disk, and
//! the [`ReleaseSource`] port the runtime uses to reach upstream.

pub mod domain;
pub mod error;
pub mod hash;
pub mod paths;
pub mod platform;
pub mod ports;
pub mod settings;
pub mod state;

// Re-export commonly used types for convenience
pub use domain::{
    Library, LibraryFilter, LibraryKey, LocalManifest, Manifest, Release, ReleaseArtifact,
    filter_libraries, synthetic_version,
};
pub use error::{DepsError, DepsResult, ErrorCategory};
pub use paths::{DepsPaths, DirectoryRole, PathError, ensure_directory};
pub use platform::{Platform, normalize_arch, normalize_os};
pub use ports::{ReleaseSource, StaticReleaseSource};
pub use settings::{Settings, SettingsError, validate_settings};
pub use state::{LocalStateStore, ManifestKind};
