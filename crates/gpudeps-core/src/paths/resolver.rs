//! Resolved directory set.
//!
//! Components never resolve paths on their own. The composition root calls
//! [`DepsPaths::resolve`] once (or builds one by hand in tests) and hands
//! the value down.

use std::path::{Path, PathBuf};

use super::ensure::{DirectoryRole, ensure_directory};
use super::error::PathError;
use super::roots::{cache_root, config_root, lib_root};

/// All directories used by the dependency manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepsPaths {
    /// Verified downloads, keyed by artifact name.
    pub cache_dir: PathBuf,
    /// System-visible install location.
    pub lib_dir: PathBuf,
    /// Local manifests, cached catalog, settings.
    pub config_dir: PathBuf,
}

impl DepsPaths {
    /// Resolve all directories using the current environment.
    pub fn resolve() -> Result<Self, PathError> {
        Ok(Self {
            cache_dir: cache_root()?,
            lib_dir: lib_root()?,
            config_dir: config_root()?,
        })
    }

    /// Lay out all three directories under a single root.
    ///
    /// Used by tests and by `GPUDEPS_HOME`-style portable installs.
    pub fn under(root: &Path) -> Self {
        Self {
            cache_dir: root.join("cache"),
            lib_dir: root.join("lib"),
            config_dir: root.join("config"),
        }
    }

    /// Where extracted vendor diagnostic binaries live.
    pub fn binaries_dir(&self) -> PathBuf {
        self.cache_dir.join("binaries")
    }

    /// Installed-artifacts manifest.
    pub fn installed_manifest_path(&self) -> PathBuf {
        self.config_dir.join("installed.json")
    }

    /// Downloaded-but-not-installed manifest.
    pub fn downloaded_manifest_path(&self) -> PathBuf {
        self.config_dir.join("downloaded.json")
    }

    /// Cached catalog document.
    pub fn catalog_path(&self) -> PathBuf {
        self.config_dir.join("catalog.json")
    }

    /// Optional settings document.
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Optional vendor binary registry overlay.
    pub fn registry_path(&self) -> PathBuf {
        self.config_dir.join("binaries.json")
    }

    /// Create any missing directory and verify each one is writable.
    pub fn ensure_all(&self) -> Result<(), PathError> {
        ensure_directory(&self.cache_dir, DirectoryRole::Cache)?;
        ensure_directory(&self.lib_dir, DirectoryRole::Library)?;
        ensure_directory(&self.config_dir, DirectoryRole::Config)
    }
}

impl std::fmt::Display for DepsPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "cache_dir = {}", self.cache_dir.display())?;
        writeln!(f, "lib_dir = {}", self.lib_dir.display())?;
        write!(f, "config_dir = {}", self.config_dir.display())
    }
}
