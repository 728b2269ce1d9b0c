//! Artifact records and catalog filtering.

use serde::{Deserialize, Serialize};

use crate::platform::{Platform, normalize_arch, normalize_os};

/// One downloadable binary file scoped to a platform and architecture.
///
/// Two libraries with the same name but different platform or arch are
/// distinct catalog entries; see [`Library::key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    /// File name, used as the on-disk name in the cache and install directories.
    pub name: String,
    /// Version string; compared verbatim by the update checker.
    pub version: String,
    /// Normalized OS identifier (`linux`, `darwin`, `windows`).
    pub platform: String,
    /// Normalized architecture identifier (`amd64`, `arm64`).
    pub arch: String,
    /// Download URL.
    pub url: String,
    /// Declared SHA-256 digest, lowercase hex.
    pub sha256: String,
    /// Declared size in bytes.
    pub size: u64,
}

/// Identity of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryKey {
    pub name: String,
    pub platform: String,
    pub arch: String,
}

impl Library {
    pub fn key(&self) -> LibraryKey {
        LibraryKey {
            name: self.name.clone(),
            platform: self.platform.clone(),
            arch: self.arch.clone(),
        }
    }

    /// Whether this entry targets `platform`.
    pub fn matches_platform(&self, platform: &Platform) -> bool {
        normalize_os(&self.platform) == platform.os && normalize_arch(&self.arch) == platform.arch
    }

    /// Check a computed digest against the declared one (hex, case-insensitive).
    pub fn digest_matches(&self, actual: &str) -> bool {
        self.sha256.trim().eq_ignore_ascii_case(actual.trim())
    }
}

/// Selection criteria for listing catalog entries.
///
/// Every field is optional; `None` matches anything. Platform and arch are
/// normalized before comparison so `x86_64` selects `amd64` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilter {
    pub platform: Option<String>,
    pub arch: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
}

impl LibraryFilter {
    /// Filter matching exactly the given platform.
    pub fn for_platform(platform: &Platform) -> Self {
        Self {
            platform: Some(platform.os.clone()),
            arch: Some(platform.arch.clone()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn matches(&self, library: &Library) -> bool {
        let platform_ok = self
            .platform
            .as_deref()
            .is_none_or(|p| normalize_os(p) == normalize_os(&library.platform));
        let arch_ok = self
            .arch
            .as_deref()
            .is_none_or(|a| normalize_arch(a) == normalize_arch(&library.arch));
        let name_ok = self.name.as_deref().is_none_or(|n| n == library.name);
        let version_ok = self.version.as_deref().is_none_or(|v| v == library.version);

        platform_ok && arch_ok && name_ok && version_ok
    }
}

/// Select the entries of `libraries` matching `filter`, preserving catalog order.
pub fn filter_libraries(libraries: &[Library], filter: &LibraryFilter) -> Vec<Library> {
    libraries
        .iter()
        .filter(|lib| filter.matches(lib))
        .cloned()
        .collect()
}
