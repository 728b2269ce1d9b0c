//! Catalog and local manifest documents.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::library::{Library, LibraryFilter, filter_libraries};
use super::release::Release;
use crate::platform::{Platform, normalize_arch, normalize_os};

/// Catalog version tag for a catalog synthesized at `at`.
pub fn synthetic_version(at: DateTime<Utc>) -> String {
    format!("sync-{}", at.format("%Y%m%dT%H%M%SZ"))
}

/// The full list of artifacts currently available.
///
/// Persisted as `{ "version", "updated_at", "libraries": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub libraries: Vec<Library>,
}

impl Manifest {
    /// Flatten a release listing into a catalog stamped with `at`.
    ///
    /// Every release/artifact pair becomes one entry, in listing order.
    pub fn from_releases(releases: &[Release], at: DateTime<Utc>) -> Self {
        let libraries = releases
            .iter()
            .flat_map(|release| {
                release.artifacts.iter().map(move |artifact| Library {
                    name: artifact
                        .name
                        .clone()
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| release.vendor.clone()),
                    version: release.version.clone(),
                    platform: normalize_os(&artifact.os),
                    arch: normalize_arch(&artifact.arch),
                    url: artifact.url.clone(),
                    sha256: artifact.sha256.to_ascii_lowercase(),
                    size: artifact.size,
                })
            })
            .collect();

        Self {
            version: synthetic_version(at),
            updated_at: at,
            libraries,
        }
    }

    /// Entries for a single platform, in catalog order.
    pub fn for_platform(&self, platform: &Platform) -> Vec<Library> {
        filter_libraries(&self.libraries, &LibraryFilter::for_platform(platform))
    }

    /// Entries matching an arbitrary filter.
    pub fn select(&self, filter: &LibraryFilter) -> Vec<Library> {
        filter_libraries(&self.libraries, filter)
    }
}

/// On-disk record of installed (or downloaded) artifacts, keyed by name.
///
/// Persisted as `{ "installed_at", "libraries": { name: Library } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalManifest {
    pub installed_at: DateTime<Utc>,
    #[serde(default)]
    pub libraries: BTreeMap<String, Library>,
}

impl Default for LocalManifest {
    fn default() -> Self {
        Self {
            installed_at: Utc::now(),
            libraries: BTreeMap::new(),
        }
    }
}

impl LocalManifest {
    /// Insert or replace the entry for `library.name` and refresh the timestamp.
    pub fn upsert(&mut self, library: Library) {
        self.libraries.insert(library.name.clone(), library);
        self.installed_at = Utc::now();
    }

    /// Remove the entry for `name`, refreshing the timestamp when something was removed.
    pub fn remove(&mut self, name: &str) -> Option<Library> {
        let removed = self.libraries.remove(name);
        if removed.is_some() {
            self.installed_at = Utc::now();
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<&Library> {
        self.libraries.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Entries in name order.
    pub fn entries(&self) -> Vec<Library> {
        self.libraries.values().cloned().collect()
    }
}
