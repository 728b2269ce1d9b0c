//! Vendor tool registry: vendor → OS → architecture → archive location.
//!
//! The table is built once (builtin entries, optionally overlaid from
//! `binaries.json`) and handed to the fetcher. It is never mutated after
//! construction.
//!
//! Overlay format:
//!
//! ```json
//! { "nvidia": { "linux": { "x86_64": {
//!     "url": "https://.../nvidia-smi-linux-amd64.zip",
//!     "binary_name": "nvidia-smi",
//!     "archive_member": "bin/nvidia-smi" } } } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use gpudeps_core::state::read_json;
use gpudeps_core::{DepsError, DepsResult, Platform, normalize_arch, normalize_os};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where to find one vendor tool for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinarySpec {
    /// Zip archive URL. Empty means no binary is published for this target.
    #[serde(default)]
    pub url: String,
    /// File name the payload is stored under (without `.exe`).
    pub binary_name: String,
    /// Archive entry to extract. When absent the first file entry is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_member: Option<String>,
}

impl BinarySpec {
    pub fn new(url: impl Into<String>, binary_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            binary_name: binary_name.into(),
            archive_member: None,
        }
    }

    #[must_use]
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.archive_member = Some(member.into());
        self
    }

    pub fn is_available(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

type Table = BTreeMap<String, BTreeMap<String, BTreeMap<String, BinarySpec>>>;

fn normalize_vendor(vendor: &str) -> String {
    vendor.trim().to_lowercase()
}

/// Immutable vendor tool table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryRegistry {
    table: Table,
}

impl BinaryRegistry {
    /// Known vendor tools. No archive URLs ship by default; deployments
    /// provide them through the overlay.
    pub fn builtin() -> Self {
        [
            ("nvidia", "linux", "amd64", "nvidia-smi"),
            ("nvidia", "linux", "arm64", "nvidia-smi"),
            ("nvidia", "windows", "amd64", "nvidia-smi"),
            ("amd", "linux", "amd64", "rocm-smi"),
            ("intel", "linux", "amd64", "xpu-smi"),
            ("intel", "windows", "amd64", "xpu-smi"),
        ]
        .into_iter()
        .fold(Self::default(), |registry, (vendor, os, arch, name)| {
            registry.with_entry(vendor, os, arch, BinarySpec::new("", name))
        })
    }

    /// Parse an overlay document. Keys are normalized.
    pub fn from_json(bytes: &[u8]) -> DepsResult<Self> {
        let raw: Table =
            serde_json::from_slice(bytes).map_err(|e| DepsError::decode("binary registry", e))?;
        Ok(Self::from_table(raw))
    }

    fn from_table(raw: Table) -> Self {
        let mut registry = Self::default();
        for (vendor, by_os) in raw {
            for (os, by_arch) in by_os {
                for (arch, spec) in by_arch {
                    registry = registry.with_entry(&vendor, &os, &arch, spec);
                }
            }
        }
        registry
    }

    /// Builtin table with entries from `path` layered on top, if it exists.
    pub async fn load_with_overlay(path: &Path) -> DepsResult<Self> {
        let builtin = Self::builtin();
        match read_json::<Table>(path, "binary registry").await? {
            Some(raw) => {
                debug!(path = %path.display(), "Applying binary registry overlay");
                Ok(builtin.overlay(Self::from_table(raw)))
            }
            None => Ok(builtin),
        }
    }

    /// Entries in `other` replace matching entries in `self`.
    #[must_use]
    pub fn overlay(mut self, other: Self) -> Self {
        for (vendor, by_os) in other.table {
            let target = self.table.entry(vendor).or_default();
            for (os, by_arch) in by_os {
                target.entry(os).or_default().extend(by_arch);
            }
        }
        self
    }

    /// Add or replace one entry.
    #[must_use]
    pub fn with_entry(mut self, vendor: &str, os: &str, arch: &str, spec: BinarySpec) -> Self {
        self.table
            .entry(normalize_vendor(vendor))
            .or_default()
            .entry(normalize_os(os))
            .or_default()
            .insert(normalize_arch(arch), spec);
        self
    }

    pub fn lookup(&self, vendor: &str, platform: &Platform) -> Option<&BinarySpec> {
        self.table
            .get(&normalize_vendor(vendor))?
            .get(&platform.os)?
            .get(&platform.arch)
    }

    pub fn vendors(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lookup_normalizes_aliases() {
        let registry = BinaryRegistry::default().with_entry(
            "NVIDIA",
            "Linux",
            "x86_64",
            BinarySpec::new("https://example.invalid/a.zip", "nvidia-smi"),
        );

        let spec = registry
            .lookup(" nvidia ", &Platform::new("linux", "x64"))
            .unwrap();
        assert_eq!(spec.binary_name, "nvidia-smi");
        assert!(registry.lookup("nvidia", &Platform::new("linux", "aarch64")).is_none());
        assert!(registry.lookup("amd", &Platform::new("linux", "amd64")).is_none());
    }

    #[test]
    fn test_builtin_entries_are_unavailable() {
        let registry = BinaryRegistry::builtin();
        let spec = registry
            .lookup("nvidia", &Platform::new("linux", "amd64"))
            .unwrap();
        assert!(!spec.is_available());
        assert!(registry.vendors().any(|v| v == "intel"));
    }

    #[test]
    fn test_from_json_and_overlay() {
        let overlay = BinaryRegistry::from_json(
            br#"{ "Nvidia": { "linux": { "aarch64": {
                    "url": "https://example.invalid/smi.zip",
                    "binary_name": "nvidia-smi",
                    "archive_member": "bin/nvidia-smi" } } } }"#,
        )
        .unwrap();

        let merged = BinaryRegistry::builtin().overlay(overlay);
        let arm = merged
            .lookup("nvidia", &Platform::new("linux", "arm64"))
            .unwrap();
        assert!(arm.is_available());
        assert_eq!(arm.archive_member.as_deref(), Some("bin/nvidia-smi"));

        let amd64 = merged
            .lookup("nvidia", &Platform::new("linux", "amd64"))
            .unwrap();
        assert!(!amd64.is_available());
    }

    #[test]
    fn test_malformed_overlay_is_decode_error() {
        let err = BinaryRegistry::from_json(b"[1, 2]").unwrap_err();
        assert!(matches!(err, DepsError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_load_without_overlay_is_builtin() {
        let dir = tempdir().unwrap();
        let registry = BinaryRegistry::load_with_overlay(&dir.path().join("binaries.json"))
            .await
            .unwrap();
        assert_eq!(registry, BinaryRegistry::builtin());
    }
}
