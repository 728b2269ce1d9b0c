//! Upstream release listing records.
//!
//! A release is what the remote API hands back: one vendor/version pair with
//! a set of per-target artifacts. The manifest source flattens these into
//! catalog [`Library`](super::Library) entries.

use serde::{Deserialize, Serialize};

/// One upstream release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Vendor or product name (e.g. "nvidia-cuda-runtime").
    pub vendor: String,
    pub version: String,
    #[serde(default)]
    pub artifacts: Vec<ReleaseArtifact>,
}

/// One downloadable file of a release, for a single OS/arch target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseArtifact {
    /// File name. Falls back to the release vendor when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub os: String,
    pub arch: String,
    pub url: String,
    pub sha256: String,
    #[serde(default)]
    pub size: u64,
}
