//! Catalog sync and the locally cached catalog.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use gpudeps_core::state::{read_json, write_json_atomic};
use gpudeps_core::{
    DepsError, DepsResult, Manifest, Platform, ReleaseSource, normalize_arch, normalize_os,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Produces the catalog from the release source and keeps a copy on disk.
pub struct ManifestSource {
    source: Arc<dyn ReleaseSource>,
    catalog_path: PathBuf,
    platform: Platform,
    max_age: Option<chrono::Duration>,
}

impl ManifestSource {
    pub fn new(source: Arc<dyn ReleaseSource>, catalog_path: PathBuf) -> Self {
        Self {
            source,
            catalog_path,
            platform: Platform::current(),
            max_age: None,
        }
    }

    /// Target used when `sync` is called without explicit filters.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Re-sync on `fetch` once the cached catalog is older than `max_age`.
    #[must_use]
    pub const fn with_max_age(mut self, max_age: Option<chrono::Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub const fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Return the cached catalog, syncing first when none exists.
    ///
    /// The boolean is `true` when the catalog was synced by this call.
    pub async fn fetch(&self, cancel: &CancellationToken) -> DepsResult<(Manifest, bool)> {
        if let Some(cached) = read_json::<Manifest>(&self.catalog_path, "catalog").await? {
            if !self.is_stale(&cached) {
                debug!(version = %cached.version, "Using cached catalog");
                return Ok((cached, false));
            }
            info!(updated_at = %cached.updated_at, "Cached catalog is stale, re-syncing");
        }

        let manifest = self.sync(None, None, cancel).await?;
        Ok((manifest, true))
    }

    /// Pull the release listing for a target and persist it as the catalog.
    ///
    /// `None` or empty filters fall back to the configured platform. Nothing
    /// is written when the release source fails.
    pub async fn sync(
        &self,
        os: Option<&str>,
        arch: Option<&str>,
        cancel: &CancellationToken,
    ) -> DepsResult<Manifest> {
        let target = self.target(os, arch);
        debug!(target = %target, "Listing releases");

        let releases = tokio::select! {
            biased;

            () = cancel.cancelled() => return Err(DepsError::Cancelled),

            result = self.source.list_releases(&target) => result?,
        };

        let manifest = Manifest::from_releases(&releases, Utc::now());
        write_json_atomic(&self.catalog_path, &manifest).await?;

        info!(
            version = %manifest.version,
            libraries = manifest.libraries.len(),
            target = %target,
            "Catalog synced"
        );
        Ok(manifest)
    }

    fn target(&self, os: Option<&str>, arch: Option<&str>) -> Platform {
        fn pick(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|s| !s.is_empty())
        }

        Platform {
            os: pick(os).map_or_else(|| self.platform.os.clone(), normalize_os),
            arch: pick(arch).map_or_else(|| self.platform.arch.clone(), normalize_arch),
        }
    }

    fn is_stale(&self, manifest: &Manifest) -> bool {
        self.max_age
            .is_some_and(|max_age| Utc::now() - manifest.updated_at > max_age)
    }
}
