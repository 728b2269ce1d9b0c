//! Upstream release listing port.

use async_trait::async_trait;

use crate::domain::Release;
use crate::error::DepsResult;
use crate::platform::Platform;

/// Source of upstream release records.
///
/// Implementations own the transport. The manifest source only sees the
/// list of releases for the requested target.
///
/// # Usage
///
/// ```ignore
/// let source: Arc<dyn ReleaseSource> = Arc::new(HttpReleaseSource::new(client, url));
/// let releases = source.list_releases(&Platform::current()).await?;
/// ```
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// List releases with artifacts for `platform`.
    ///
    /// Implementations may return artifacts for other targets as well; the
    /// caller filters.
    async fn list_releases(&self, platform: &Platform) -> DepsResult<Vec<Release>>;
}

/// In-memory release source, for tests and offline catalogs.
#[derive(Debug, Clone, Default)]
pub struct StaticReleaseSource {
    releases: Vec<Release>,
}

impl StaticReleaseSource {
    pub const fn new(releases: Vec<Release>) -> Self {
        Self { releases }
    }
}

#[async_trait]
impl ReleaseSource for StaticReleaseSource {
    async fn list_releases(&self, platform: &Platform) -> DepsResult<Vec<Release>> {
        Ok(self
            .releases
            .iter()
            .map(|release| Release {
                vendor: release.vendor.clone(),
                version: release.version.clone(),
                artifacts: release
                    .artifacts
                    .iter()
                    .filter(|a| Platform::new(&a.os, &a.arch) == *platform)
                    .cloned()
                    .collect(),
            })
            .filter(|release| !release.artifacts.is_empty())
            .collect())
    }
}
