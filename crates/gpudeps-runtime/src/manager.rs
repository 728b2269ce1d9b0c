//! Dependency manager facade.
//!
//! Owns the shared state (cache directory, install directory and the local
//! manifests) and serializes access to it with one reader/writer lock.
//! Anything that writes to disk takes the lock exclusively; listings and path
//! lookups take it shared. The component types below never lock, so a
//! public method holds the guard for its whole duration without re-entry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gpudeps_core::{
    DepsError, DepsPaths, DepsResult, Library, LibraryFilter, LocalStateStore, Manifest,
    ManifestKind, Platform, ReleaseSource, Settings,
};
use reqwest::Client;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::binaries::{BinaryFetcher, BinaryRegistry};
use crate::download::Downloader;
use crate::http::{HttpReleaseSource, build_client};
use crate::install::Installer;
use crate::manifest::ManifestSource;
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::update::{BatchOutcome, pending_updates};

pub struct DependencyManager {
    paths: DepsPaths,
    platform: Platform,
    store: LocalStateStore,
    manifests: ManifestSource,
    downloader: Downloader,
    installer: Installer,
    binaries: BinaryFetcher,
    lock: RwLock<()>,
}

impl DependencyManager {
    /// Wire the components from explicit collaborators.
    pub fn new(
        paths: DepsPaths,
        source: Arc<dyn ReleaseSource>,
        client: Client,
        settings: &Settings,
        registry: Arc<BinaryRegistry>,
    ) -> Self {
        let store = LocalStateStore::new(&paths);
        let manifests = ManifestSource::new(source, paths.catalog_path())
            .with_max_age(settings.catalog_max_age());
        let downloader = Downloader::new(client.clone(), paths.cache_dir.clone(), store.clone());
        let installer = Installer::new(
            paths.cache_dir.clone(),
            paths.lib_dir.clone(),
            store.clone(),
        );
        let binaries = BinaryFetcher::new(client, registry, paths.binaries_dir());

        Self {
            platform: Platform::current(),
            paths,
            store,
            manifests,
            downloader,
            installer,
            binaries,
            lock: RwLock::new(()),
        }
    }

    /// Production wiring: HTTP release index, settings-driven client and the
    /// registry overlay from the config directory.
    pub async fn open(paths: DepsPaths, settings: &Settings) -> DepsResult<Self> {
        paths.ensure_all()?;
        let client = build_client(settings)?;
        let source = Arc::new(HttpReleaseSource::new(
            client.clone(),
            settings.effective_release_index_url(),
        ));
        let registry = BinaryRegistry::load_with_overlay(&paths.registry_path()).await?;
        debug!(paths = %paths, "Opening dependency manager");
        Ok(Self::new(paths, source, client, settings, Arc::new(registry)))
    }

    /// Target platform for update checks and default catalog syncs.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.manifests = self.manifests.with_platform(platform.clone());
        self.platform = platform;
        self
    }

    pub const fn paths(&self) -> &DepsPaths {
        &self.paths
    }

    pub const fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Cached catalog, syncing when none exists yet (or it has expired).
    pub async fn fetch_manifest(&self, cancel: &CancellationToken) -> DepsResult<(Manifest, bool)> {
        let _guard = self.lock.write().await;
        self.manifests.fetch(cancel).await
    }

    pub async fn sync_manifest(
        &self,
        os: Option<&str>,
        arch: Option<&str>,
        cancel: &CancellationToken,
    ) -> DepsResult<Manifest> {
        let _guard = self.lock.write().await;
        self.manifests.sync(os, arch, cancel).await
    }

    /// Catalog entries matching `filter`.
    pub async fn list_libraries(
        &self,
        filter: &LibraryFilter,
        cancel: &CancellationToken,
    ) -> DepsResult<Vec<Library>> {
        let _guard = self.lock.write().await;
        let (manifest, _) = self.manifests.fetch(cancel).await?;
        Ok(manifest.select(filter))
    }

    pub async fn download(
        &self,
        library: &Library,
        progress: Option<ProgressCallback<'_>>,
        cancel: &CancellationToken,
    ) -> DepsResult<PathBuf> {
        let _guard = self.lock.write().await;
        self.downloader.download(library, progress, cancel).await
    }

    pub async fn install(&self, library: &Library) -> DepsResult<PathBuf> {
        let _guard = self.lock.write().await;
        self.installer.install(library).await
    }

    pub async fn uninstall(&self, name: &str) -> DepsResult<Library> {
        let _guard = self.lock.write().await;
        self.installer.uninstall(name).await
    }

    pub async fn list_installed(&self) -> Vec<Library> {
        let _guard = self.lock.read().await;
        self.store.load(ManifestKind::Installed).await.entries()
    }

    pub async fn list_downloaded(&self) -> Vec<Library> {
        let _guard = self.lock.read().await;
        self.store.load(ManifestKind::Downloaded).await.entries()
    }

    pub async fn installed_path(&self, name: &str) -> DepsResult<PathBuf> {
        let _guard = self.lock.read().await;
        self.installer.installed_path(name).await
    }

    pub async fn verify_installed(&self, name: &str) -> DepsResult<bool> {
        let _guard = self.lock.read().await;
        self.installer.verify(name).await
    }

    /// Catalog entries for this platform that are missing locally or carry
    /// a different version. Local state is only read.
    pub async fn check_updates(&self, cancel: &CancellationToken) -> DepsResult<Vec<Library>> {
        let _guard = self.lock.write().await;
        let (manifest, _) = self.manifests.fetch(cancel).await?;
        let installed = self.store.load(ManifestKind::Installed).await;
        let updates = pending_updates(&manifest.for_platform(&self.platform), &installed);
        debug!(count = updates.len(), platform = %self.platform, "Update check complete");
        Ok(updates)
    }

    /// Download and install each library in turn.
    ///
    /// A failed item does not stop the batch. Once `cancel` fires, every
    /// remaining item is reported as cancelled.
    pub async fn upgrade(
        &self,
        libraries: &[Library],
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        let _guard = self.lock.write().await;
        let mut outcome = BatchOutcome::default();

        for library in libraries {
            if cancel.is_cancelled() {
                outcome.failed.push((library.clone(), DepsError::Cancelled));
                continue;
            }

            reporter.start(&format!("Downloading {}", library.name), Some(library.size));
            let on_progress = |done: u64, total: u64| reporter.update(done, Some(total));

            let result = match self
                .downloader
                .download(library, Some(&on_progress), cancel)
                .await
            {
                Ok(_) => self.installer.install(library).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(path) => {
                    reporter.finish(&format!("{} {} installed", library.name, library.version));
                    debug!(path = %path.display(), "Upgrade item done");
                    outcome.succeeded.push(library.clone());
                }
                Err(e) => {
                    reporter.finish_with_error(&format!("{}: {e}", library.name));
                    warn!(name = %library.name, error = %e, "Upgrade item failed");
                    outcome.failed.push((library.clone(), e));
                }
            }
        }

        info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Upgrade finished"
        );
        outcome
    }

    /// Remove everything under the cache directory.
    ///
    /// A missing cache directory is not an error and changes nothing. The
    /// downloaded manifest only describes cache contents, so it is reset
    /// along with the files.
    pub async fn clean_cache(&self) -> DepsResult<()> {
        let _guard = self.lock.write().await;
        let cache_dir = &self.paths.cache_dir;

        if !tokio::fs::try_exists(cache_dir).await.unwrap_or(false) {
            debug!(path = %cache_dir.display(), "Cache directory does not exist");
            return Ok(());
        }

        let removed = clear_directory(cache_dir)
            .await
            .map_err(|e| DepsError::io("clean", cache_dir, e))?;

        self.store.reset(ManifestKind::Downloaded).await?;
        info!(path = %cache_dir.display(), entries = removed, "Cache cleaned");
        Ok(())
    }

    /// Make sure a vendor diagnostic tool is present. `Ok(None)` when no
    /// binary is published for the vendor on the requested target.
    pub async fn ensure_binary(
        &self,
        vendor: &str,
        os: Option<&str>,
        arch: Option<&str>,
        cancel: &CancellationToken,
    ) -> DepsResult<Option<PathBuf>> {
        self.binaries.ensure(vendor, os, arch, cancel).await
    }
}

/// Delete every entry inside `dir`, keeping `dir` itself.
async fn clear_directory(dir: &Path) -> std::io::Result<usize> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
        removed += 1;
    }
    Ok(removed)
}
