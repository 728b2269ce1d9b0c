//! Install cached artifacts into the library directory.

use std::path::{Path, PathBuf};

use gpudeps_core::hash::file_sha256;
use gpudeps_core::{DepsError, DepsResult, Library, LocalStateStore, ManifestKind};
use tracing::{debug, info, warn};

use crate::download::{PartialFile, tmp_path, validate_file_name};

/// Mark `path` executable (`0o755`). No-op on Windows.
pub(crate) async fn set_executable(path: &Path) -> DepsResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| DepsError::io("set permissions on", path, e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Copies verified artifacts from the cache into the install directory and
/// keeps the installed manifest in step.
pub struct Installer {
    cache_dir: PathBuf,
    lib_dir: PathBuf,
    store: LocalStateStore,
}

impl Installer {
    pub const fn new(cache_dir: PathBuf, lib_dir: PathBuf, store: LocalStateStore) -> Self {
        Self {
            cache_dir,
            lib_dir,
            store,
        }
    }

    pub fn install_path(&self, name: &str) -> PathBuf {
        self.lib_dir.join(name)
    }

    /// Install a cached artifact.
    ///
    /// The cached file must hash to `library.sha256`; a cache holding another
    /// version fails with `IntegrityFailed` and nothing is recorded.
    ///
    /// The cached copy stays in place for future reinstalls. The manifest is
    /// only written after the copy and permission change have succeeded.
    pub async fn install(&self, library: &Library) -> DepsResult<PathBuf> {
        validate_file_name(&library.name)?;

        let cached = self.cache_dir.join(&library.name);
        let digest = match file_sha256(&cached).await {
            Ok(digest) => digest,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DepsError::NotCached {
                    name: library.name.clone(),
                });
            }
            Err(e) => return Err(DepsError::io("hash", &cached, e)),
        };
        if !library.digest_matches(&digest) {
            warn!(name = %library.name, version = %library.version, "Cached artifact does not match the requested digest");
            return Err(DepsError::integrity_failed(
                &library.name,
                &library.sha256,
                digest,
            ));
        }

        tokio::fs::create_dir_all(&self.lib_dir)
            .await
            .map_err(|e| DepsError::io("create library directory", &self.lib_dir, e))?;

        let dest = self.install_path(&library.name);
        let mut partial = PartialFile::new(tmp_path(&dest));

        tokio::fs::copy(&cached, partial.path())
            .await
            .map_err(|e| DepsError::io("copy into", partial.path(), e))?;
        set_executable(partial.path()).await?;
        tokio::fs::rename(partial.path(), &dest)
            .await
            .map_err(|e| DepsError::io("install", &dest, e))?;
        partial.disarm();

        self.store.record(ManifestKind::Installed, library).await?;

        info!(name = %library.name, version = %library.version, path = %dest.display(), "Installed");
        Ok(dest)
    }

    /// Remove an installed artifact and its manifest entry.
    ///
    /// A file that is already gone is tolerated; the entry is still removed.
    pub async fn uninstall(&self, name: &str) -> DepsResult<Library> {
        validate_file_name(name)?;

        let manifest = self.store.load(ManifestKind::Installed).await;
        let Some(library) = manifest.get(name).cloned() else {
            return Err(DepsError::NotInstalled {
                name: name.to_string(),
            });
        };

        let path = self.install_path(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "Removed installed file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Installed file was already missing");
            }
            Err(e) => return Err(DepsError::io("remove", &path, e)),
        }

        self.store.forget(ManifestKind::Installed, name).await?;
        info!(name, "Uninstalled");
        Ok(library)
    }

    /// Resolve the filesystem path of an installed artifact.
    pub async fn installed_path(&self, name: &str) -> DepsResult<PathBuf> {
        let manifest = self.store.load(ManifestKind::Installed).await;
        if manifest.get(name).is_none() {
            return Err(DepsError::NotInstalled {
                name: name.to_string(),
            });
        }

        let path = self.install_path(name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(DepsError::MissingFile {
                name: name.to_string(),
                path,
            });
        }
        Ok(path)
    }

    /// Re-hash an installed artifact against the digest recorded at install time.
    pub async fn verify(&self, name: &str) -> DepsResult<bool> {
        let path = self.installed_path(name).await?;
        let manifest = self.store.load(ManifestKind::Installed).await;
        let Some(library) = manifest.get(name) else {
            return Err(DepsError::NotInstalled {
                name: name.to_string(),
            });
        };

        let digest = file_sha256(&path)
            .await
            .map_err(|e| DepsError::io("hash", &path, e))?;
        Ok(library.digest_matches(&digest))
    }
}
