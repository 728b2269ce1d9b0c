//! Local state store.
//!
//! Two small JSON documents under the config directory record what has been
//! installed and what has been downloaded into the cache. Both use the
//! [`LocalManifest`] shape.
//!
//! A missing or malformed document reads as an empty manifest. Writes are
//! always a full rewrite through a sibling temp file and a rename, so a
//! reader sees either the old or the new document.
//!
//! The store takes no locks of its own; the dependency manager serializes
//! access. Two processes updating the same document concurrently can still
//! lose an update.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::{Library, LocalManifest};
use crate::error::{DepsError, DepsResult};
use crate::paths::DepsPaths;

/// Serialize `value` as pretty JSON and replace `path` atomically.
pub async fn write_json_atomic<T: Serialize + Sync>(path: &Path, value: &T) -> DepsResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DepsError::io("create directory", parent, e))?;
    }

    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| DepsError::decode(path.display().to_string(), e))?;

    let tmp = tmp_sibling(path);
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| DepsError::io("write", &tmp, e))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(DepsError::io("replace", path, e));
    }
    Ok(())
}

/// Read and parse a JSON document. `Ok(None)` when the file does not exist.
pub async fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> DepsResult<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DepsError::io("read", path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| DepsError::decode(what, e))
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Which of the two local manifests an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Installed,
    Downloaded,
}

impl ManifestKind {
    const fn label(self) -> &'static str {
        match self {
            Self::Installed => "installed manifest",
            Self::Downloaded => "downloaded manifest",
        }
    }
}

/// Reads and writes the installed and downloaded manifests.
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    installed_path: PathBuf,
    downloaded_path: PathBuf,
}

impl LocalStateStore {
    pub fn new(paths: &DepsPaths) -> Self {
        Self {
            installed_path: paths.installed_manifest_path(),
            downloaded_path: paths.downloaded_manifest_path(),
        }
    }

    fn path(&self, kind: ManifestKind) -> &Path {
        match kind {
            ManifestKind::Installed => &self.installed_path,
            ManifestKind::Downloaded => &self.downloaded_path,
        }
    }

    /// Load a manifest, treating absent or malformed documents as empty.
    pub async fn load(&self, kind: ManifestKind) -> LocalManifest {
        let path = self.path(kind);
        match read_json::<LocalManifest>(path, kind.label()).await {
            Ok(Some(manifest)) => manifest,
            Ok(None) => {
                debug!(path = %path.display(), "No {} yet", kind.label());
                LocalManifest::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable {}", kind.label());
                LocalManifest::default()
            }
        }
    }

    pub async fn save(&self, kind: ManifestKind, manifest: &LocalManifest) -> DepsResult<()> {
        write_json_atomic(self.path(kind), manifest).await
    }

    /// Read-merge-write: upsert `library` by name and persist the whole document.
    pub async fn record(&self, kind: ManifestKind, library: &Library) -> DepsResult<()> {
        let mut manifest = self.load(kind).await;
        manifest.upsert(library.clone());
        self.save(kind, &manifest).await
    }

    /// Remove the entry for `name`, persisting only when something changed.
    pub async fn forget(&self, kind: ManifestKind, name: &str) -> DepsResult<Option<Library>> {
        let mut manifest = self.load(kind).await;
        let removed = manifest.remove(name);
        if removed.is_some() {
            self.save(kind, &manifest).await?;
        }
        Ok(removed)
    }

    /// Drop the whole document.
    pub async fn reset(&self, kind: ManifestKind) -> DepsResult<()> {
        let path = self.path(kind);
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DepsError::io("remove", path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn library(name: &str, version: &str) -> Library {
        Library {
            name: name.to_string(),
            version: version.to_string(),
            platform: "linux".into(),
            arch: "amd64".into(),
            url: "https://example.invalid/lib".into(),
            sha256: "ab".repeat(32),
            size: 3,
        }
    }

    #[tokio::test]
    async fn test_absent_manifest_is_empty() {
        let dir = tempdir().unwrap();
        let store = LocalStateStore::new(&DepsPaths::under(dir.path()));

        assert!(store.load(ManifestKind::Installed).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_manifest_is_empty() {
        let dir = tempdir().unwrap();
        let paths = DepsPaths::under(dir.path());
        std::fs::create_dir_all(&paths.config_dir).unwrap();
        std::fs::write(paths.installed_manifest_path(), "{ broken").unwrap();

        let store = LocalStateStore::new(&paths);
        assert!(store.load(ManifestKind::Installed).await.is_empty());
    }

    #[tokio::test]
    async fn test_record_overwrites_by_name() {
        let dir = tempdir().unwrap();
        let store = LocalStateStore::new(&DepsPaths::under(dir.path()));

        store
            .record(ManifestKind::Installed, &library("libcuda.so.1", "1.0"))
            .await
            .unwrap();
        store
            .record(ManifestKind::Installed, &library("libcuda.so.1", "1.1"))
            .await
            .unwrap();

        let manifest = store.load(ManifestKind::Installed).await;
        assert_eq!(manifest.libraries.len(), 1);
        assert_eq!(manifest.get("libcuda.so.1").unwrap().version, "1.1");
    }

    #[tokio::test]
    async fn test_kinds_are_independent() {
        let dir = tempdir().unwrap();
        let store = LocalStateStore::new(&DepsPaths::under(dir.path()));

        store
            .record(ManifestKind::Downloaded, &library("a.so", "1"))
            .await
            .unwrap();

        assert!(store.load(ManifestKind::Installed).await.is_empty());
        assert_eq!(store.load(ManifestKind::Downloaded).await.libraries.len(), 1);
    }

    #[tokio::test]
    async fn test_forget_and_reset() {
        let dir = tempdir().unwrap();
        let store = LocalStateStore::new(&DepsPaths::under(dir.path()));
        store
            .record(ManifestKind::Downloaded, &library("a.so", "1"))
            .await
            .unwrap();

        assert!(store.forget(ManifestKind::Downloaded, "missing").await.unwrap().is_none());
        assert!(store.forget(ManifestKind::Downloaded, "a.so").await.unwrap().is_some());

        store.reset(ManifestKind::Downloaded).await.unwrap();
        store.reset(ManifestKind::Downloaded).await.unwrap();
        assert!(store.load(ManifestKind::Downloaded).await.is_empty());
    }

    #[tokio::test]
    async fn test_written_json_is_indented() {
        let dir = tempdir().unwrap();
        let paths = DepsPaths::under(dir.path());
        let store = LocalStateStore::new(&paths);
        store
            .record(ManifestKind::Installed, &library("a.so", "1"))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(paths.installed_manifest_path()).unwrap();
        assert!(raw.contains("\n  \"installed_at\""));
        assert!(!paths.config_dir.join("installed.json.tmp").exists());
    }
}
