//! Content-verified artifact download.
//!
//! An artifact lands in the cache directory in three steps:
//! 1. stream the body into `<name>.tmp`, hashing as it goes
//! 2. compare the SHA-256 with the catalog's declared digest
//! 3. rename the temp file onto `<name>`
//!
//! The final name is only ever produced by that rename, so it never holds a
//! partial or hash-failed file. A cached file whose digest already matches
//! is reused without touching the network.

use std::path::{Path, PathBuf};

use gpudeps_core::hash::{file_sha256, hex_digest};
use gpudeps_core::{DepsError, DepsResult, Library, LocalStateStore, ManifestKind};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::http::stream_to_file;
use crate::progress::ProgressCallback;

/// Reject names that would escape the target directory.
pub(crate) fn validate_file_name(name: &str) -> DepsResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(DepsError::Config(format!(
            "artifact name '{name}' is not a plain file name"
        )));
    }
    Ok(())
}

/// Sibling path with `.tmp` appended to the file name.
pub(crate) fn tmp_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Removes a temporary file on drop unless it has been committed.
///
/// Covers early returns, errors, and the future being dropped mid-transfer.
pub(crate) struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    pub(crate) const fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) const fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.armed {
            match std::fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "Removed partial file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove partial file"),
            }
        }
    }
}

/// Streams catalog artifacts into the cache directory.
pub struct Downloader {
    client: Client,
    cache_dir: PathBuf,
    store: LocalStateStore,
}

impl Downloader {
    pub const fn new(client: Client, cache_dir: PathBuf, store: LocalStateStore) -> Self {
        Self {
            client,
            cache_dir,
            store,
        }
    }

    /// Where `library` lives once cached.
    pub fn cached_path(&self, library: &Library) -> PathBuf {
        self.cache_dir.join(&library.name)
    }

    /// Whether a file matching the declared digest is already cached.
    pub async fn is_cached(&self, library: &Library) -> bool {
        let dest = self.cached_path(library);
        match file_sha256(&dest).await {
            Ok(digest) => library.digest_matches(&digest),
            Err(_) => false,
        }
    }

    /// Download and verify `library`, returning its cache path.
    ///
    /// `progress` receives (`bytes_so_far`, `declared_size`) once per read
    /// buffer. Cancelling `cancel` aborts the transfer and discards the
    /// temp file; a previously committed artifact is left as it was.
    pub async fn download(
        &self,
        library: &Library,
        progress: Option<ProgressCallback<'_>>,
        cancel: &CancellationToken,
    ) -> DepsResult<PathBuf> {
        validate_file_name(&library.name)?;

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| DepsError::io("create cache directory", &self.cache_dir, e))?;

        let dest = self.cached_path(library);
        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            match file_sha256(&dest).await {
                Ok(digest) if library.digest_matches(&digest) => {
                    debug!(name = %library.name, "Cached artifact verified, skipping download");
                    self.store.record(ManifestKind::Downloaded, library).await?;
                    return Ok(dest);
                }
                Ok(digest) => {
                    debug!(name = %library.name, cached = %digest, "Cached artifact is stale");
                }
                Err(e) => {
                    warn!(name = %library.name, error = %e, "Cannot hash cached artifact");
                }
            }
        }

        info!(name = %library.name, version = %library.version, url = %library.url, "Downloading");

        let mut partial = PartialFile::new(tmp_path(&dest));
        let mut hasher = Sha256::new();
        let total = library.size;

        stream_to_file(
            &self.client,
            &library.url,
            partial.path(),
            cancel,
            |chunk, downloaded| {
                hasher.update(chunk);
                if let Some(cb) = progress {
                    cb(downloaded, total);
                }
            },
        )
        .await?;

        let actual = hex_digest(hasher);
        if !library.digest_matches(&actual) {
            warn!(name = %library.name, expected = %library.sha256, actual = %actual, "Checksum mismatch");
            return Err(DepsError::integrity_failed(
                &library.name,
                &library.sha256,
                actual,
            ));
        }

        tokio::fs::rename(partial.path(), &dest)
            .await
            .map_err(|e| DepsError::io("commit", &dest, e))?;
        partial.disarm();

        self.store.record(ManifestKind::Downloaded, library).await?;

        info!(name = %library.name, path = %dest.display(), "Artifact cached");
        Ok(dest)
    }
}
