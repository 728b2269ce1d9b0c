//! Vendor diagnostic tools distributed as zip archives.
//!
//! Unlike catalog artifacts, these archives carry no declared digest. The
//! fetcher downloads the archive into a private temp file, extracts one
//! payload under a fixed name in `<cache>/binaries/`, and reuses it on later
//! calls without touching the network.

mod extract;
mod registry;

use std::path::PathBuf;
use std::sync::Arc;

use gpudeps_core::{DepsError, DepsResult, Platform};
use reqwest::Client;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::http::stream_to_file;

pub use extract::extract_payload;
pub use registry::{BinaryRegistry, BinarySpec};

/// Ensures vendor tools are present in the binaries cache.
pub struct BinaryFetcher {
    client: Client,
    registry: Arc<BinaryRegistry>,
    binaries_dir: PathBuf,
    lock: Mutex<()>,
}

impl BinaryFetcher {
    pub fn new(client: Client, registry: Arc<BinaryRegistry>, binaries_dir: PathBuf) -> Self {
        Self {
            client,
            registry,
            binaries_dir,
            lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &BinaryRegistry {
        &self.registry
    }

    /// Deterministic location of a tool for `platform`.
    pub fn target_path(&self, spec: &BinarySpec, platform: &Platform) -> PathBuf {
        let file_name = if platform.is_windows() {
            format!("{}.exe", spec.binary_name)
        } else {
            spec.binary_name.clone()
        };
        self.binaries_dir.join(file_name)
    }

    /// Make sure the `vendor` tool is available and return its path.
    ///
    /// `Ok(None)` means nothing is published for this vendor and target.
    pub async fn ensure(
        &self,
        vendor: &str,
        os: Option<&str>,
        arch: Option<&str>,
        cancel: &CancellationToken,
    ) -> DepsResult<Option<PathBuf>> {
        let platform = Platform::resolve(os, arch);
        let Some(spec) = self.registry.lookup(vendor, &platform) else {
            debug!(vendor, target = %platform, "No registry entry");
            return Ok(None);
        };
        if !spec.is_available() {
            debug!(vendor, target = %platform, "No archive published");
            return Ok(None);
        }

        let _guard = self.lock.lock().await;

        let target = self.target_path(spec, &platform);
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            debug!(path = %target.display(), "Vendor binary already present");
            return Ok(Some(target));
        }

        tokio::fs::create_dir_all(&self.binaries_dir)
            .await
            .map_err(|e| DepsError::io("create binaries directory", &self.binaries_dir, e))?;

        info!(vendor, target = %platform, url = %spec.url, "Fetching vendor binary");

        let archive = tempfile::Builder::new()
            .prefix(".archive-")
            .suffix(".zip")
            .tempfile_in(&self.binaries_dir)
            .map_err(|e| DepsError::io("create temp archive in", &self.binaries_dir, e))?;
        let archive_path = archive.path().to_path_buf();

        stream_to_file(&self.client, &spec.url, &archive_path, cancel, |_, _| {}).await?;

        let member = spec.archive_member.clone();
        let dest = target.clone();
        tokio::task::spawn_blocking(move || {
            let result = extract_payload(archive.path(), member.as_deref(), &dest);
            drop(archive);
            result
        })
        .await
        .map_err(|e| DepsError::extraction(archive_path.display().to_string(), e))??;

        info!(vendor, path = %target.display(), "Vendor binary ready");
        Ok(Some(target))
    }
}
