//! Single-payload zip extraction.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use gpudeps_core::{DepsError, DepsResult};
use tracing::debug;

/// Extract one file from `archive` into `dest`.
///
/// With `member` set, that entry is extracted. Otherwise the first
/// non-directory entry in listing order is taken; archives are expected to
/// carry a single tool. The payload is written under `dest` whatever its name
/// inside the archive.
///
/// The bytes are staged in a temp file next to `dest` and renamed into place
/// once complete and executable, so `dest` never holds a partial payload. On
/// failure the staged file is dropped and `dest` is left as it was.
pub fn extract_payload(archive_path: &Path, member: Option<&str>, dest: &Path) -> DepsResult<()> {
    let label = archive_path.display().to_string();
    let dir = dest
        .parent()
        .ok_or_else(|| DepsError::Config(format!("'{}' has no parent directory", dest.display())))?;

    let file = File::open(archive_path).map_err(|e| DepsError::io("open", archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| DepsError::extraction(&label, e))?;

    let index = match member {
        Some(name) => archive
            .index_for_name(name)
            .ok_or_else(|| DepsError::extraction(&label, format!("no entry named '{name}'")))?,
        None => first_file_index(&mut archive, &label)?,
    };

    let mut entry = archive
        .by_index(index)
        .map_err(|e| DepsError::extraction(&label, e))?;
    if entry.is_dir() {
        return Err(DepsError::extraction(
            &label,
            format!("entry '{}' is a directory", entry.name()),
        ));
    }
    debug!(archive = %label, entry = entry.name(), dest = %dest.display(), "Extracting");

    let mut staged = tempfile::Builder::new()
        .prefix(".extract-")
        .tempfile_in(dir)
        .map_err(|e| DepsError::io("create staging file in", dir, e))?;
    io::copy(&mut entry, staged.as_file_mut()).map_err(|e| DepsError::extraction(&label, e))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| DepsError::io("sync", staged.path(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staged.path(), fs::Permissions::from_mode(0o755))
            .map_err(|e| DepsError::io("set permissions on", staged.path(), e))?;
    }

    staged
        .persist(dest)
        .map_err(|e| DepsError::io("move extracted binary to", dest, e.error))?;
    Ok(())
}

fn first_file_index(archive: &mut zip::ZipArchive<File>, label: &str) -> DepsResult<usize> {
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| DepsError::extraction(label, e))?;
        if !entry.is_dir() {
            return Ok(i);
        }
    }
    Err(DepsError::extraction(label, "archive contains no files"))
}
