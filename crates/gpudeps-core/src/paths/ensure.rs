//! Preparing the managed directories.

use std::fmt;
use std::fs;
use std::path::Path;

use super::error::PathError;

/// Which of the three managed directories a path plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryRole {
    Cache,
    Library,
    Config,
}

impl fmt::Display for DirectoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cache => "cache directory",
            Self::Library => "library directory",
            Self::Config => "config directory",
        })
    }
}

/// Create `path` if needed and check that artifacts can be committed into it.
///
/// The check writes a scratch file and renames it, the same two steps every cache
/// download, install and manifest write relies on.
pub fn ensure_directory(path: &Path, role: DirectoryRole) -> Result<(), PathError> {
    if path.as_os_str().is_empty() {
        return Err(PathError::EmptyPath(role));
    }

    if path.exists() && !path.is_dir() {
        return Err(PathError::NotADirectory {
            role,
            path: path.to_path_buf(),
        });
    }

    fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
        role,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let scratch = path.join(".gpudeps-write-check.tmp");
    let committed = path.join(".gpudeps-write-check");
    let result = fs::write(&scratch, b"ok").and_then(|()| fs::rename(&scratch, &committed));
    let _ = fs::remove_file(&scratch);
    let _ = fs::remove_file(&committed);

    result.map_err(|e| PathError::NotWritable {
        role,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
