//! Root directory resolution.
//!
//! Each directory resolves in the same order:
//! 1. Its own environment variable (`GPUDEPS_CACHE_DIR`, `GPUDEPS_LIB_DIR`,
//!    `GPUDEPS_CONFIG_DIR`)
//! 2. A subdirectory of `GPUDEPS_HOME` when that is set
//! 3. The platform default from the `dirs` crate

use std::env;
use std::path::PathBuf;

use super::error::PathError;

const APP_DIR: &str = "gpudeps";

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn home_subdir(sub: &str) -> Option<PathBuf> {
    env_path("GPUDEPS_HOME").map(|home| home.join(sub))
}

/// Directory holding verified downloads and extracted vendor binaries.
///
/// Defaults to `~/.cache/gpudeps` on Linux.
pub fn cache_root() -> Result<PathBuf, PathError> {
    if let Some(path) = env_path("GPUDEPS_CACHE_DIR").or_else(|| home_subdir("cache")) {
        return Ok(path);
    }
    let base = dirs::cache_dir().ok_or(PathError::NoCacheDir)?;
    Ok(base.join(APP_DIR))
}

/// Directory artifacts are installed into.
///
/// Defaults to `~/.local/share/gpudeps/lib` on Linux.
pub fn lib_root() -> Result<PathBuf, PathError> {
    if let Some(path) = env_path("GPUDEPS_LIB_DIR").or_else(|| home_subdir("lib")) {
        return Ok(path);
    }
    let base = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(base.join(APP_DIR).join("lib"))
}

/// Directory holding local manifests, the cached catalog and settings.
///
/// Defaults to `~/.config/gpudeps` on Linux.
pub fn config_root() -> Result<PathBuf, PathError> {
    if let Some(path) = env_path("GPUDEPS_CONFIG_DIR").or_else(|| home_subdir("config")) {
        return Ok(path);
    }
    let base = dirs::config_dir().ok_or(PathError::NoConfigDir)?;
    Ok(base.join(APP_DIR))
}
