//! Platform and architecture identifiers.
//!
//! Catalogs, release listings and the binary registry all speak in the same
//! vocabulary: `linux`, `darwin`, `windows` for the OS and `amd64`, `arm64`
//! for the architecture. Everything coming from outside is normalized here
//! before it is compared.

use std::fmt;

/// Normalize an OS identifier (lower-cased, `macos` → `darwin`).
pub fn normalize_os(os: &str) -> String {
    let os = os.trim().to_ascii_lowercase();
    match os.as_str() {
        "macos" | "osx" => "darwin".to_string(),
        "win" | "win32" | "win64" => "windows".to_string(),
        _ => os,
    }
}

/// Normalize an architecture identifier (`x86_64`/`x64` → `amd64`, `aarch64` → `arm64`).
pub fn normalize_arch(arch: &str) -> String {
    let arch = arch.trim().to_ascii_lowercase();
    match arch.as_str() {
        "x86_64" | "x64" | "x86-64" => "amd64".to_string(),
        "aarch64" | "armv8" => "arm64".to_string(),
        _ => arch,
    }
}

/// An (OS, architecture) pair in normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// Build a platform from raw identifiers, normalizing both.
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: normalize_os(os),
            arch: normalize_arch(arch),
        }
    }

    /// The platform this process is running on.
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Resolve optional overrides against the current platform.
    ///
    /// `None` or an empty string means "use the running platform".
    pub fn resolve(os: Option<&str>, arch: Option<&str>) -> Self {
        let current = Self::current();
        Self {
            os: os
                .filter(|s| !s.trim().is_empty())
                .map_or(current.os, normalize_os),
            arch: arch
                .filter(|s| !s.trim().is_empty())
                .map_or(current.arch, normalize_arch),
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_aliases() {
        assert_eq!(normalize_arch("x86_64"), "amd64");
        assert_eq!(normalize_arch("X64"), "amd64");
        assert_eq!(normalize_arch("aarch64"), "arm64");
        assert_eq!(normalize_arch("arm64"), "arm64");
        assert_eq!(normalize_arch("riscv64"), "riscv64");
    }

    #[test]
    fn test_os_normalization() {
        assert_eq!(normalize_os("Linux"), "linux");
        assert_eq!(normalize_os("macos"), "darwin");
        assert_eq!(normalize_os("Windows"), "windows");
    }

    #[test]
    fn test_current_is_normalized() {
        let platform = Platform::current();
        assert_ne!(platform.arch, "x86_64");
        assert_ne!(platform.arch, "aarch64");
        assert_ne!(platform.os, "macos");
    }

    #[test]
    fn test_resolve_empty_means_current() {
        let current = Platform::current();
        assert_eq!(Platform::resolve(None, Some("")), current);
        assert_eq!(
            Platform::resolve(Some("linux"), Some("aarch64")),
            Platform::new("linux", "arm64")
        );
    }
}
