//! Settings domain types and validation.
//!
//! Settings live in `settings.json` inside the config directory. Every field
//! is optional; the `effective_*` accessors supply defaults so a missing
//! file and an empty object behave the same.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default upstream release index.
pub const DEFAULT_RELEASE_INDEX_URL: &str = "https://releases.gpudeps.dev/v1/releases.json";

/// Default overall timeout for a single HTTP request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("gpudeps/", env!("CARGO_PKG_VERSION"));

/// Application settings structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// URL of the upstream release listing.
    pub release_index_url: Option<String>,

    /// Overall timeout for one request (catalog sync or artifact download).
    pub request_timeout_secs: Option<u64>,

    /// Re-sync the cached catalog once it is older than this many hours.
    /// `None` keeps the cached catalog until an explicit sync.
    pub catalog_max_age_hours: Option<u64>,

    /// `User-Agent` sent with every request.
    pub user_agent: Option<String>,
}

impl Settings {
    pub fn effective_release_index_url(&self) -> &str {
        self.release_index_url
            .as_deref()
            .unwrap_or(DEFAULT_RELEASE_INDEX_URL)
    }

    pub fn effective_request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn catalog_max_age(&self) -> Option<chrono::Duration> {
        self.catalog_max_age_hours
            .and_then(|h| i64::try_from(h).ok())
            .map(chrono::Duration::hours)
    }

    pub fn effective_user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(SettingsError::Read(e.to_string())),
        };
        let settings: Self =
            serde_json::from_str(&raw).map_err(|e| SettingsError::Parse(e.to_string()))?;
        validate_settings(&settings)?;
        Ok(settings)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Read(String),

    #[error("Failed to parse settings: {0}")]
    Parse(String),

    #[error("Request timeout must be at least 1 second")]
    ZeroTimeout,

    #[error("Release index URL must start with http:// or https://, got {0}")]
    InvalidIndexUrl(String),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.request_timeout_secs == Some(0) {
        return Err(SettingsError::ZeroTimeout);
    }
    if let Some(ref url) = settings.release_index_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingsError::InvalidIndexUrl(url.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.effective_request_timeout(), Duration::from_secs(600));
        assert_eq!(settings.effective_release_index_url(), DEFAULT_RELEASE_INDEX_URL);
        assert!(settings.catalog_max_age().is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "catalog_max_age_hours": 24 }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.catalog_max_age(), Some(chrono::Duration::hours(24)));
        assert!(settings.user_agent.is_none());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let settings = Settings {
            request_timeout_secs: Some(0),
            ..Settings::default()
        };
        assert_eq!(validate_settings(&settings), Err(SettingsError::ZeroTimeout));
    }

    #[test]
    fn test_validation_rejects_non_http_url() {
        let settings = Settings {
            release_index_url: Some("ftp://mirror".into()),
            ..Settings::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidIndexUrl(_))
        ));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, r#"{ "request_timeout_secs": 0 }"#).unwrap();
        assert_eq!(Settings::load(&path), Err(SettingsError::ZeroTimeout));

        std::fs::write(&path, r#"{ "release_index_url": "file:///tmp/index.json" }"#).unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(SettingsError::InvalidIndexUrl(_))
        ));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Settings::load(&path), Err(SettingsError::Parse(_))));
    }
}
