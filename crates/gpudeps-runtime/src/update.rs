//! Update detection and batch upgrade results.

use gpudeps_core::{DepsError, Library, LocalManifest};

/// Catalog entries that are missing locally or whose version differs.
///
/// Versions are compared as opaque strings. Catalog order is preserved.
pub fn pending_updates(available: &[Library], installed: &LocalManifest) -> Vec<Library> {
    available
        .iter()
        .filter(|library| {
            installed
                .get(&library.name)
                .is_none_or(|current| current.version != library.version)
        })
        .cloned()
        .collect()
}

/// Result of an upgrade batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: Vec<Library>,
    pub failed: Vec<(Library, DepsError)>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}
