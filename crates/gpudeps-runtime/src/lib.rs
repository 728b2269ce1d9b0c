//! Engine for gpudeps: catalog sync, verified downloads, install lifecycle,
//! update detection and vendor tool fetching.
//!
//! [`DependencyManager`] is the entry point; the component types are public
//! for callers that want to compose them differently.

pub mod binaries;
pub mod download;
pub mod http;
pub mod install;
pub mod manager;
pub mod manifest;
pub mod progress;
pub mod update;

pub use binaries::{BinaryFetcher, BinaryRegistry, BinarySpec};
pub use download::Downloader;
pub use http::{HttpReleaseSource, build_client};
pub use install::Installer;
pub use manager::DependencyManager;
pub use manifest::ManifestSource;
pub use progress::{NoopProgress, ProgressCallback, ProgressReporter};
pub use update::{BatchOutcome, pending_updates};

#[cfg(feature = "cli")]
pub use progress::CliProgress;

pub use tokio_util::sync::CancellationToken;
