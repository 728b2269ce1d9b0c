//! Domain types for the dependency manager.
//!
//! These are pure value types with serde support. They carry no I/O; the
//! local state store and the runtime crate do the reading and writing.

mod library;
mod manifest;
mod release;

pub use library::{Library, LibraryFilter, LibraryKey, filter_libraries};
pub use manifest::{LocalManifest, Manifest, synthetic_version};
pub use release::{Release, ReleaseArtifact};
