//! Port definitions (trait abstractions).
//!
//! Ports define the boundaries between the dependency manager and the
//! collaborators it consumes. Adapters in `gpudeps-runtime` (HTTP) and test
//! doubles implement them.

mod release_source;

pub use release_source::{ReleaseSource, StaticReleaseSource};
