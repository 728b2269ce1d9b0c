//! gpudeps command-line adapter.
//!
//! Parsing lives in [`parser`], dispatch and plain-text output in
//! [`handlers`]. All behavior is delegated to
//! [`gpudeps_runtime::DependencyManager`].

pub mod handlers;
pub mod parser;

pub use parser::{Cli, Commands};
