//! Progress reporting for downloads.
//!
//! Two shapes are offered:
//! - [`ProgressCallback`]: a plain `(bytes_downloaded, total_bytes)` function
//!   invoked synchronously by the download engine for every read buffer.
//! - [`ProgressReporter`]: a richer listener used by batch operations, which
//!   also announces item start and completion.
//!
//! # Feature Flags
//!
//! - `cli`: Enables `CliProgress` which uses `indicatif` for terminal progress bars.
//!   Without this feature, only `NoopProgress` is available.

/// Download progress callback.
/// Called with (`downloaded_bytes`, `total_bytes`); `total_bytes` is the
/// size declared by the catalog.
pub type ProgressCallback<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Trait for receiving progress updates during batch operations.
///
/// Implementors can display progress bars, update UI elements, or simply
/// ignore the updates (`NoopProgress`).
pub trait ProgressReporter: Send + Sync {
    /// Called when an item starts.
    ///
    /// # Arguments
    /// * `message` - Description of what's starting (e.g., "Downloading libcudart.so.12")
    /// * `total` - Total size if known
    fn start(&self, message: &str, total: Option<u64>);

    /// Called to update progress of the current item.
    fn update(&self, current: u64, total: Option<u64>);

    /// Called when the current item completes successfully.
    fn finish(&self, message: &str);

    /// Called when the current item fails.
    fn finish_with_error(&self, message: &str);
}

/// A no-op progress reporter that ignores all updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _message: &str, _total: Option<u64>) {}
    fn update(&self, _current: u64, _total: Option<u64>) {}
    fn finish(&self, _message: &str) {}
    fn finish_with_error(&self, _message: &str) {}
}

/// CLI progress reporter using indicatif for terminal progress bars.
///
/// This is only available with the `cli` feature flag.
#[cfg(feature = "cli")]
pub mod cli_progress {
    use super::ProgressReporter;
    use indicatif::{ProgressBar, ProgressStyle};
    use std::sync::Mutex;

    const BAR_TEMPLATE: &str =
        "{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";

    /// CLI progress reporter with terminal progress bars.
    pub struct CliProgress {
        bar: Mutex<Option<ProgressBar>>,
    }

    impl CliProgress {
        pub const fn new() -> Self {
            Self {
                bar: Mutex::new(None),
            }
        }

        fn create_download_bar(total: u64) -> ProgressBar {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("█▓░"));
            pb.set_style(style);
            pb
        }

        fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
            // A poisoned lock only means a previous render panicked; keep drawing.
            let mut guard = match self.bar.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            f(&mut guard);
        }
    }

    impl Default for CliProgress {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ProgressReporter for CliProgress {
        fn start(&self, message: &str, total: Option<u64>) {
            let pb = match total {
                Some(t) if t > 0 => Self::create_download_bar(t),
                _ => ProgressBar::new_spinner(),
            };
            pb.set_message(message.to_string());
            self.with_bar(|slot| *slot = Some(pb));
        }

        fn update(&self, current: u64, total: Option<u64>) {
            self.with_bar(|slot| {
                if let Some(pb) = slot.as_ref() {
                    if let Some(t) = total {
                        pb.set_length(t);
                    }
                    pb.set_position(current);
                }
            });
        }

        fn finish(&self, message: &str) {
            self.with_bar(|slot| {
                if let Some(pb) = slot.take() {
                    pb.finish_with_message(message.to_string());
                }
            });
        }

        fn finish_with_error(&self, message: &str) {
            self.with_bar(|slot| {
                if let Some(pb) = slot.take() {
                    pb.abandon_with_message(message.to_string());
                }
            });
        }
    }
}

#[cfg(feature = "cli")]
pub use cli_progress::CliProgress;
