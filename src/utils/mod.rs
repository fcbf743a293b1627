//! Utilities and helpers
//!
//! - [`progress`] - Spinner shown while the build graph and GitHub are queried

pub mod progress;

pub use progress::ProgressBar;
