//! Test utilities for depflow
//!
//! This module provides helpers shared by unit tests and the integration
//! suite:
//! - Once-guarded logging initialization
//! - [`LogCapture`] for asserting on emitted warnings
//! - In-memory fakes for the build-graph and history providers
//! - Fixture builders for builds, commits, and comparisons
//!
//! It is compiled for `cfg(test)` and for the `test-utils` feature, which the
//! crate enables on its own dev-dependency so that `tests/` can use it too.
//!
//! # Example
//!
//! ```rust,no_run
//! use depflow_cli::test_utils::{FakeHistoryProvider, comparison, init_test_logging};
//!
//! init_test_logging(None);
//! let history = FakeHistoryProvider::new().with_comparison("dotnet", "runtime", comparison(0, vec![]));
//! ```

pub mod fakes;
pub mod fixtures;
pub mod logs;

pub use fakes::{CompareCall, FakeBuildGraphProvider, FakeHistoryProvider};
pub use fixtures::{build, commit, comparison, github_build, utc};
pub use logs::LogCapture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` set, that level is used;
/// otherwise `RUST_LOG` is honored, and without either no subscriber is
/// installed.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
