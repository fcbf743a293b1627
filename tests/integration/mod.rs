//! Integration test suite for depflow
//!
//! End-to-end tests that drive the library API with fake providers and the
//! `depflow` binary against local mock HTTP servers. No network access is
//! needed.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **analysis**: Full analyses through [`IncomingAnalyzer`] with configured SLA
//!   tables, exclusions, and degraded comparisons
//! - **cli**: The `depflow` binary, its output formats, and `--check`
//!
//! [`IncomingAnalyzer`]: depflow_cli::freshness::IncomingAnalyzer

mod analysis;
mod cli;
