//! Configuration management for depflow
//!
//! depflow has a single, user-wide configuration file. It is optional: every
//! field has a default, and tokens can come from the environment instead.
//!
//! # Modules
//!
//! - `global` - [`GlobalConfig`] load/save with owner-only permissions
//! - `parser` - Generic TOML parsing with file-path error context
//!
//! # Precedence
//!
//! 1. Command-line flags (`--github-token`, `--max-parallel`, ...)
//! 2. Environment variables (`GITHUB_TOKEN`, `DEPFLOW_BUILD_GRAPH_TOKEN`)
//! 3. The configuration file
//! 4. Built-in defaults

mod global;
mod parser;

pub use global::GlobalConfig;
pub use parser::parse_config;
