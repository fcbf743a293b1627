//! Core types for depflow
//!
//! This module holds the error vocabulary shared by every other module:
//! - [`DepflowError`] - Enumerated failures that abort an analysis
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to the user-friendly format
//!
//! # Example
//!
//! ```rust
//! use depflow_cli::core::{DepflowError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<String> {
//!     Err(DepflowError::Cancelled.into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.to_string().contains("cancelled"));
//! }
//! ```

pub mod error;

pub use error::{DepflowError, ErrorContext, user_friendly_error};
