//! Generic TOML configuration parsing.
//!
//! Reads a file and deserializes it into any `DeserializeOwned` type, with the
//! file path attached to both read and parse failures:
//!
//! ```text
//! Failed to parse config file: /path/to/sla.toml
//! Caused by:
//!     invalid type: string "five", expected i64
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML file into `T`.
///
/// # Examples
///
/// ```rust,no_run
/// use depflow_cli::config::parse_config;
/// use depflow_cli::freshness::SlaOptions;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let sla: SlaOptions = parse_config(Path::new("sla.toml"))?;
/// println!("{} SLA entries", sla.repositories.len());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not deserialize into `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
