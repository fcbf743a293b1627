//! Progress indicators
//!
//! The analysis spends almost all of its time waiting on remote services, so
//! the CLI shows a spinner while it runs. The spinner hides itself when:
//!
//! - `--no-progress` was given
//! - `DEPFLOW_NO_PROGRESS` is set to any value
//! - stderr is not a terminal (pipes, CI logs)
//!
//! # Example
//!
//! ```rust
//! use depflow_cli::utils::progress::ProgressBar;
//!
//! let spinner = ProgressBar::new_spinner(true);
//! spinner.set_message("Comparing dependencies...");
//! // long-running work
//! spinner.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::io::IsTerminal;
use std::time::Duration;

fn is_progress_disabled() -> bool {
    std::env::var_os("DEPFLOW_NO_PROGRESS").is_some() || !std::io::stderr().is_terminal()
}

/// A spinner with depflow styling; a no-op when progress is disabled.
#[derive(Clone, Debug)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Spinner for work of unknown length. `enabled = false` always yields a
    /// hidden spinner.
    #[must_use]
    pub fn new_spinner(enabled: bool) -> Self {
        let bar = if !enabled || is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self {
            inner: bar,
        }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    /// Remove the spinner from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }
}

fn spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .map(|style| style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]))
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_spinner_is_hidden() {
        let spinner = ProgressBar::new_spinner(false);
        assert!(spinner.is_hidden());
        spinner.set_message("working");
        spinner.finish_and_clear();
    }

    #[test]
    fn test_spinner_operations_do_not_panic() {
        let spinner = ProgressBar::new_spinner(true);
        spinner.set_message("Fetching build graph...");
        spinner.finish_with_message("done");
    }
}
