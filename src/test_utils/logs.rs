//! In-memory log capture for asserting on emitted diagnostics.
//!
//! ```rust,no_run
//! use depflow_cli::test_utils::LogCapture;
//!
//! let logs = LogCapture::new();
//! let _guard = logs.install();
//! tracing::warn!(repo = "runtime", "comparison failed");
//! assert_eq!(logs.lines_containing("comparison failed").len(), 1);
//! ```

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::Level;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Shared buffer that a plain-text fmt subscriber writes into.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

/// Writer handed to the subscriber for a single event.
pub struct CaptureWriter<'a>(MutexGuard<'a, Vec<u8>>);

impl Write for CaptureWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(self.buffer.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl LogCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route events of the current thread into this buffer until the guard drops.
    ///
    /// Tests using this must run on a current-thread runtime (the
    /// `#[tokio::test]` default) so every event is emitted on the same thread.
    #[must_use]
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .with_target(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Captured lines containing `needle`.
    #[must_use]
    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.contents().lines().filter(|line| line.contains(needle)).map(str::to_string).collect()
    }
}
