//! depflow CLI entry point
//!
//! Parses arguments, installs the log subscriber, wires Ctrl-C to the
//! cancellation token, and renders errors with suggestions.

use anyhow::Result;
use clap::Parser;
use depflow_cli::cli;
use depflow_cli::core::error::user_friendly_error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(cli.build_config().env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling analysis");
            on_interrupt.cancel();
        }
    });

    match cli.execute(cancel).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
