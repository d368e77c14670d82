//! Tracing initialisation shared by the binaries.

use std::io::IsTerminal;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::adapters::sanitize::SanitizingMakeWriter;
use crate::config::{Config, LogMode};

/// Install the global subscriber.
///
/// `owns_screen` marks front ends that draw on the terminal: in `auto` mode
/// they log to `config.log_file` when stdout is a TTY, because writing logs to
/// the terminal would corrupt the alternate screen. Everything else logs to
/// stdout in `auto` mode.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the background writer.
///
/// # Errors
/// Returns an error if the log file cannot be opened.
pub fn init(config: &Config, owns_screen: bool) -> crate::Result<WorkerGuard> {
    let use_file = match config.log_mode {
        LogMode::File => true,
        LogMode::Stdout => false,
        LogMode::Auto => owns_screen && std::io::stdout().is_terminal(),
    };

    let (writer, guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: a missing directory surfaces as the open error below.
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(
            SanitizingMakeWriter::with_max_bytes(writer, config.sanitize_max_bytes),
        ))
        .init();

    Ok(guard)
}
