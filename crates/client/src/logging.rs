use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Prefix of the daily rolling log files
pub const LOG_FILE_PREFIX: &str = "blindauth.log";

/// Install the global subscriber for the CLI
///
/// Diagnostics always go to stderr so command output on stdout can be
/// piped. When `log_dir` is set they are also appended to a daily rolling
/// file there; the returned guard flushes that file and must outlive every
/// log call.
pub fn init_logging(log_level: LevelFilter, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter(log_level));

    let file = log_dir.and_then(|dir| match file_writer(dir) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: not logging to {}: {}", dir.display(), e);
            None
        }
    });

    let (file_layer, guard) = match file {
        Some((writer, guard)) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(env_filter(log_level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    register_panic_logger();

    guard
}

// RUST_LOG wins over the --log-level default
fn env_filter(log_level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy()
}

fn file_writer(log_dir: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// Route panics through `tracing` so they land in the log file too
fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(loc) => {
            tracing::error!(
                message = %panic,
                panic.file = loc.file(),
                panic.line = loc.line(),
            );
        }
        None => tracing::error!(message = %panic),
    }));
}
