use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_DIR: &str = "logs";
const DEFAULT_FILTER: &str = "music_analytics=info";

/// Initializes the logging system with both console and file output.
///
/// The returned guard flushes the file writer when dropped, so hold it for the
/// life of the process.
pub fn init_logging() -> Option<WorkerGuard> {
    // The file layer is optional; console logging still works without it
    let file_layer = match fs::create_dir_all(LOG_DIR) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(LOG_DIR, "music_analytics.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            Some((fmt::layer().json().with_writer(non_blocking_writer), guard))
        }
        Err(e) => {
            eprintln!("[logging] could not create {LOG_DIR}/: {e}");
            None
        }
    };
    let (file_layer, guard) = match file_layer {
        Some((layer, guard)) => (Some(layer), Some(guard)),
        None => (None, None),
    };

    let console_layer = fmt::layer().with_writer(std::io::stdout);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}
