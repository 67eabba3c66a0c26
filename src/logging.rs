use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Initializes the logging system with both console and file output.
///
/// The returned guard flushes the file writer when dropped, so `main` holds
/// it for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let log_dir = Path::new(&config.directory);
    let file_parts = match fs::create_dir_all(log_dir) {
        Ok(()) => {
            // Daily rotation, JSON lines
            let file_appender = tracing_appender::rolling::daily(log_dir, &config.file_name);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            Some((fmt::layer().json().with_writer(non_blocking_writer), guard))
        }
        Err(e) => {
            eprintln!("[logging] cannot create {}: {e}; file logging disabled", log_dir.display());
            None
        }
    };
    let (file_layer, guard) = match file_parts {
        Some((layer, guard)) => (Some(layer), Some(guard)),
        None => (None, None),
    };

    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    // Respect RUST_LOG if set
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sensor_insights={}", config.level)));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();
    if let Err(e) = installed {
        eprintln!("[logging] subscriber already installed: {e}");
    }

    guard
}
