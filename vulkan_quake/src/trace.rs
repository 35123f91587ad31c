//! Log output for `vulkan_quake`.

use std::{env, path::PathBuf};
use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR_VAR: &str = "VULKAN_QUAKE_LOG_DIR";
const LOG_FILE_PREFIX: &str = "vulkan_quake.log";

/// Where logs are written and the level used when `RUST_LOG` is unset.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub(crate) struct LogConfig {
    directory: PathBuf,
    default_level: Level,
}

impl LogConfig {
    /// Read the log directory from `VULKAN_QUAKE_LOG_DIR`, defaulting to `logs`.
    pub(crate) fn from_env() -> Self {
        Self {
            directory: env::var_os(LOG_DIR_VAR).map_or_else(|| PathBuf::from("logs"), PathBuf::from),
            default_level: Level::INFO,
        }
    }
}

/// Flushes the log file when dropped. Must be held until `main` returns.
#[allow(missing_copy_implementations)]
#[derive(Debug)]
#[must_use]
pub(crate) struct LogGuard {
    _file_writer: WorkerGuard,
}

/// Log to a daily rolling file in `config.directory` and, in debug builds, to stderr.
pub(crate) fn init_logging(config: &LogConfig) -> LogGuard {
    let filter = EnvFilter::builder()
        .with_default_directive(config.default_level.into())
        .from_env_lossy();

    let (file_writer, _file_writer) =
        tracing_appender::non_blocking(rolling::daily(&config.directory, LOG_FILE_PREFIX));
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_line_number(true)
        .with_writer(file_writer);
    let stderr_layer = cfg!(debug_assertions).then(|| {
        fmt::layer()
            .compact()
            .without_time()
            .with_writer(std::io::stderr)
    });

    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!("failed to install log subscriber: {err}");
    }
    tracing::debug!("logging to {:?}", config.directory);

    LogGuard { _file_writer }
}
