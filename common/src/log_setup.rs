//! Global tracing subscriber for binaries and examples.
//!
//! Library crates only emit `tracing` events; applications call
//! [`setup_logging`] once at startup.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logging options.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set, e.g. `"info"` or `"nowcast=debug"`.
    pub level: String,
    /// Directory for daily-rotated log files. `None` logs to the console only.
    pub log_dir: Option<PathBuf>,
    /// File name prefix of the rotated log files.
    pub file_prefix: String,
    /// Number of rotated files kept on disk.
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            file_prefix: "nowcast".to_string(),
            max_log_files: 5,
        }
    }
}

/// Install the global subscriber described by `config`.
///
/// Console output goes to stdout, with WARN and above duplicated to stderr.
/// Panics if the filter is invalid, the log directory cannot be created, or a
/// subscriber is already installed.
pub fn setup_logging(config: &LogConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|e| panic!("Invalid log filter '{}': {}", config.level, e));

    let console_writer = std::io::stdout.and(std::io::stderr.with_min_level(Level::WARN));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_ansi(true)
        .with_writer(console_writer);

    let file_layer = config.log_dir.as_ref().map(|dir| {
        std::fs::create_dir_all(dir).unwrap_or_else(|e| {
            panic!("Failed to create log directory {}: {}", dir.display(), e)
        });

        let file_appender = tracing_appender::rolling::Builder::new()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix(&config.file_prefix)
            .filename_suffix("log")
            .max_log_files(config.max_log_files)
            .build(dir)
            .unwrap_or_else(|e| panic!("Failed to create log file appender: {}", e));

        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        LOG_GUARD.set(guard).expect("Logging already initialized");

        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false)
            .with_writer(file_writer)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .unwrap_or_else(|e| panic!("Logger initialization failed: {}", e));
}
