use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logging settings, loadable from the same YAML/JSON files as the rest of
/// the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `"info"` or
    /// `"toolbox=debug,info"`.
    pub level: String,
    /// Directory for rolling log files. `None` logs to the console only.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
    /// Number of daily files kept before the oldest is removed.
    pub max_files: usize,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: Some(PathBuf::from("logs")),
            file_prefix: "toolbox".to_string(),
            max_files: 5,
            ansi: true,
        }
    }
}

impl LogConfig {
    pub fn console_only(level: &str) -> Self {
        Self {
            level: level.to_string(),
            directory: None,
            ..Default::default()
        }
    }
}

/// `RUST_LOG` if set, otherwise `config.level`.
pub fn env_filter(config: &LogConfig) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow::anyhow!("Invalid log filter '{}': {}", config.level, e))
}

/// Daily rolling appender in `directory`, creating it if needed.
pub fn file_appender(config: &LogConfig, directory: &Path) -> anyhow::Result<RollingFileAppender> {
    std::fs::create_dir_all(directory).map_err(|e| {
        anyhow::anyhow!("Failed to create log directory '{}': {}", directory.display(), e)
    })?;

    tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .max_log_files(config.max_files.max(1))
        .build(directory)
        .map_err(|e| anyhow::anyhow!("Failed to create log file appender: {}", e))
}

/// Installs console logging and, with a directory configured, daily rolling
/// file logging. Warnings and errors also go to stderr.
///
/// Fails if a global subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> anyhow::Result<()> {
    let env_filter = env_filter(config)?;

    let console_writer = std::io::stdout.and(std::io::stderr.with_min_level(Level::WARN));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_ansi(config.ansi)
        .with_writer(console_writer);

    let file_layer = match &config.directory {
        Some(directory) => {
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender(config, directory)?);
            LOG_GUARD
                .set(guard)
                .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(file_writer),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Logger initialization failed: {}", e))
}

/// Test-friendly subscriber: captured output, `RUST_LOG` or `info`.
/// Safe to call from every test.
pub fn init_test_tracing() {
    let filter = env_filter(&LogConfig::console_only("info")).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
