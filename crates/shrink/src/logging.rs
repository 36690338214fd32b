//! Logging initialization and configuration.
//!
//! Logs go to stderr (stdout is reserved for data output). A conversion run
//! additionally appends plain-text lines to a log file in its output
//! directory.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `verbose` - If true, enables DEBUG level logging; otherwise INFO level.
/// * `json_format` - If true, stderr gets structured JSON logs.
/// * `log_file` - Optional file that receives a plain copy of every line.
///
/// The returned guard flushes the file writer on drop and must be held until
/// the program exits. The RUST_LOG environment variable overrides the level.
pub fn init(verbose: bool, json_format: bool, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = if json_format {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .boxed()
    };

    let (file_layer, guard) = match log_file.map(open_log_file) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("Warning: Cannot open log file: {e}");
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

/// Initialize logging with configuration from Config.
pub fn init_from_config(
    config: &shrink_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
    log_file: Option<std::path::PathBuf>,
) -> Option<WorkerGuard> {
    let verbose =
        verbose_override || config.logging.level == "debug" || config.logging.level == "trace";
    let json_format = json_logs_override || config.logging.format == "json";
    init(verbose, json_format, log_file.as_deref())
}

/// Open `path` for appending, creating its directory first.
fn open_log_file(path: &Path) -> anyhow::Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Log path {:?} has no file name", path))?;

    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)?;
    Ok(appender)
}
