//! Console output plus a daily-rolling file under `~/.cursor-bar/logs`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::AppResult;
use crate::modules::config::get_data_dir;

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "cursor-bar.log";
const DEFAULT_FILTER: &str = "info";

pub fn get_log_dir() -> AppResult<PathBuf> {
    log_dir_under(&get_data_dir()?)
}

fn log_dir_under(data_dir: &Path) -> AppResult<PathBuf> {
    let log_dir = data_dir.join(LOG_DIR);
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; hold it until exit.
/// Without a writable log directory only the console layer is installed.
pub fn init_logger() -> Option<WorkerGuard> {
    // tauri and its plugins log through the `log` facade
    let _ = tracing_log::LogTracer::init();

    let (file_layer, guard) = match get_log_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("File logging disabled: {}", e);
            (None, None)
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init();

    info!(file = guard.is_some(), "Logging started");
    guard
}
