//! Logging setup: colored stdout plus a plain log file.

use crate::error::logger::LoggerError;

use common::ErrorLocation;

use std::io::stdout;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "pagercon.log";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Initialize dual-output logging. Safe to call more than once; only
/// the first call configures anything.
pub fn initialize(log_dir: &Path) -> Result<(), LoggerError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir);
        if result.is_ok() {
            info!("Logger initialized with level: {LOG_LEVEL:?}");
        }
    });

    result
}

fn initialize_internal(log_dir: &Path) -> Result<(), LoggerError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} {level}] {message} ({target})",
                date = format_rfc3339(SystemTime::now()),
                level = colors.color(record.level()),
                message = message,
                target = record.target(),
            ))
        })
        .chain(stdout());

    let file_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} {level}] {message} ({target})",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                message = message,
                target = record.target(),
            ))
        })
        .chain(fern::log_file(&log_file_path).map_err(|e| LoggerError::Init {
            message: format!("failed to create log file: {e}"),
            location: ErrorLocation::caller(),
        })?);

    Dispatch::new()
        .level(LOG_LEVEL)
        .chain(stdout_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| LoggerError::Init {
            message: format!("failed to apply logger config: {e}"),
            location: ErrorLocation::caller(),
        })?;

    Ok(())
}
