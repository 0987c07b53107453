//! File logging with `tracing`
//!
//! Stdout carries the NDJSON event stream, so every log line goes to a
//! daily file under `<data_local_dir>/klinewatch/logs/`. The level is read
//! from `KLINEWATCH_LOG`:
//!
//! ```bash
//! KLINEWATCH_LOG=debug klinewatch
//! KLINEWATCH_LOG=klinewatch_net=trace klinewatch
//! ```

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

const LOG_PREFIX: &str = "klinewatch";
const LOG_SUFFIX: &str = "log";

/// Daily files kept before the oldest is deleted
const MAX_LOG_FILES: usize = 14;

const DEFAULT_FILTER: &str = "klinewatch=info,klinewatch_app=info,klinewatch_net=info,warn";

pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(&log_dir)
        .map_err(std::io::Error::other)?;

    let env_filter = EnvFilter::try_from_env("KLINEWATCH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("klinewatch {} logging to {}", env!("CARGO_PKG_VERSION"), log_dir.display());
    Ok(())
}

fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("klinewatch")
        .join("logs")
}

/// File the appender writes for `date`. Rotation follows the UTC date.
fn log_file_for(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!(
        "{}.{}.{}",
        LOG_PREFIX,
        date.format("%Y-%m-%d"),
        LOG_SUFFIX
    ))
}

/// Path of today's log file
pub fn get_current_log_file() -> Result<PathBuf> {
    Ok(log_file_for(&log_directory(), Utc::now().date_naive()))
}
