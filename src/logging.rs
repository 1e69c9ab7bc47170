// ABOUTME: Logging module for the ocr-deck application
// ABOUTME: Installs a console logger and a dated log file logger behind the log facade

use crate::errors::{OcrDeckError, Result};
use chrono::{Local, NaiveDate};
use env_logger::{Builder, Target, WriteStyle};
use log::{debug, warn, LevelFilter, Log, Metadata, Record};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOG_PREFIX: &str = "applog_";
const LOG_SUFFIX: &str = ".log";

/// Settings for [`setup_logger`]
pub struct LogSettings {
    pub directory: PathBuf,
    pub console_level: LevelFilter,
    pub file_level: LevelFilter,
    /// Dated log files older than this many days are removed
    pub retention_days: i64,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            console_level: LevelFilter::Info,
            file_level: LevelFilter::Debug,
            retention_days: 30,
        }
    }
}

/// Sends every record to both the console and the log file logger.
struct DualLogger {
    console: env_logger::Logger,
    file: env_logger::Logger,
}

impl Log for DualLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || self.file.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        // Each logger applies its own level filter
        self.console.log(record);
        self.file.log(record);
    }

    fn flush(&self) {
        self.console.flush();
        self.file.flush();
    }
}

/// Name of the log file for `date`.
pub fn log_file_name(date: NaiveDate) -> String {
    format!("{}{}{}", LOG_PREFIX, date.format("%Y-%m-%d"), LOG_SUFFIX)
}

fn log_file_date(name: &str) -> Option<NaiveDate> {
    let date = name.strip_prefix(LOG_PREFIX)?.strip_suffix(LOG_SUFFIX)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Delete dated log files in `directory` older than `retention_days` before `today`.
pub fn prune_old_logs(directory: &Path, today: NaiveDate, retention_days: i64) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(date) = log_file_date(&name) else {
            continue;
        };
        if (today - date).num_days() > retention_days {
            fs::remove_file(entry.path())?;
            removed.push(entry.path());
        }
    }
    Ok(removed)
}

fn builder(level: LevelFilter, colored: bool) -> Builder {
    let mut builder = Builder::new();
    builder.filter_level(level).format(move |buf, record| {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let location = format!(
            "{}:{}",
            record.module_path().unwrap_or("ocr_deck"),
            record.line().unwrap_or(0)
        );
        if colored {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{} | {style}{:<8}{style:#} | {} - {}",
                timestamp,
                record.level(),
                location,
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{} | {:<8} | {} - {}",
                timestamp,
                record.level(),
                location,
                record.args()
            )
        }
    });
    builder
}

/// Install the process-wide logger. Call once, from the entry point.
///
/// Returns the path of today's log file.
pub fn setup_logger(settings: &LogSettings) -> Result<PathBuf> {
    fs::create_dir_all(&settings.directory).map_err(|e| {
        OcrDeckError::LoggerError(format!(
            "Failed to create log directory {:?}: {}",
            settings.directory, e
        ))
    })?;

    let today = Local::now().date_naive();
    let log_path = settings.directory.join(log_file_name(today));
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| {
            OcrDeckError::LoggerError(format!("Failed to open log file {:?}: {}", log_path, e))
        })?;

    let console = builder(settings.console_level, true)
        .target(Target::Stdout)
        .build();
    let file = builder(settings.file_level, false)
        .target(Target::Pipe(Box::new(log_file)))
        .write_style(WriteStyle::Never)
        .build();

    log::set_boxed_logger(Box::new(DualLogger { console, file }))
        .map_err(|e| OcrDeckError::LoggerError(e.to_string()))?;
    log::set_max_level(settings.console_level.max(settings.file_level));

    prune_expired_logs(&settings.directory, today, settings.retention_days);

    Ok(log_path)
}

/// Prune old log files, warning instead of failing. Returns how many were removed.
fn prune_expired_logs(directory: &Path, today: NaiveDate, retention_days: i64) -> usize {
    match prune_old_logs(directory, today, retention_days) {
        Ok(removed) => {
            for path in &removed {
                debug!("Removed expired log file {:?}", path);
            }
            removed.len()
        }
        Err(e) => {
            warn!("Failed to remove expired log files in {:?}: {}", directory, e);
            0
        }
    }
}
