/// Structured logging for the QC pipeline
///
/// Provides context-rich logging tagged with the pipeline stage and,
/// where relevant, the station id. Supports console output and an
/// append-only log file for batch reruns.
///
/// Until `init_logger` is called every logging function is a no-op, so
/// library callers that don't want output get none.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use crate::config::LoggingConfig;
use crate::model::QcError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Geometry,
    Physical,
    Ratio,
    Aggregate,
    Config,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Ingest => write!(f, "INGEST"),
            Stage::Geometry => write!(f, "GEOM"),
            Stage::Physical => write!(f, "PHYS"),
            Stage::Ratio => write!(f, "RATIO"),
            Stage::Aggregate => write!(f, "AGG"),
            Stage::Config => write!(f, "CFG"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        // A poisoned lock only means another thread panicked mid-log.
        let mut slot = LOGGER.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(logger);
    }

    fn log(&self, level: LogLevel, stage: Stage, station_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let station_part = station_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, stage, station_part, message
        );

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, station_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, station_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

fn emit(level: LogLevel, stage: Stage, station_id: Option<&str>, message: &str) {
    let guard = LOGGER.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(logger) = guard.as_ref() {
        logger.log(level, stage, station_id, message);
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Initialize the global logger from the `[logging]` config section.
pub fn init_from_config(config: &LoggingConfig) -> Result<(), QcError> {
    let level = config.min_level()?;
    init_logger(level, config.file.as_deref(), config.console_timestamps);
    Ok(())
}

pub fn info(stage: Stage, station_id: Option<&str>, message: &str) {
    emit(LogLevel::Info, stage, station_id, message);
}

pub fn warn(stage: Stage, station_id: Option<&str>, message: &str) {
    emit(LogLevel::Warning, stage, station_id, message);
}

pub fn error(stage: Stage, station_id: Option<&str>, message: &str) {
    emit(LogLevel::Error, stage, station_id, message);
}

pub fn debug(stage: Stage, station_id: Option<&str>, message: &str) {
    emit(LogLevel::Debug, stage, station_id, message);
}

// ---------------------------------------------------------------------------
// Summary Logging
// ---------------------------------------------------------------------------

/// Share of failed records above which a stage summary is logged as a warning.
pub const FAIL_SHARE_WARNING: f64 = 0.25;

/// Picks the severity for a stage summary from its pass/fail split.
///
/// Nothing evaluated is informational: ratio tests skip every night-time
/// or low-irradiance record. Everything failing is an error. A fail share
/// above `FAIL_SHARE_WARNING` is a warning.
pub fn summary_level(passed: usize, failed: usize) -> LogLevel {
    let total = passed + failed;
    if total == 0 {
        LogLevel::Info
    } else if passed == 0 {
        LogLevel::Error
    } else if failed as f64 / total as f64 > FAIL_SHARE_WARNING {
        LogLevel::Warning
    } else {
        LogLevel::Info
    }
}

/// Log a pass/fail summary for one test of one stage.
pub fn log_stage_summary(
    stage: Stage,
    station_id: Option<&str>,
    test: &str,
    passed: usize,
    failed: usize,
) {
    let message = if passed + failed == 0 {
        format!("{} complete: no records evaluated", test)
    } else {
        format!(
            "{} complete: {}/{} passed, {} failed",
            test,
            passed,
            passed + failed,
            failed
        )
    };
    emit(summary_level(passed, failed), stage, station_id, &message);
}

/// Log a run-aborting error.
pub fn log_run_failure(station_id: Option<&str>, operation: &str, err: &QcError) {
    let stage = match err {
        QcError::NonMonotonicTimestamp { .. } | QcError::ParseError(_) => Stage::Ingest,
        QcError::InvalidGeometry { .. } | QcError::GeometryLengthMismatch { .. } => {
            Stage::Geometry
        }
        QcError::ConfigError(_) => Stage::Config,
    };
    error(stage, station_id, &format!("{} failed: {}", operation, err));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parses_config_spellings() {
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("INFO".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_summary_level_classification() {
        assert_eq!(summary_level(100, 0), LogLevel::Info);
        assert_eq!(summary_level(80, 20), LogLevel::Info);
        assert_eq!(summary_level(70, 30), LogLevel::Warning);
        assert_eq!(summary_level(0, 10), LogLevel::Error);
    }

    #[test]
    fn test_nothing_evaluated_is_not_an_error() {
        // An all-night series skips every ratio test.
        assert_eq!(summary_level(0, 0), LogLevel::Info);
    }
}
