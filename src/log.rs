//! Append-only run log for the orchestration core.
//!
//! Log levels:
//! - ERROR: Failures surfaced to the caller as error responses
//! - WARN: Recoverable oddities (dropped dependency names, unreadable state)
//! - INFO: Mode switches, generated projects, hand-outs
//! - DEBUG: Hand-out scores
//! - TRACE: Analyzer keyword matches and scheduler eligibility rejections
//!
//! Each CLI invocation appends to the same file, one line per event tagged
//! with the process id, so consecutive runs can be read back in order.
//! Nothing is written until `init` or `init_at` opens a file.
//!
//! The level comes from `MAESTRO_LOG` (error, warn, info, debug, trace);
//! `--debug` or `MAESTRO_DEBUG=1` raise it to at least debug.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::error::{Error, Result};

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// Level for this process: `MAESTRO_LOG`, raised to debug by the flag
    /// or `MAESTRO_DEBUG`. An unparsable `MAESTRO_LOG` is ignored.
    pub fn from_env(debug_flag: bool) -> Self {
        let base = std::env::var("MAESTRO_LOG")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LogLevel::Info);
        let env_debug = std::env::var("MAESTRO_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self::resolve(base, debug_flag || env_debug)
    }

    fn resolve(base: LogLevel, debug: bool) -> Self {
        if debug {
            base.max(LogLevel::Debug)
        } else {
            base
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(Error::InvalidArgument(format!(
                "unknown log level '{}' (expected error, warn, info, debug or trace)",
                other
            ))),
        }
    }
}

/// Append to ~/.maestro/maestro.log at `level`.
///
/// Logging stays off when there is no home directory or the file cannot
/// be opened; the CLI still runs.
pub fn init(level: LogLevel) {
    if let Some(path) = dirs::home_dir().map(|h| h.join(".maestro").join("maestro.log")) {
        let _ = init_at(&path, level);
    }
}

/// Append to `path` at `level`. Only the first successful call picks the
/// file; later calls just change the level.
pub fn init_at(path: &Path, level: LogLevel) -> Result<()> {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
    if LOG_FILE.get().is_some() {
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = LOG_FILE.set(Mutex::new(file));
    Ok(())
}

/// Whether a message at `level` would be written.
pub fn enabled(level: LogLevel) -> bool {
    LOG_FILE.get().is_some() && level as u8 <= LOG_LEVEL.load(Ordering::Relaxed)
}

pub fn log_at(level: LogLevel, msg: &str) {
    if !enabled(level) {
        return;
    }
    if let Some(file) = LOG_FILE.get() {
        let mut file = file.lock().unwrap_or_else(|e| e.into_inner());
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(
            file,
            "[{}] [{}] [{}] {}",
            timestamp,
            std::process::id(),
            level.as_str(),
            msg
        );
    }
}

/// Log at INFO level.
#[macro_export]
macro_rules! mlog {
    ($($arg:tt)*) => {
        $crate::mlog_at!($crate::log::LogLevel::Info, $($arg)*)
    };
}

#[macro_export]
macro_rules! mlog_error {
    ($($arg:tt)*) => {
        $crate::mlog_at!($crate::log::LogLevel::Error, $($arg)*)
    };
}

#[macro_export]
macro_rules! mlog_warn {
    ($($arg:tt)*) => {
        $crate::mlog_at!($crate::log::LogLevel::Warn, $($arg)*)
    };
}

#[macro_export]
macro_rules! mlog_debug {
    ($($arg:tt)*) => {
        $crate::mlog_at!($crate::log::LogLevel::Debug, $($arg)*)
    };
}

/// Log at TRACE level. Arguments are not formatted unless tracing is on.
#[macro_export]
macro_rules! mlog_trace {
    ($($arg:tt)*) => {
        $crate::mlog_at!($crate::log::LogLevel::Trace, $($arg)*)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! mlog_at {
    ($level:expr, $($arg:tt)*) => {
        if $crate::log::enabled($level) {
            $crate::log::log_at($level, &format!($($arg)*))
        }
    };
}
