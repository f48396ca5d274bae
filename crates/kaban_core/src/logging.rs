//! File logging for hosts embedding the board core.
//!
//! Logging is driven by [`LogSettings`] and started at most once per
//! process. Every record is a single `key=value` line carrying ids, counts
//! and states; names, descriptions and comment text are never logged.

use crate::config::LogSettings;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, LogSpecification, Logger, LoggerHandle,
    Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const FILE_BASENAME: &str = "kaban";
const ROTATE_AT_BYTES: u64 = 8 * 1024 * 1024;
const KEPT_FILES: usize = 7;
const PANIC_NOTE_CHARS: usize = 200;

static ACTIVE: OnceCell<Active> = OnceCell::new();

/// Severity threshold accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parses a configured level; `warning` is accepted for `warn`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// `debug` in debug builds, `info` otherwise.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }

    fn filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

/// Level and directory of the running file logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLogging {
    pub level: LogLevel,
    pub dir: PathBuf,
}

#[derive(Debug)]
pub enum LoggingError {
    UnknownLevel(String),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// Logging already runs with other settings.
    AlreadyActive(ActiveLogging),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected error|warn|info|debug|trace"
            ),
            Self::CreateDir { dir, source } => {
                write!(f, "cannot create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyActive(active) => write!(
                f,
                "logging already active at `{}` with level `{}`",
                active.dir.display(),
                active.level.as_str()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            Self::UnknownLevel(_) | Self::AlreadyActive(_) => None,
        }
    }
}

struct Active {
    settings: ActiveLogging,
    _handle: LoggerHandle,
}

/// Starts file logging as configured.
///
/// Returns `Ok(false)` when no directory is configured and `Ok(true)` once
/// file logging runs with exactly these settings.
pub fn init_from_settings(settings: &LogSettings) -> Result<bool, LoggingError> {
    let level = LogLevel::parse(&settings.level)
        .ok_or_else(|| LoggingError::UnknownLevel(settings.level.clone()))?;
    let Some(dir) = settings.dir.as_deref() else {
        return Ok(false);
    };
    init_logging(level, dir)?;
    Ok(true)
}

/// Starts file logging in `dir`, or confirms it already runs there.
///
/// A second call with different settings fails with
/// [`LoggingError::AlreadyActive`] and leaves the running logger alone.
pub fn init_logging(level: LogLevel, dir: &Path) -> Result<(), LoggingError> {
    let wanted = ActiveLogging {
        level,
        dir: dir.to_path_buf(),
    };
    let active = ACTIVE.get_or_try_init(|| start(&wanted))?;
    if active.settings != wanted {
        return Err(LoggingError::AlreadyActive(active.settings.clone()));
    }
    Ok(())
}

pub fn logging_status() -> Option<ActiveLogging> {
    ACTIVE.get().map(|active| active.settings.clone())
}

fn start(settings: &ActiveLogging) -> Result<Active, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|source| LoggingError::CreateDir {
        dir: settings.dir.clone(),
        source,
    })?;

    let spec = LogSpecification::builder()
        .default(settings.level.filter())
        .build();
    let handle = Logger::with(spec)
        .log_to_file(
            FileSpec::default()
                .directory(settings.dir.clone())
                .basename(FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(KEPT_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(LoggingError::Backend)?;

    log_panics();
    info!(
        "event=logging_init module=core status=ok level={} dir={} version={}",
        settings.level.as_str(),
        settings.dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(Active {
        settings: settings.clone(),
        _handle: handle,
    })
}

// Runs once: `start` only succeeds inside the one-time initializer.
fn log_panics() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map_or_else(
            || "unknown".to_string(),
            |location| format!("{}:{}", location.file(), location.line()),
        );
        error!(
            "event=panic module=core status=error location={} note={}",
            location,
            panic_note(info.payload())
        );
        previous(info);
    }));
}

/// Flattens a panic payload to one capped line.
fn panic_note(payload: &(dyn Any + Send)) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<opaque payload>");
    let mut note = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Some((cut, _)) = note.char_indices().nth(PANIC_NOTE_CHARS) {
        note.truncate(cut);
        note.push_str("...");
    }
    note
}
