//! Logging infrastructure - structured tracing for marshalling
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable level from the environment or `spice-marshal.toml`
//! - Zero-cost when disabled
//! - Duration tracking through `perf::track` guards
//! - Console or file output, human-readable or JSON

use crate::config::LoggingConfig;
use crate::errors::MarshalError;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub use tracing::{debug, error, info, trace, warn};

/// Global logging state
static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Keeps the non-blocking file writer flushing until process exit
static FILE_GUARD: Lazy<Mutex<Option<WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Log file path; console (stderr) when unset
    pub log_path: Option<PathBuf>,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            log_path: None,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `SPICE_MARSHAL_LOG_*` variables on top of `self`
    pub fn with_env_overrides(mut self) -> Self {
        // SPICE_MARSHAL_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level) = std::env::var("SPICE_MARSHAL_LOG_LEVEL") {
            self.level = parse_level(&level).unwrap_or(self.level);
        }

        // SPICE_MARSHAL_LOG_FILE: path to log file
        if let Ok(path) = std::env::var("SPICE_MARSHAL_LOG_FILE") {
            self.log_path = Some(PathBuf::from(path));
        }

        if std::env::var("SPICE_MARSHAL_LOG_JSON").is_ok() {
            self.json_format = true;
        }
        if std::env::var("SPICE_MARSHAL_LOG_SPANS").is_ok() {
            self.show_spans = true;
        }

        self
    }

    /// Verbose config for debugging conversions
    pub fn debug() -> Self {
        Self {
            level: Level::TRACE,
            log_path: None,
            json_format: false,
            show_spans: true,
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(settings: &LoggingConfig) -> Self {
        Self {
            level: parse_level(&settings.level).unwrap_or(Level::WARN),
            log_path: settings.file.clone(),
            json_format: settings.json,
            show_spans: settings.spans,
        }
    }
}

/// Parse a level name, case-insensitive
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize logging with default configuration
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration
///
/// Only the first call has any effect. An already installed global subscriber
/// (a host application's, or a test harness's) is left in place.
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "spice_marshal={}",
                config.level.as_str().to_lowercase()
            ))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let writer = match config.log_path.as_deref().and_then(file_writer) {
            Some((writer, guard)) => {
                *FILE_GUARD.lock() = Some(guard);
                BoxMakeWriter::new(writer)
            }
            None => BoxMakeWriter::new(io::stderr),
        };

        let layer = fmt::layer()
            .with_writer(writer)
            .with_span_events(span_events)
            .with_target(true)
            .with_line_number(cfg!(debug_assertions));

        let layer = if config.json_format {
            layer.json().boxed()
        } else {
            layer.boxed()
        };

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init();
    });
}

fn file_writer(path: &Path) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let file_name = path.file_name()?;
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let appender = tracing_appender::rolling::never(directory, file_name);
    Some(tracing_appender::non_blocking(appender))
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

// ============================================================================
// Marshalling-specific logging functions
// ============================================================================

/// Log a completed conversion
#[inline]
pub fn log_conversion(operation: &str) {
    trace!(
        target: "interop",
        event = "conversion",
        operation = operation,
        "Conversion complete"
    );
}

/// Log a failed conversion
pub fn log_marshal_error(operation: &str, error: &MarshalError) {
    debug!(
        target: "interop",
        event = "marshal_error",
        operation = operation,
        kind = error.kind(),
        error = %error,
        "Conversion failed"
    );
}

/// Log a native handoff through the C ABI
pub fn log_ffi_call(fn_name: &str) {
    trace!(
        event = "ffi_call",
        function = fn_name,
        "FFI function called"
    );
}

/// Performance tracking utilities
pub mod perf {
    use std::time::Instant;
    use tracing::debug;

    /// Track operation duration (returns guard that logs on drop)
    #[must_use]
    pub fn track(operation: &'static str) -> PerformanceGuard {
        PerformanceGuard {
            operation,
            start: Instant::now(),
        }
    }

    pub struct PerformanceGuard {
        operation: &'static str,
        start: Instant,
    }

    impl Drop for PerformanceGuard {
        fn drop(&mut self) {
            let elapsed = self.start.elapsed();
            debug!(
                operation = self.operation,
                duration_us = elapsed.as_micros() as u64,
                "operation completed"
            );
        }
    }
}
