//! Logging and tracing configuration
//!
//! Console output always goes to stderr so that it never mixes with generated
//! rows. File logging writes JSON lines to a daily rolling file.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Default log file prefix
pub const DEFAULT_LOG_PREFIX: &str = "tpms-telemetry-simulator";

/// Errors raised while installing the subscriber
#[derive(Error, Debug)]
pub enum LoggingError {
    /// The filter directive could not be parsed
    #[error("Invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber is already installed
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Keeps the non-blocking writers flushing until dropped
#[derive(Debug, Default)]
#[must_use = "dropping the guard stops buffered log output"]
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for the crate
    pub level: Level,
    /// Emit JSON on the console instead of the pretty format
    pub json_format: bool,
    /// Directory for rolling log files, if file logging is on
    pub log_directory: Option<PathBuf>,
    /// Log file prefix
    pub log_file_prefix: String,
    /// Emit span open and close events
    pub enable_span_events: bool,
    /// Use ANSI colors on the console
    pub enable_ansi: bool,
    /// Filter directive overriding `level` and `RUST_LOG`
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
            log_directory: None,
            log_file_prefix: DEFAULT_LOG_PREFIX.to_string(),
            enable_span_events: false,
            enable_ansi: true,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for the command-line verbosity flags.
    ///
    /// `--debug` wins over `--verbose`; neither leaves warnings only.
    pub fn for_verbosity(verbose: bool, debug: bool) -> Self {
        match (verbose, debug) {
            (_, true) => Self::new().with_level(Level::DEBUG).with_span_events(),
            (true, false) => Self::new().with_level(Level::INFO),
            (false, false) => Self::new(),
        }
    }

    /// Set the log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Enable JSON formatting on the console
    pub fn with_json_format(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Enable file logging
    pub fn with_file_logging(mut self, directory: impl Into<PathBuf>) -> Self {
        self.log_directory = Some(directory.into());
        self
    }

    /// Set log file prefix
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_file_prefix = prefix.into();
        self
    }

    /// Enable span events
    pub fn with_span_events(mut self) -> Self {
        self.enable_span_events = true;
        self
    }

    /// Disable ANSI colors
    pub fn without_ansi(mut self) -> Self {
        self.enable_ansi = false;
        self
    }

    /// Set a custom filter directive
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Filter directive applied when neither `env_filter` nor `RUST_LOG` is set
    pub fn default_directive(&self) -> String {
        format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), self.level)
    }

    fn build_filter(&self) -> Result<EnvFilter, LoggingError> {
        match &self.env_filter {
            Some(filter) => Ok(EnvFilter::try_new(filter)?),
            None => Ok(EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(self.default_directive()))?),
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.enable_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Install the global subscriber
    pub fn init(self) -> Result<LoggingGuard, LoggingError> {
        let filter = self.build_filter()?;
        let mut guards = Vec::new();
        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

        let (console_writer, console_guard) = non_blocking(io::stderr());
        guards.push(console_guard);
        if self.json_format {
            layers.push(
                fmt::layer()
                    .json()
                    .with_writer(console_writer)
                    .with_span_events(self.span_events())
                    .boxed(),
            );
        } else {
            layers.push(
                fmt::layer()
                    .pretty()
                    .with_writer(console_writer)
                    .with_ansi(self.enable_ansi)
                    .with_span_events(self.span_events())
                    .boxed(),
            );
        }

        if let Some(directory) = &self.log_directory {
            let (file_writer, file_guard) = non_blocking(rolling::daily(directory, &self.log_file_prefix));
            guards.push(file_guard);
            layers.push(
                fmt::layer()
                    .json()
                    .with_writer(file_writer)
                    .with_span_events(self.span_events())
                    .boxed(),
            );
        }

        Registry::default()
            .with(layers)
            .with(filter)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

        debug!(level = %self.level, file_logging = self.log_directory.is_some(), "Logging initialized");
        Ok(LoggingGuard { _guards: guards })
    }
}

/// Structured event tagged with the simulation component
#[macro_export]
macro_rules! sim_event {
    ($level:ident, $message:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::$level!(
            component = "simulation",
            $($key = $value,)*
            "{}", $message
        );
    };
    ($level:ident, $message:expr) => {
        tracing::$level!(component = "simulation", "{}", $message);
    };
}

/// Span measuring one unit of generation work
#[macro_export]
macro_rules! perf_span {
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info_span!(
            $name,
            component = "performance",
            $($key = $value,)*
        )
    };
    ($name:expr) => {
        tracing::info_span!($name, component = "performance")
    };
}
