//! Logging setup for igx.
//!
//! Library code only emits `tracing` events. The binary decides where they
//! go by calling [`init_logging`]; everything is written to stderr so that
//! JSON and CSV output on stdout stays machine-readable.
//!
//! Filtering is resolved in this order: `IGX_LOG`, then `RUST_LOG`, then the
//! level in [`LogConfig`].
//!
//! ```rust
//! use igx::logging::{init_logging, LogConfig, LogLevel};
//!
//! init_logging(&LogConfig::for_level(LogLevel::Info));
//! tracing::info!("Loading export");
//! ```

use std::time::Instant;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Environment variable holding a filter directive for igx only.
pub const LOG_ENV: &str = "IGX_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Level selected by the `--quiet` / `--verbose` flags.
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Error
        } else if verbose {
            Self::Debug
        } else {
            Self::Warn
        }
    }

    const fn directive(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("Invalid log level: {other}")),
        }
    }
}

/// How events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One line per event.
    #[default]
    Compact,
    /// Multi-line, with the emitting module and source location.
    Pretty,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Prefix events with a timestamp.
    pub timestamps: bool,
    pub colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::for_level(LogLevel::Warn)
    }
}

impl LogConfig {
    /// Debug and trace levels switch to the detailed layout.
    #[must_use]
    pub const fn for_level(level: LogLevel) -> Self {
        let detailed = matches!(level, LogLevel::Debug | LogLevel::Trace);
        Self {
            level,
            format: if detailed {
                LogFormat::Pretty
            } else {
                LogFormat::Compact
            },
            timestamps: detailed,
            colors: true,
        }
    }

    #[must_use]
    pub const fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    fn filter(&self) -> EnvFilter {
        for var in [LOG_ENV, "RUST_LOG"] {
            if let Ok(directive) = std::env::var(var) {
                match EnvFilter::try_new(&directive) {
                    Ok(filter) => return filter,
                    Err(e) => eprintln!("Ignoring {var}={directive}: {e}"),
                }
            }
        }
        EnvFilter::new(format!("igx={}", self.level.directive()))
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(self.colors);

        match (self.format, self.timestamps) {
            (LogFormat::Compact, false) => base.compact().with_target(false).without_time().boxed(),
            (LogFormat::Compact, true) => base.compact().with_target(false).boxed(),
            (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (LogFormat::Pretty, true) => base.pretty().boxed(),
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(config: &LogConfig) {
    let filter = config.filter();
    tracing_subscriber::registry()
        .with(config.layer())
        .with(filter)
        .try_init()
        .ok();
}

/// Subscriber for the command-line tool.
pub fn init_cli_logging(quiet: bool, verbose: bool, colors: bool) {
    init_logging(&LogConfig::for_level(LogLevel::from_flags(quiet, verbose)).with_colors(colors));
}

/// Times a named operation and logs how it ended.
#[must_use = "call complete() or fail() to log the outcome"]
pub struct OperationGuard {
    name: String,
    start: Instant,
}

impl OperationGuard {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        tracing::debug!(operation = %name, "Started");
        Self {
            name,
            start: Instant::now(),
        }
    }

    pub fn complete(self) {
        tracing::info!(
            operation = %self.name,
            duration_ms = self.start.elapsed().as_millis(),
            "Finished"
        );
    }

    pub fn fail(self, error: &dyn std::error::Error) {
        tracing::error!(
            operation = %self.name,
            duration_ms = self.start.elapsed().as_millis(),
            error = %error,
            "Failed"
        );
    }
}
