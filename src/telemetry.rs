//! Structured logging initialisation.
//!
//! Logs go to stderr so they never mix with command output on stdout.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{subscriber::SetGlobalDefaultError, Subscriber};
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Environment variable holding a log filter directive.
pub const LOG_ENV: &str = "MESHLOCK_LOG";

/// Filter used when nothing else is configured.
pub const DEFAULT_FILTER: &str = "warn";

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub json: bool,
}

impl LogSettings {
    /// Resolve settings: `--debug` wins, then `MESHLOCK_LOG`, then config.
    pub fn resolve(debug: bool, env: Option<String>, config: &Config) -> Self {
        let filter = if debug {
            "debug".to_string()
        } else {
            env.filter(|f| !f.trim().is_empty())
                .or_else(|| config.log_filter().map(str::to_string))
                .unwrap_or_else(|| DEFAULT_FILTER.to_string())
        };
        Self {
            filter,
            json: config.log_json(),
        }
    }
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent: only the first call installs the
/// subscriber.
pub fn initialise(settings: &LogSettings) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(settings))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(settings: &LogSettings) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&settings.filter)
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = if settings.json {
        Box::new(builder(filter).json().flatten_event(true).finish())
    } else {
        Box::new(builder(filter).compact().finish())
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
