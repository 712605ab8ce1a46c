//! Structured telemetry initialisation for the binary.
//!
//! A bare level such as `debug` applies to conduit's own crates only; the
//! HTTP and WebSocket stacks underneath stay at `warn` (or quieter) so a
//! verbose run shows the interceptor chain rather than connection pool
//! chatter. Full directive lists are passed through untouched.

use std::io::{self, IsTerminal};

use conduit_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing::{Subscriber, debug, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::CLI_TARGET;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Tracing targets emitted by conduit crates.
const CONDUIT_TARGETS: [&str; 5] = [
    "conduit-cli",
    "conduit-config",
    "conduit-core",
    "conduit-routes",
    "conduit-transport",
];

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

/// Configures the global tracing subscriber on first use.
///
/// Later calls return a fresh [`TelemetryHandle`] without touching the
/// global state again, so a configuration change after the first call has no
/// effect.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparseable filter and
/// [`TelemetryError::Subscriber`] when another subscriber is already
/// installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

/// Expands a bare level into per-crate directives for conduit's targets.
fn scoped_directives(filter: &str) -> String {
    let trimmed = filter.trim();
    let Ok(level) = trimmed.parse::<LevelFilter>() else {
        return trimmed.to_owned();
    };
    if level == LevelFilter::OFF {
        return trimmed.to_owned();
    }
    let dependencies = level.min(LevelFilter::WARN);
    std::iter::once(dependencies.to_string().to_ascii_lowercase())
        .chain(CONDUIT_TARGETS.iter().map(|target| format!("{target}={trimmed}")))
        .collect::<Vec<_>>()
        .join(",")
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let directives = scoped_directives(config.log_filter());
    let filter =
        EnvFilter::try_new(&directives).map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let format = config.log_format();

    let builder = |env_filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_level(true)
            .with_writer(io::stderr)
            .with_ansi(format.colourises() && io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match format {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
        LogFormat::Pretty => Box::new(builder(filter).pretty().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    debug!(
        target: CLI_TARGET,
        %format,
        directives = %directives,
        definitions = %config.definitions_path(),
        "telemetry initialised"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn rejects_malformed_filters() {
        let config = Config {
            log_filter: "info,conduit-core=loudest".to_owned(),
            ..Config::default()
        };
        let error = install_subscriber(&config).expect_err("filter must fail");
        assert!(matches!(error, TelemetryError::Filter(_)));
    }

    #[rstest]
    #[case::verbose(
        "debug",
        "warn,conduit-cli=debug,conduit-config=debug,conduit-core=debug,conduit-routes=debug,conduit-transport=debug"
    )]
    #[case::quieter_than_dependencies(
        "error",
        "error,conduit-cli=error,conduit-config=error,conduit-core=error,conduit-routes=error,conduit-transport=error"
    )]
    #[case::off("off", "off")]
    #[case::directive_list("info,reqwest=debug", "info,reqwest=debug")]
    fn bare_levels_scope_to_conduit_targets(#[case] filter: &str, #[case] expected: &str) {
        assert_eq!(scoped_directives(filter), expected);
    }
}
