//! Layered configuration for the conduit binary.
//!
//! [`Config`] is loaded through `ortho_config`, which merges built-in
//! defaults, an optional TOML file (`--config-path` or
//! `CONDUIT_CONFIG_PATH`), `CONDUIT_*` environment variables and command-line
//! flags, later layers winning. The loaded values seed the option map of a
//! [`conduit_core::Dispatcher`] via [`Config::dispatcher_config`]; they are
//! never cached elsewhere.

mod defaults;
mod logging;

use std::time::Duration;

use camino::Utf8PathBuf;
use conduit_core::DispatcherConfig;
use conduit_core::options::{BASE, CSRF, HOST, TIMEOUT};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use self::defaults::{
    DEFAULT_DEFINITIONS_PATH, DEFAULT_LOG_FILTER, DEFAULT_TIMEOUT, default_log_filter,
    default_log_filter_string, default_log_format, default_timeout_ms,
};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Process configuration shared by the binary and embedding applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CONDUIT")]
#[serde(default)]
pub struct Config {
    /// URL prefix placed between the host and every endpoint URL.
    pub base_url: Option<String>,
    /// Scheme and authority of the remote service, e.g. `https://api.example.com`.
    pub host: Option<String>,
    /// Token sent as the `X-CSRF-Token` header.
    pub csrf_token: Option<String>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// JSON file holding endpoint definitions.
    pub definitions_path: Utf8PathBuf,
    /// `tracing` filter expression. A bare level applies to conduit crates only.
    pub log_filter: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            host: None,
            csrf_token: None,
            timeout_ms: default_timeout_ms(),
            definitions_path: Utf8PathBuf::from(DEFAULT_DEFINITIONS_PATH),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Filter expression for the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Path of the endpoint definitions file.
    #[must_use]
    pub const fn definitions_path(&self) -> &Utf8PathBuf {
        &self.definitions_path
    }

    /// Builds the dispatcher configuration, layering the configured values
    /// over the dispatcher defaults.
    #[must_use]
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        let mut config = DispatcherConfig::default();
        let options = &mut config.options;
        if let Some(base) = &self.base_url {
            options.set(BASE, Value::String(base.clone()));
        }
        if let Some(host) = &self.host {
            options.set(HOST, Value::String(host.clone()));
        }
        if let Some(token) = &self.csrf_token {
            options.set(CSRF, Value::String(token.clone()));
        }
        options.set(TIMEOUT, Value::from(self.timeout_ms));
        config
    }
}
