//! Dispatcher and call-scoped options.
//!
//! Options are a string-keyed map so interceptors can carry arbitrary
//! call context. A handful of keys have a meaning to the reference
//! transports; typed accessors read those without caching them, so a value
//! changed with [`crate::Dispatcher::set`] is seen by the next request.

use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::chain::ChainPolicy;

/// URL prefix prepended to every endpoint URL.
pub const BASE: &str = "base";
/// Scheme and authority prepended before the base.
pub const HOST: &str = "host";
/// Object of header names to values.
pub const HTTP_HEADERS: &str = "httpHeaders";
/// CSRF token sent as `X-CSRF-Token`.
pub const CSRF: &str = "csrf";
/// Transport timeout in milliseconds.
pub const TIMEOUT: &str = "timeout";
/// Leave substituted path parameters in the payload.
pub const KEEP_PATH_PARAMS: &str = "keepPathParams";

/// String-keyed option map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options(Map<String, Value>);

impl Options {
    /// Creates an empty option map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Builder form of [`Options::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    /// Removes `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns `true` when `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Merges these options over `defaults`; entries in `self` win key by key.
    #[must_use]
    pub fn merged_over(self, defaults: &Self) -> Self {
        let mut merged = defaults.0.clone();
        merged.extend(self.0);
        Self(merged)
    }

    /// Base URL prefix.
    #[must_use]
    pub fn base(&self) -> Option<&str> {
        self.get(BASE).and_then(Value::as_str)
    }

    /// Host prefix.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.get(HOST).and_then(Value::as_str)
    }

    /// Header pairs from `httpHeaders`; non-string values are skipped.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        self.get(HTTP_HEADERS)
            .and_then(Value::as_object)
            .map(|headers| {
                headers
                    .iter()
                    .filter_map(|(name, value)| value.as_str().map(|v| (name.clone(), v.to_owned())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// CSRF token.
    #[must_use]
    pub fn csrf(&self) -> Option<&str> {
        self.get(CSRF).and_then(Value::as_str)
    }

    /// Transport timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.get(TIMEOUT).and_then(Value::as_u64).map(Duration::from_millis)
    }

    /// Whether URL expansion should leave path parameters in the payload.
    #[must_use]
    pub fn keep_path_params(&self) -> bool {
        self.get(KEEP_PATH_PARAMS).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Iterates over the stored entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Options {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Configuration owned by a single dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherConfig {
    /// Options merged under every call's own options.
    pub options: Options,
    /// Interceptor chain policy.
    pub policy: ChainPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        let options = Options::new().with(
            HTTP_HEADERS,
            json!({
                "Content-Type": "application/json",
                "X-Requested-With": "XMLHttpRequest"
            }),
        );
        Self {
            options,
            policy: ChainPolicy::default(),
        }
    }
}
