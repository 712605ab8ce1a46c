//! Endpoint definitions resolved from topics.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::delegate::Delegate;
use crate::error::DispatchError;

/// Transport kind assumed for endpoints that do not name one.
pub const DEFAULT_TRANSPORT: &str = "http";

/// Definition fields with a dedicated meaning; everything else is an extra.
pub(crate) const RESERVED_FIELDS: [&str; 5] = ["topic", "url", "method", "transport", "client"];

/// Metadata describing how to reach a topic.
///
/// A definition is cloned for every request, so interceptors may adjust the
/// expanded URL without affecting the store it came from.
#[derive(Clone, Default)]
pub struct EndpointDefinition {
    topic: String,
    url: Option<String>,
    method: Option<String>,
    transport: Option<String>,
    extras: Map<String, Value>,
    delegate: Option<Arc<dyn Delegate>>,
}

impl EndpointDefinition {
    /// Creates a bare definition for `topic`.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Builds a definition from the raw fields of a store leaf.
    ///
    /// The transport kind is read from `transport`, falling back to the
    /// legacy `client` field.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidDefinition`] when `url`, `method` or the
    /// transport kind is present but not a string.
    pub fn from_fields(topic: impl Into<String>, fields: &Map<String, Value>) -> Result<Self, DispatchError> {
        let key_path: String = topic.into();
        let url = string_field(&key_path, fields, "url")?;
        let method = string_field(&key_path, fields, "method")?;
        let transport = match string_field(&key_path, fields, "transport")? {
            Some(kind) => Some(kind),
            None => string_field(&key_path, fields, "client")?,
        };
        let extras = fields
            .iter()
            .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(Self {
            topic: key_path,
            url,
            method,
            transport,
            extras,
            delegate: None,
        })
    }

    /// Sets the URL template.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the request method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets the transport kind.
    #[must_use]
    pub fn with_transport(mut self, kind: impl Into<String>) -> Self {
        self.transport = Some(kind.into());
        self
    }

    /// Adds a transport-specific extra field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Binds a local implementation.
    #[must_use]
    pub fn with_delegate(mut self, delegate: Arc<dyn Delegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Topic under which the definition was registered.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// URL template, or the expanded URL once attached to a request.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub(crate) fn set_url(&mut self, url: String) {
        self.url = Some(url);
    }

    /// Request method as written in the definition.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Transport kind, defaulting to [`DEFAULT_TRANSPORT`].
    #[must_use]
    pub fn transport_kind(&self) -> &str {
        self.transport.as_deref().unwrap_or(DEFAULT_TRANSPORT)
    }

    /// Transport-specific extra fields.
    #[must_use]
    pub const fn extras(&self) -> &Map<String, Value> {
        &self.extras
    }

    /// Looks up a single extra field.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    /// Local implementation bound via delegation, if any.
    #[must_use]
    pub fn delegate(&self) -> Option<&Arc<dyn Delegate>> {
        self.delegate.as_ref()
    }

    /// Renders the definition back into its JSON field form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut fields = self.extras.clone();
        fields.insert("topic".into(), Value::String(self.topic.clone()));
        if let Some(url) = &self.url {
            fields.insert("url".into(), Value::String(url.clone()));
        }
        if let Some(method) = &self.method {
            fields.insert("method".into(), Value::String(method.clone()));
        }
        if let Some(transport) = &self.transport {
            fields.insert("transport".into(), Value::String(transport.clone()));
        }
        Value::Object(fields)
    }
}

impl fmt::Debug for EndpointDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDefinition")
            .field("topic", &self.topic)
            .field("url", &self.url)
            .field("method", &self.method)
            .field("transport", &self.transport)
            .field("extras", &self.extras)
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}

fn string_field(topic: &str, fields: &Map<String, Value>, key: &str) -> Result<Option<String>, DispatchError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(DispatchError::invalid_definition(format!(
            "field '{key}' of topic '{topic}' must be a string, found {other}"
        ))),
    }
}
