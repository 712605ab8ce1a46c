//! Error types surfaced by topic dispatch.
//!
//! Every failure a caller can observe is a [`DispatchError`]. The variants map
//! onto a small taxonomy (see [`ErrorCategory`]) so callers can tell a
//! configuration bug from a missing parameter or a failed network round-trip
//! without matching on message text. Transport failures carry a
//! [`TransportError`] with enough context (status, method, path, raw body) to
//! distinguish client-class from server-class failures.

use strum::Display;
use thiserror::Error;

use crate::request::RequestSnapshot;

/// Broad classification of dispatch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    /// The dispatcher itself is misconfigured. Never retried.
    Configuration,
    /// No resolver could map the topic to an endpoint.
    Resolution,
    /// A required URL template parameter was missing.
    Parameter,
    /// The network round-trip failed.
    Transport,
    /// An interceptor failed while processing the request.
    Interceptor,
    /// Internal invariant violation such as a poisoned lock.
    Internal,
}

/// Errors surfaced while dispatching a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No resolvers have been registered on the dispatcher.
    #[error("no resolvers defined, cannot retrieve endpoint for topic")]
    NoResolvers,

    /// Every registered resolver returned nothing for the topic.
    #[error("topic undefined: {topic} checking {resolvers} resolvers")]
    TopicUndefined {
        /// Topic that could not be resolved.
        topic: String,
        /// Number of resolvers consulted.
        resolvers: usize,
    },

    /// Required URL template parameters were absent from the call.
    #[error("missing parameters for topic '{topic}': {}", .names.join(", "))]
    MissingParameters {
        /// Topic being dispatched.
        topic: String,
        /// Names of the missing parameters, in template order.
        names: Vec<String>,
    },

    /// An endpoint definition could not be interpreted.
    #[error("invalid definition: {message}")]
    InvalidDefinition {
        /// Description of the malformed definition.
        message: String,
    },

    /// A registration call received unusable arguments.
    #[error("invalid registration: {message}")]
    InvalidRegistration {
        /// Description of the rejected registration.
        message: String,
    },

    /// The chain finished without any interceptor settling the request.
    #[error("unresolved request: no interceptor provided a value for topic '{topic}'")]
    Unresolved {
        /// Topic whose request stayed pending.
        topic: String,
    },

    /// A transport adapter reported a failed round-trip.
    #[error(transparent)]
    Transport(Box<TransportError>),

    /// An interceptor returned an error.
    #[error("interceptor failed: {message}")]
    Interceptor {
        /// Failure description supplied by the interceptor.
        message: String,
    },

    /// An interceptor panicked; the panic was contained by the executor.
    #[error("interceptor {index} panicked: {message}")]
    InterceptorPanicked {
        /// Position of the interceptor in the chain.
        index: usize,
        /// Panic payload rendered as text.
        message: String,
    },

    /// A local delegate implementation failed.
    #[error("delegate for topic '{topic}' failed: {message}")]
    Delegate {
        /// Topic whose delegate failed.
        topic: String,
        /// Failure description supplied by the delegate.
        message: String,
    },

    /// A rejection annotated with the request state that produced it.
    #[error("{source} (topic '{}')", .request.topic)]
    Annotated {
        /// The original rejection.
        #[source]
        source: Box<DispatchError>,
        /// Snapshot of the request when the chain finished.
        request: Box<RequestSnapshot>,
    },

    /// Internal error (e.g., lock poisoned).
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal failure.
        message: String,
    },
}

impl DispatchError {
    /// Classifies the error. Annotated errors report their inner category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            Self::NoResolvers
            | Self::InvalidDefinition { .. }
            | Self::InvalidRegistration { .. }
            | Self::Unresolved { .. } => ErrorCategory::Configuration,
            Self::TopicUndefined { .. } => ErrorCategory::Resolution,
            Self::MissingParameters { .. } => ErrorCategory::Parameter,
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Interceptor { .. }
            | Self::InterceptorPanicked { .. }
            | Self::Delegate { .. } => ErrorCategory::Interceptor,
            Self::Annotated { .. } | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the innermost error, looking through annotations.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Annotated { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the transport error, if this is (or wraps) one.
    #[must_use]
    pub fn transport(&self) -> Option<&TransportError> {
        match self.root() {
            Self::Transport(error) => Some(error.as_ref()),
            _ => None,
        }
    }

    /// Returns the HTTP status carried by a transport failure.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.transport().and_then(|error| error.status)
    }

    /// Returns the request snapshot attached by an annotating executor.
    #[must_use]
    pub fn request(&self) -> Option<&RequestSnapshot> {
        match self {
            Self::Annotated { request, .. } => Some(request),
            _ => None,
        }
    }

    /// Wraps the error with a snapshot of the request that produced it.
    #[must_use]
    pub fn annotate(self, request: RequestSnapshot) -> Self {
        Self::Annotated {
            source: Box::new(self),
            request: Box::new(request),
        }
    }

    /// Creates a topic undefined error.
    #[must_use]
    pub fn topic_undefined(topic: impl Into<String>, resolvers: usize) -> Self {
        Self::TopicUndefined {
            topic: topic.into(),
            resolvers,
        }
    }

    /// Creates a missing parameters error.
    #[must_use]
    pub fn missing_parameters(topic: impl Into<String>, names: Vec<String>) -> Self {
        Self::MissingParameters {
            topic: topic.into(),
            names,
        }
    }

    /// Creates an invalid definition error.
    #[must_use]
    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            message: message.into(),
        }
    }

    /// Creates an invalid registration error.
    #[must_use]
    pub fn invalid_registration(message: impl Into<String>) -> Self {
        Self::InvalidRegistration {
            message: message.into(),
        }
    }

    /// Creates an unresolved request error.
    #[must_use]
    pub fn unresolved(topic: impl Into<String>) -> Self {
        Self::Unresolved {
            topic: topic.into(),
        }
    }

    /// Creates an interceptor error.
    #[must_use]
    pub fn interceptor(message: impl Into<String>) -> Self {
        Self::Interceptor {
            message: message.into(),
        }
    }

    /// Creates a delegate error.
    #[must_use]
    pub fn delegate(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delegate {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<TransportError> for DispatchError {
    fn from(error: TransportError) -> Self {
        Self::Transport(Box::new(error))
    }
}

/// Failure modes of a transport round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TransportErrorKind {
    /// The peer answered with a non-success status.
    Status,
    /// The response body could not be decoded.
    Decode,
    /// The connection could not be established or broke mid-flight.
    Connect,
    /// No reply arrived within the configured timeout.
    Timeout,
    /// The endpoint names a method the transport does not support.
    InvalidMethod,
    /// The endpoint has no URL to call.
    MissingUrl,
    /// The peer violated the transport's message protocol.
    Protocol,
    /// The peer reported an application-level failure.
    Remote,
}

/// Diagnostic record of a failed transport round-trip.
///
/// # Example
///
/// ```
/// use conduit_core::{TransportError, TransportErrorKind};
///
/// let error = TransportError::new(TransportErrorKind::Status, "not ok")
///     .with_status(404)
///     .with_method("GET")
///     .with_path("/api/user/7");
/// assert!(error.is_client_error());
/// assert!(!error.is_server_error());
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} error: {message}{}", describe_status(.status))]
pub struct TransportError {
    /// Failure class.
    pub kind: TransportErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Response status code, when the peer answered.
    pub status: Option<u16>,
    /// Request method.
    pub method: Option<String>,
    /// Request path (without host).
    pub path: Option<String>,
    /// Raw response body, kept verbatim for diagnostics.
    pub body: Option<String>,
}

fn describe_status(status: &Option<u16>) -> String {
    status.map_or_else(String::new, |code| format!(" (status {code})"))
}

impl TransportError {
    /// Creates a transport error without request context.
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            method: None,
            path: None,
            body: None,
        }
    }

    /// Creates a timeout error for the given budget.
    #[must_use]
    pub fn timeout(millis: u128) -> Self {
        Self::new(
            TransportErrorKind::Timeout,
            format!("no reply within {millis}ms"),
        )
    }

    /// Records the response status.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Records the request method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Records the request path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Records the raw response body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns `true` for 4xx statuses.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.status, Some(400..=499))
    }

    /// Returns `true` for 5xx statuses.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self.status, Some(500..=599))
    }

    /// Returns `true` when the round-trip timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, TransportErrorKind::Timeout)
    }
}

#[cfg(test)]
mod tests;
