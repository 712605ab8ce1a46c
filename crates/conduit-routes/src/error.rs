//! Error types for route binding and handling.

use conduit_core::DispatchError;
use thiserror::Error;

/// Errors raised while binding or serving delegated routes.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A delegated endpoint lacks the method or URL needed to route it.
    #[error("endpoint '{topic}' cannot be routed: {reason}")]
    InvalidRoute {
        /// Topic of the offending endpoint.
        topic: String,
        /// What is missing.
        reason: String,
    },

    /// Two delegated endpoints claim the same method and path.
    #[error("route {method} {path} is already bound")]
    DuplicateRoute {
        /// Upper-case HTTP method.
        method: String,
        /// Full route path.
        path: String,
    },

    /// No bound route matches an incoming call.
    #[error("no route for {method} {path}")]
    NotFound {
        /// Upper-case HTTP method.
        method: String,
        /// Requested path without query.
        path: String,
    },

    /// The implementation rejected the call.
    #[error("'{topic}' was rejected: {source}")]
    Rejected {
        /// Topic served by the route.
        topic: String,
        /// Rejection produced by the implementation.
        #[source]
        source: Box<DispatchError>,
    },

    /// The dispatcher could not be read while binding.
    #[error(transparent)]
    Dispatch(Box<DispatchError>),
}

impl RouteError {
    /// Creates an [`RouteError::InvalidRoute`] error.
    #[must_use]
    pub fn invalid_route(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRoute {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`RouteError::Rejected`] error.
    #[must_use]
    pub fn rejected(topic: impl Into<String>, source: DispatchError) -> Self {
        Self::Rejected {
            topic: topic.into(),
            source: Box::new(source),
        }
    }

    /// HTTP status a generic error handler should answer with.
    ///
    /// Rejections carrying a transport status keep it; missing parameters are
    /// client errors; anything else is a server error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Rejected { source, .. } => match source.root() {
                DispatchError::MissingParameters { .. } => 400,
                root => root.status().unwrap_or(500),
            },
            Self::InvalidRoute { .. } | Self::DuplicateRoute { .. } | Self::Dispatch(_) => 500,
        }
    }
}

impl From<DispatchError> for RouteError {
    fn from(error: DispatchError) -> Self {
        Self::Dispatch(Box::new(error))
    }
}
