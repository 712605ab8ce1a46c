//! In-memory route registrar.
//!
//! [`RouteTable`] is a framework-free [`RouteRegistrar`]: it stores bound
//! routes, matches incoming `method` + path pairs against their URL templates
//! and hands any failure to a single error handler. Embedding applications can
//! put it behind whatever HTTP server they use, and tests can drive delegated
//! endpoints without one.

use std::fmt;
use std::sync::Arc;

use conduit_core::Params;
use conduit_core::template::match_path;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::ROUTES_TARGET;
use crate::call::{IncomingCall, RouteReply};
use crate::error::RouteError;
use crate::route::{EndpointRoute, RouteRegistrar};

/// Turns a routing failure into a reply.
pub type ErrorHandler = Arc<dyn Fn(&RouteError) -> RouteReply + Send + Sync>;

struct BoundRoute {
    method: String,
    path: String,
    route: EndpointRoute,
}

/// Route registrar that serves calls itself.
pub struct RouteTable {
    routes: Vec<BoundRoute>,
    error_handler: ErrorHandler,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            error_handler: Arc::new(default_error_reply),
        }
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.routes().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl RouteTable {
    /// Creates an empty table with the default error handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the error handler.
    #[must_use]
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RouteError) -> RouteReply + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(handler);
        self
    }

    /// Lists the bound routes as `(method, path)` pairs in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes
            .iter()
            .map(|bound| (bound.method.as_str(), bound.path.as_str()))
    }

    /// Number of bound routes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` when no route is bound.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Serves a call for `method` and `target` (a path with optional query).
    ///
    /// The first route whose method and template match wins. Failures,
    /// including unmatched calls, are passed to the error handler.
    pub async fn serve(&self, method: &str, target: &str, body: Params, programmatic: bool) -> RouteReply {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let Some((route, captured)) = self.find(method, path) else {
            debug!(target: ROUTES_TARGET, method, path, "no route matched");
            return (self.error_handler)(&RouteError::NotFound {
                method: method.to_ascii_uppercase(),
                path: path.to_owned(),
            });
        };

        let call = IncomingCall::new()
            .with_query(decode_query(query))
            .with_body(body)
            .with_path_params(captured)
            .programmatic(programmatic);
        match route.handle(call).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(target: ROUTES_TARGET, method, path, %error, "forwarding route error");
                (self.error_handler)(&error)
            }
        }
    }

    fn find(&self, method: &str, path: &str) -> Option<(&EndpointRoute, Params)> {
        self.routes
            .iter()
            .filter(|bound| bound.method.eq_ignore_ascii_case(method))
            .find_map(|bound| match_path(&bound.path, path).map(|captured| (&bound.route, captured)))
    }
}

impl RouteRegistrar for RouteTable {
    fn register(&mut self, method: &str, path: &str, route: EndpointRoute) -> Result<(), RouteError> {
        let upper = method.to_ascii_uppercase();
        if self.routes.iter().any(|bound| bound.method == upper && bound.path == path) {
            return Err(RouteError::DuplicateRoute {
                method: upper,
                path: path.to_owned(),
            });
        }
        self.routes.push(BoundRoute {
            method: upper,
            path: path.to_owned(),
            route,
        });
        Ok(())
    }
}

/// Decodes a query string into string-valued parameters.
fn decode_query(query: &str) -> Params {
    form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

/// Answers with the error's status and a `{"error": message}` body.
#[must_use]
pub fn default_error_reply(error: &RouteError) -> RouteReply {
    RouteReply::Failure {
        status: error.status(),
        body: json!({"error": error.to_string()}),
    }
}
