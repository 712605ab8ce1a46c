//! Incoming calls and the replies a route produces.

use conduit_core::Params;
use serde_json::Value;

/// Endpoint extra naming where non-programmatic callers are sent.
pub const REDIRECT_URL: &str = "redirectUrl";

/// Redirect target used when an endpoint names none.
pub const DEFAULT_REDIRECT: &str = "/";

/// One call arriving at a bound route.
///
/// Parameters come from three sources. When a name appears in more than one,
/// path parameters win over body parameters, which win over query
/// parameters.
#[derive(Debug, Clone, Default)]
pub struct IncomingCall {
    query: Params,
    body: Params,
    path: Params,
    programmatic: bool,
}

impl IncomingCall {
    /// Creates an empty call from a browser-style client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the decoded query parameters.
    #[must_use]
    pub fn with_query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    /// Sets the decoded body parameters.
    #[must_use]
    pub fn with_body(mut self, body: Params) -> Self {
        self.body = body;
        self
    }

    /// Sets the parameters captured from the route path.
    #[must_use]
    pub fn with_path_params(mut self, path: Params) -> Self {
        self.path = path;
        self
    }

    /// Marks the caller as programmatic (an XHR-style client expecting a
    /// structured reply rather than a redirect).
    #[must_use]
    pub const fn programmatic(mut self, programmatic: bool) -> Self {
        self.programmatic = programmatic;
        self
    }

    /// Returns `true` for programmatic callers.
    #[must_use]
    pub const fn is_programmatic(&self) -> bool {
        self.programmatic
    }

    /// Combines the three parameter sources.
    #[must_use]
    pub fn into_params(self) -> Params {
        let mut params = self.query;
        params.extend(self.body);
        params.extend(self.path);
        params
    }
}

/// What a route answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteReply {
    /// Structured response for programmatic callers.
    Json(Value),
    /// Redirect for browser-style callers.
    Redirect(String),
    /// Failure produced by an error handler.
    Failure {
        /// HTTP status to answer with.
        status: u16,
        /// Structured error body.
        body: Value,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn path_beats_body_beats_query() {
        let call = IncomingCall::new()
            .with_query(params(json!({"id": "q", "page": "1", "sort": "asc"})))
            .with_body(params(json!({"id": "b", "page": 2})))
            .with_path_params(params(json!({"id": "p"})));

        assert_eq!(
            Value::Object(call.into_params()),
            json!({"id": "p", "page": 2, "sort": "asc"})
        );
    }
}
