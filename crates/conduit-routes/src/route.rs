//! Serving one delegated endpoint.

use conduit_core::{
    ChainExecutor, ChainPolicy, EndpointDefinition, Interceptor, LocalTransport, Options, RequestState,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::ROUTES_TARGET;
use crate::call::{DEFAULT_REDIRECT, IncomingCall, REDIRECT_URL, RouteReply};
use crate::error::RouteError;

/// Receives routes from [`crate::bind_routes`].
///
/// Implement this for the application object of a web framework to expose
/// delegated endpoints over the network.
pub trait RouteRegistrar {
    /// Registers `route` for `method` (upper case) and `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the route cannot be registered.
    fn register(&mut self, method: &str, path: &str, route: EndpointRoute) -> Result<(), RouteError>;
}

/// Handler for one delegated endpoint.
///
/// Each call runs the endpoint's implementation through a chain holding only
/// a [`LocalTransport`], so the implementation observes the same parameters
/// and options it would receive from an in-process dispatch.
#[derive(Debug, Clone)]
pub struct EndpointRoute {
    endpoint: EndpointDefinition,
    options: Options,
    policy: ChainPolicy,
}

impl EndpointRoute {
    /// Creates a handler for `endpoint`, passing `options` to every call.
    #[must_use]
    pub const fn new(endpoint: EndpointDefinition, options: Options, policy: ChainPolicy) -> Self {
        Self {
            endpoint,
            options,
            policy,
        }
    }

    /// Endpoint served by this route.
    #[must_use]
    pub const fn endpoint(&self) -> &EndpointDefinition {
        &self.endpoint
    }

    /// Where browser-style callers are redirected after success.
    #[must_use]
    pub fn redirect_url(&self) -> &str {
        self.endpoint
            .extra(REDIRECT_URL)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_REDIRECT)
    }

    /// Serves one call.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Rejected`] when the implementation rejects; the
    /// caller forwards it to its error handler.
    pub async fn handle(&self, call: IncomingCall) -> Result<RouteReply, RouteError> {
        let programmatic = call.is_programmatic();
        let request = RequestState::new(self.endpoint.clone(), call.into_params(), self.options.clone());
        let chain = [Interceptor::transport(LocalTransport)];

        match ChainExecutor::new(&chain, self.policy).run(request).await {
            Ok(value) if programmatic => Ok(RouteReply::Json(value)),
            Ok(_) => {
                debug!(
                    target: ROUTES_TARGET,
                    topic = self.endpoint.topic(),
                    location = self.redirect_url(),
                    "redirecting"
                );
                Ok(RouteReply::Redirect(self.redirect_url().to_owned()))
            }
            Err(error) => {
                warn!(target: ROUTES_TARGET, topic = self.endpoint.topic(), %error, "route rejected");
                Err(RouteError::rejected(self.endpoint.topic(), error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use conduit_core::{DispatchError, Params, delegate_fn};
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn echo_route(endpoint: EndpointDefinition) -> EndpointRoute {
        let echo = delegate_fn(|params: Params, _: Options| async move { Ok(Value::Object(params)) });
        EndpointRoute::new(endpoint.with_delegate(echo), Options::new(), ChainPolicy::default())
    }

    #[rstest]
    #[case::default(EndpointDefinition::new("save"), "/")]
    #[case::configured(EndpointDefinition::new("save").with_extra(REDIRECT_URL, json!("/done")), "/done")]
    #[tokio::test]
    async fn browser_callers_are_redirected(#[case] endpoint: EndpointDefinition, #[case] location: &str) {
        let reply = echo_route(endpoint).handle(IncomingCall::new()).await.expect("handled");
        assert_eq!(reply, RouteReply::Redirect(location.to_owned()));
    }

    #[tokio::test]
    async fn programmatic_callers_get_json() {
        let mut query = Params::new();
        query.insert("q".to_owned(), json!("1"));
        let call = IncomingCall::new().with_query(query).programmatic(true);

        let reply = echo_route(EndpointDefinition::new("search")).handle(call).await.expect("handled");
        assert_eq!(reply, RouteReply::Json(json!({"q": "1"})));
    }

    #[tokio::test]
    async fn rejections_are_returned_for_forwarding() {
        let failing = delegate_fn(|_: Params, _: Options| async move {
            Err::<Value, _>(DispatchError::delegate("save", "disk full"))
        });
        let route = EndpointRoute::new(
            EndpointDefinition::new("save").with_delegate(failing),
            Options::new(),
            ChainPolicy::default(),
        );

        let error = route.handle(IncomingCall::new().programmatic(true)).await.expect_err("rejected");
        assert!(matches!(error, RouteError::Rejected { ref topic, .. } if topic == "save"));
        assert_eq!(error.status(), 500);
    }
}
