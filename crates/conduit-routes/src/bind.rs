//! Registering delegated endpoints as routes.

use conduit_core::Dispatcher;
use conduit_core::options::BASE;
use serde_json::Value;
use tracing::debug;

use crate::ROUTES_TARGET;
use crate::error::RouteError;
use crate::route::{EndpointRoute, RouteRegistrar};

/// Registers a route on `registrar` for every endpoint of `dispatcher` that
/// carries a bound implementation.
///
/// The route path is the dispatcher's `base` option followed by the endpoint
/// URL template; the method is the endpoint method in upper case. Endpoints
/// without an implementation are skipped. Returns the number of routes
/// registered.
///
/// # Errors
///
/// Returns [`RouteError::InvalidRoute`] for a delegated endpoint without a
/// method or URL, or whatever the registrar reports.
pub fn bind_routes(dispatcher: &Dispatcher, registrar: &mut impl RouteRegistrar) -> Result<usize, RouteError> {
    let options = dispatcher.options()?;
    let policy = dispatcher.policy()?;
    let base = options.get(BASE).and_then(Value::as_str).unwrap_or_default().to_owned();

    let mut bound = 0;
    for endpoint in dispatcher.endpoints()? {
        if endpoint.delegate().is_none() {
            continue;
        }
        let method = endpoint
            .method()
            .map(|method| method.trim().to_ascii_uppercase())
            .filter(|method| !method.is_empty())
            .ok_or_else(|| RouteError::invalid_route(endpoint.topic(), "no method"))?;
        let url = endpoint
            .url()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| RouteError::invalid_route(endpoint.topic(), "no url"))?;
        let path = format!("{base}{url}");

        debug!(target: ROUTES_TARGET, topic = endpoint.topic(), %method, %path, "binding route");
        registrar.register(&method, &path, EndpointRoute::new(endpoint, options.clone(), policy))?;
        bound += 1;
    }
    Ok(bound)
}
