//! Route binding for delegated conduit endpoints.
//!
//! Endpoint definitions are shared between callers and servers. On the
//! serving side, topics bound to a local implementation (see
//! [`conduit_core::Dispatcher::delegate`]) are exposed as network routes:
//! [`bind_routes`] walks the dispatcher's endpoints and registers one
//! [`EndpointRoute`] per delegated endpoint on any [`RouteRegistrar`].
//!
//! Each route merges query, body and path parameters, runs the
//! implementation, and answers programmatic callers with JSON and browser
//! callers with a redirect. Rejections are handed back as [`RouteError`]s so
//! the embedding framework's error handler sees them; [`RouteTable`] shows
//! the pattern with a pluggable handler.

pub mod bind;
pub mod call;
pub mod error;
pub mod route;
pub mod table;

#[cfg(test)]
mod tests;

/// Tracing target for route binding and serving.
pub(crate) const ROUTES_TARGET: &str = env!("CARGO_PKG_NAME");

pub use self::bind::bind_routes;
pub use self::call::{DEFAULT_REDIRECT, IncomingCall, REDIRECT_URL, RouteReply};
pub use self::error::RouteError;
pub use self::route::{EndpointRoute, RouteRegistrar};
pub use self::table::{ErrorHandler, RouteTable, default_error_reply};
