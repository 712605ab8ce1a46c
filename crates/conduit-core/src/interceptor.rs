//! Interceptor variants composed into the dispatch chain.
//!
//! The chain holds three kinds of interceptor:
//!
//! * **pre-filters** inspect or adjust a pending request, or settle it early;
//! * **transports** perform the round-trip for endpoints they accept;
//! * **post-filters** observe every request, settled or not, and may edit the
//!   payload or error in place.
//!
//! Pre-filters and transports are skipped once a request is settled, so a
//! pre-filter that resolves the request prevents the transport from running.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::endpoint::EndpointDefinition;
use crate::error::DispatchError;
use crate::request::RequestState;

/// Middleware that reads and mutates a request.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Processes the request.
    ///
    /// # Errors
    ///
    /// An error forces the request into a rejection carrying that error.
    async fn apply(&self, request: &mut RequestState) -> Result<(), DispatchError>;
}

/// Adapter that performs the round-trip for endpoints of its kind.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport kind this adapter serves, e.g. `http`.
    fn kind(&self) -> &str;

    /// Returns `true` when this adapter should handle `endpoint`.
    fn accepts(&self, endpoint: &EndpointDefinition) -> bool {
        endpoint.transport_kind() == self.kind()
    }

    /// Performs the round-trip for a pending request.
    ///
    /// # Errors
    ///
    /// Returns the failure to reject the request with. Network failures should
    /// be reported as [`DispatchError::Transport`].
    async fn call(&self, request: &RequestState) -> Result<Value, DispatchError>;
}

struct FnFilter<F>(F);

#[async_trait]
impl<F> Filter for FnFilter<F>
where
    F: Fn(&mut RequestState) -> Result<(), DispatchError> + Send + Sync + 'static,
{
    async fn apply(&self, request: &mut RequestState) -> Result<(), DispatchError> {
        (self.0)(request)
    }
}

/// A single link of the interceptor chain.
#[derive(Clone)]
pub enum Interceptor {
    /// Runs while the request is pending.
    PreFilter(Arc<dyn Filter>),
    /// Runs while the request is pending and the endpoint is accepted.
    Transport(Arc<dyn Transport>),
    /// Always runs.
    PostFilter(Arc<dyn Filter>),
}

impl Interceptor {
    /// Wraps a pre-filter.
    #[must_use]
    pub fn pre(filter: impl Filter + 'static) -> Self {
        Self::PreFilter(Arc::new(filter))
    }

    /// Wraps a transport adapter.
    #[must_use]
    pub fn transport(transport: impl Transport + 'static) -> Self {
        Self::Transport(Arc::new(transport))
    }

    /// Wraps a post-filter.
    #[must_use]
    pub fn post(filter: impl Filter + 'static) -> Self {
        Self::PostFilter(Arc::new(filter))
    }

    /// Wraps a synchronous closure as a pre-filter.
    #[must_use]
    pub fn pre_fn<F>(filter: F) -> Self
    where
        F: Fn(&mut RequestState) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        Self::PreFilter(Arc::new(FnFilter(filter)))
    }

    /// Wraps a synchronous closure as a post-filter.
    #[must_use]
    pub fn post_fn<F>(filter: F) -> Self
    where
        F: Fn(&mut RequestState) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        Self::PostFilter(Arc::new(FnFilter(filter)))
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::PreFilter(_) => "pre-filter".to_owned(),
            Self::Transport(transport) => format!("transport:{}", transport.kind()),
            Self::PostFilter(_) => "post-filter".to_owned(),
        }
    }

    /// Returns `true` when this interceptor applies to `request` in its
    /// current state.
    #[must_use]
    pub fn should_run(&self, request: &RequestState) -> bool {
        match self {
            Self::PreFilter(_) => request.is_pending(),
            Self::Transport(transport) => request.is_pending() && transport.accepts(request.endpoint()),
            Self::PostFilter(_) => true,
        }
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
