//! Local implementations bound to endpoint definitions.
//!
//! A delegate serves a topic in-process. The route-binding layer uses
//! delegates to answer incoming calls, and [`LocalTransport`] lets the same
//! definitions be dispatched locally without a network hop.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::Params;
use crate::endpoint::EndpointDefinition;
use crate::error::DispatchError;
use crate::interceptor::Transport;
use crate::options::Options;
use crate::request::RequestState;

/// In-process implementation of a topic.
#[async_trait]
pub trait Delegate: Send + Sync {
    /// Serves one call.
    ///
    /// # Errors
    ///
    /// Returns the failure the caller should observe as a rejection.
    async fn call(&self, params: Params, options: Options) -> Result<Value, DispatchError>;
}

/// Implementations keyed by topic.
pub type DelegateMap = BTreeMap<String, Arc<dyn Delegate>>;

struct FnDelegate<F>(F);

#[async_trait]
impl<F, Fut> Delegate for FnDelegate<F>
where
    F: Fn(Params, Options) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, DispatchError>> + Send + 'static,
{
    async fn call(&self, params: Params, options: Options) -> Result<Value, DispatchError> {
        (self.0)(params, options).await
    }
}

/// Wraps an async closure as a delegate.
#[must_use]
pub fn delegate_fn<F, Fut>(implementation: F) -> Arc<dyn Delegate>
where
    F: Fn(Params, Options) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, DispatchError>> + Send + 'static,
{
    Arc::new(FnDelegate(implementation))
}

/// Transport kind handled by [`LocalTransport`].
pub const LOCAL_TRANSPORT: &str = "local";

/// Transport that answers requests from the endpoint's bound delegate.
///
/// It accepts any endpoint carrying a delegate, whatever its declared kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransport;

#[async_trait]
impl Transport for LocalTransport {
    fn kind(&self) -> &str {
        LOCAL_TRANSPORT
    }

    fn accepts(&self, endpoint: &EndpointDefinition) -> bool {
        endpoint.delegate().is_some()
    }

    async fn call(&self, request: &RequestState) -> Result<Value, DispatchError> {
        let Some(delegate) = request.endpoint().delegate() else {
            return Err(DispatchError::delegate(request.topic(), "no implementation bound"));
        };
        delegate
            .call(request.params().clone(), request.options().clone())
            .await
    }
}
