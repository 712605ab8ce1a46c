//! Sequential interceptor chain execution.
//!
//! The [`ChainExecutor`] walks the interceptors in registration order and
//! awaits each one before starting the next. Failures never escape: an error
//! returned by a filter, or a panic raised by any interceptor, forces the
//! request into a rejection and the walk continues. Once the walk ends the
//! outcome is turned into the caller's result; a request still pending at
//! that point is reported as [`DispatchError::Unresolved`].

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::interceptor::Interceptor;
use crate::request::{Outcome, RequestState, Settlement};

/// Tracing target for chain execution.
pub(crate) const CHAIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::chain");

/// How the executor treats a request once it is settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainPolicy {
    /// Stop walking the chain as soon as the request is settled. When unset,
    /// every remaining interceptor is offered the request and post-filters
    /// observe the final outcome.
    pub stop_on_terminal: bool,
    /// Wrap rejections with a snapshot of the request state.
    pub annotate_rejections: bool,
}

/// Runs an interceptor list against one request.
#[derive(Debug, Clone, Copy)]
pub struct ChainExecutor<'a> {
    interceptors: &'a [Interceptor],
    policy: ChainPolicy,
}

impl<'a> ChainExecutor<'a> {
    /// Creates an executor over `interceptors`.
    #[must_use]
    pub const fn new(interceptors: &'a [Interceptor], policy: ChainPolicy) -> Self {
        Self { interceptors, policy }
    }

    /// Walks the chain and converts the final outcome into a result.
    ///
    /// # Errors
    ///
    /// Returns the rejection set on the request, or
    /// [`DispatchError::Unresolved`] when no interceptor settled it.
    pub async fn run(&self, mut request: RequestState) -> Result<Value, DispatchError> {
        self.execute(&mut request).await;
        self.finalize(request)
    }

    /// Walks the chain, leaving the outcome on `request`.
    pub async fn execute(&self, request: &mut RequestState) {
        for (index, interceptor) in self.interceptors.iter().enumerate() {
            if self.policy.stop_on_terminal && request.is_terminal() {
                debug!(
                    target: CHAIN_TARGET,
                    topic = request.topic(),
                    index,
                    "request settled, stopping chain"
                );
                break;
            }
            if !interceptor.should_run(request) {
                continue;
            }
            debug!(
                target: CHAIN_TARGET,
                topic = request.topic(),
                index,
                interceptor = %interceptor.label(),
                "running interceptor"
            );
            invoke(index, interceptor, request).await;
        }
    }

    fn finalize(&self, request: RequestState) -> Result<Value, DispatchError> {
        let topic = request.topic().to_owned();
        let snapshot = self.policy.annotate_rejections.then(|| request.snapshot());
        match request.into_outcome() {
            Outcome::Resolved(value) => Ok(value),
            Outcome::Rejected(error) => {
                debug!(target: CHAIN_TARGET, %topic, %error, "request rejected");
                if let Some(state) = snapshot {
                    return Err(error.annotate(state));
                }
                Err(error)
            }
            Outcome::Pending => {
                warn!(
                    target: CHAIN_TARGET,
                    %topic,
                    "no interceptor settled the request"
                );
                Err(DispatchError::unresolved(topic))
            }
        }
    }
}

async fn invoke(index: usize, interceptor: &Interceptor, request: &mut RequestState) {
    match interceptor {
        Interceptor::PreFilter(filter) | Interceptor::PostFilter(filter) => {
            match AssertUnwindSafe(filter.apply(request)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => force_reject(index, request, error),
                Err(payload) => force_reject(index, request, panicked(index, payload.as_ref())),
            }
        }
        Interceptor::Transport(transport) => {
            match AssertUnwindSafe(transport.call(request)).catch_unwind().await {
                Ok(Ok(value)) => {
                    request.resolve(value);
                }
                Ok(Err(error)) => {
                    warn!(
                        target: CHAIN_TARGET,
                        topic = request.topic(),
                        transport = transport.kind(),
                        %error,
                        "transport failed"
                    );
                    request.reject(error);
                }
                Err(payload) => force_reject(index, request, panicked(index, payload.as_ref())),
            }
        }
    }
}

fn force_reject(index: usize, request: &mut RequestState, error: DispatchError) {
    warn!(
        target: CHAIN_TARGET,
        topic = request.topic(),
        index,
        %error,
        "interceptor failed, rejecting request"
    );
    request.overwrite(Settlement::Rejected(error));
}

fn panicked(index: usize, payload: &(dyn Any + Send)) -> DispatchError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned());
    DispatchError::InterceptorPanicked { index, message }
}
