//! Per-call request state.
//!
//! A [`RequestState`] is created for every dispatch and handed to each
//! interceptor in turn. Interceptors may change the parameters, the options,
//! the expanded URL and the outcome; the rest of the endpoint is read-only.
//!
//! The outcome moves one way: from [`Outcome::Pending`] to either
//! [`Outcome::Resolved`] or [`Outcome::Rejected`]. [`RequestState::resolve`]
//! and [`RequestState::reject`] only act on a pending request, so the first
//! terminal writer wins. [`RequestState::overwrite`] replaces one terminal
//! value with another; nothing returns a request to pending.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::Params;
use crate::chain::CHAIN_TARGET;
use crate::endpoint::EndpointDefinition;
use crate::error::DispatchError;
use crate::options::Options;
use crate::template;

/// Tri-state outcome of a request.
#[derive(Debug)]
pub enum Outcome {
    /// No interceptor has settled the request yet.
    Pending,
    /// The request succeeded with this payload.
    Resolved(Value),
    /// The request failed with this error.
    Rejected(DispatchError),
}

/// A terminal outcome, used to replace an existing one.
#[derive(Debug)]
pub enum Settlement {
    /// Success payload.
    Resolved(Value),
    /// Failure.
    Rejected(DispatchError),
}

impl From<Settlement> for Outcome {
    fn from(settlement: Settlement) -> Self {
        match settlement {
            Settlement::Resolved(value) => Self::Resolved(value),
            Settlement::Rejected(error) => Self::Rejected(error),
        }
    }
}

impl From<Result<Value, DispatchError>> for Settlement {
    fn from(result: Result<Value, DispatchError>) -> Self {
        match result {
            Ok(value) => Self::Resolved(value),
            Err(error) => Self::Rejected(error),
        }
    }
}

/// Mutable record carried through the interceptor chain.
#[derive(Debug)]
pub struct RequestState {
    endpoint: EndpointDefinition,
    params: Params,
    options: Options,
    outcome: Outcome,
    meta: Map<String, Value>,
}

impl RequestState {
    /// Creates a pending request without touching the endpoint URL.
    #[must_use]
    pub fn new(endpoint: EndpointDefinition, params: Params, options: Options) -> Self {
        Self {
            endpoint,
            params,
            options,
            outcome: Outcome::Pending,
            meta: Map::new(),
        }
    }

    /// Creates a pending request and expands the endpoint URL template.
    ///
    /// Substituted parameters are removed from `params` unless the options set
    /// `keepPathParams`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingParameters`] naming every required
    /// template parameter absent from `params`.
    pub fn prepare(
        mut endpoint: EndpointDefinition,
        mut params: Params,
        options: Options,
    ) -> Result<Self, DispatchError> {
        if let Some(url) = endpoint.url() {
            let consume = !options.keep_path_params();
            let expanded = template::expand_with(url, &mut params, consume)
                .map_err(|missing| DispatchError::missing_parameters(endpoint.topic(), missing.names))?;
            endpoint.set_url(expanded);
        }
        Ok(Self::new(endpoint, params, options))
    }

    /// Resolved endpoint, with its URL already expanded.
    #[must_use]
    pub const fn endpoint(&self) -> &EndpointDefinition {
        &self.endpoint
    }

    /// Topic being dispatched.
    #[must_use]
    pub fn topic(&self) -> &str {
        self.endpoint.topic()
    }

    /// Expanded URL.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.endpoint.url()
    }

    /// Replaces the expanded URL.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.endpoint.set_url(url.into());
    }

    /// Remaining payload parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Mutable payload parameters.
    pub const fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Call-scoped options.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Mutable call-scoped options.
    pub const fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Free-form notes shared between interceptors.
    #[must_use]
    pub const fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    /// Mutable interceptor notes.
    pub const fn meta_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.meta
    }

    /// Current outcome.
    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Resolves a pending request. Returns `false` if it was already settled.
    pub fn resolve(&mut self, value: Value) -> bool {
        if self.is_terminal() {
            debug!(
                target: CHAIN_TARGET,
                topic = self.topic(),
                "ignoring resolve on settled request"
            );
            return false;
        }
        self.outcome = Outcome::Resolved(value);
        true
    }

    /// Rejects a pending request. Returns `false` if it was already settled.
    pub fn reject(&mut self, error: DispatchError) -> bool {
        if self.is_terminal() {
            debug!(
                target: CHAIN_TARGET,
                topic = self.topic(),
                %error,
                "ignoring reject on settled request"
            );
            return false;
        }
        self.outcome = Outcome::Rejected(error);
        true
    }

    /// Replaces the outcome with `settlement`, whatever its current state.
    pub fn overwrite(&mut self, settlement: Settlement) {
        self.outcome = settlement.into();
    }

    /// Success payload, if resolved.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Resolved(value) => Some(value),
            _ => None,
        }
    }

    /// Mutable success payload, for response post-processing.
    pub const fn data_mut(&mut self) -> Option<&mut Value> {
        match &mut self.outcome {
            Outcome::Resolved(value) => Some(value),
            _ => None,
        }
    }

    /// Failure, if rejected.
    #[must_use]
    pub const fn error(&self) -> Option<&DispatchError> {
        match &self.outcome {
            Outcome::Rejected(error) => Some(error),
            _ => None,
        }
    }

    /// Mutable failure, for error annotation.
    pub const fn error_mut(&mut self) -> Option<&mut DispatchError> {
        match &mut self.outcome {
            Outcome::Rejected(error) => Some(error),
            _ => None,
        }
    }

    /// Returns `true` while no interceptor has settled the request.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.outcome, Outcome::Pending)
    }

    /// Returns `true` once resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self.outcome, Outcome::Resolved(_))
    }

    /// Returns `true` once rejected.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self.outcome, Outcome::Rejected(_))
    }

    /// Returns `true` once resolved or rejected.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Consumes the request, yielding its outcome.
    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }

    /// Captures the diagnostic view of the request.
    #[must_use]
    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            topic: self.topic().to_owned(),
            url: self.url().map(str::to_owned),
            method: self.endpoint.method().map(str::to_owned),
            transport: self.endpoint.transport_kind().to_owned(),
            params: self.params.clone(),
            meta: self.meta.clone(),
        }
    }
}

/// Serializable copy of a request, attached to annotated rejections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSnapshot {
    /// Dispatched topic.
    pub topic: String,
    /// Expanded URL.
    pub url: Option<String>,
    /// Request method.
    pub method: Option<String>,
    /// Transport kind.
    pub transport: String,
    /// Remaining payload parameters.
    pub params: Params,
    /// Interceptor notes.
    pub meta: Map<String, Value>,
}
