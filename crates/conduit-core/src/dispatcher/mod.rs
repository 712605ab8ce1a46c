//! Topic dispatch entry point.
//!
//! A [`Dispatcher`] owns its definitions, resolvers, interceptors and
//! configuration; two dispatchers never share state. Registration methods
//! take `&self` so a dispatcher can be shared behind an `Arc` and still be
//! reconfigured. Each request copies what it needs under a read lock and
//! releases the lock before the chain runs, so a slow transport never blocks
//! registration or other requests.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::debug;

use crate::Params;
use crate::chain::{ChainExecutor, ChainPolicy};
use crate::delegate::DelegateMap;
use crate::endpoint::EndpointDefinition;
use crate::error::DispatchError;
use crate::interceptor::Interceptor;
use crate::options::{DispatcherConfig, Options};
use crate::request::RequestState;
use crate::resolver::{Resolver, ResolverChain};
use crate::store::DefinitionStore;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

#[derive(Debug, Default)]
struct Registry {
    store: DefinitionStore,
    resolvers: ResolverChain,
    interceptors: Arc<Vec<Interceptor>>,
    config: DispatcherConfig,
}

/// Resolves topics and runs requests through the interceptor chain.
///
/// # Example
///
/// ```
/// use conduit_core::{Dispatcher, Interceptor, Options, Params, PathResolver};
/// use serde_json::json;
///
/// # futures::executor::block_on(async {
/// let dispatcher = Dispatcher::new();
/// dispatcher.register_resolver(PathResolver)?;
/// dispatcher.define(json!({"ping": {"url": "/ping", "method": "get"}}))?;
/// dispatcher.use_interceptor(Interceptor::pre_fn(|request| {
///     request.resolve(json!({"ok": true}));
///     Ok(())
/// }))?;
///
/// let reply = dispatcher.request("ping", Params::new(), Options::new()).await?;
/// assert_eq!(reply, json!({"ok": true}));
/// # Ok::<(), conduit_core::DispatchError>(())
/// # }).expect("dispatch succeeds");
/// ```
#[derive(Debug, Default)]
pub struct Dispatcher {
    registry: RwLock<Registry>,
}

impl Dispatcher {
    /// Creates a dispatcher with default configuration and no resolvers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher with the given configuration.
    #[must_use]
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            registry: RwLock::new(Registry {
                config,
                ..Registry::default()
            }),
        }
    }

    /// Deep-merges endpoint definitions into the store.
    ///
    /// # Errors
    ///
    /// Returns an error when the definitions are malformed or the registry
    /// lock is poisoned.
    pub fn define(&self, definition: Value) -> Result<(), DispatchError> {
        self.write()?.store.define(definition)
    }

    /// Binds local implementations to defined topics.
    ///
    /// Returns the number of endpoints that received an implementation.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the registry lock is poisoned.
    pub fn delegate(&self, implementations: DelegateMap) -> Result<usize, DispatchError> {
        let attached = self.write()?.store.delegate(implementations);
        debug!(target: DISPATCH_TARGET, attached, "delegates bound");
        Ok(attached)
    }

    /// Appends an interceptor to the chain.
    ///
    /// Requests already in flight keep the chain they started with.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidRegistration`] for a transport with an
    /// empty kind.
    pub fn use_interceptor(&self, interceptor: Interceptor) -> Result<(), DispatchError> {
        if let Interceptor::Transport(transport) = &interceptor
            && transport.kind().trim().is_empty()
        {
            return Err(DispatchError::invalid_registration(
                "use: transport adapters must declare a kind",
            ));
        }
        let mut registry = self.write()?;
        debug!(
            target: DISPATCH_TARGET,
            interceptor = %interceptor.label(),
            position = registry.interceptors.len(),
            "interceptor registered"
        );
        Arc::make_mut(&mut registry.interceptors).push(interceptor);
        Ok(())
    }

    /// Appends a resolver to the resolver chain.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the registry lock is poisoned.
    pub fn register_resolver(&self, resolver: impl Resolver + 'static) -> Result<(), DispatchError> {
        self.write()?.resolvers.push(Arc::new(resolver));
        Ok(())
    }

    /// Sets a dispatcher option.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the registry lock is poisoned.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Result<(), DispatchError> {
        self.write()?.config.options.set(key, value);
        Ok(())
    }

    /// Reads a dispatcher option.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the registry lock is poisoned.
    pub fn get(&self, key: &str) -> Result<Option<Value>, DispatchError> {
        Ok(self.read()?.config.options.get(key).cloned())
    }

    /// Returns a copy of every dispatcher option.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the registry lock is poisoned.
    pub fn options(&self) -> Result<Options, DispatchError> {
        Ok(self.read()?.config.options.clone())
    }

    /// Returns the chain policy.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the registry lock is poisoned.
    pub fn policy(&self) -> Result<ChainPolicy, DispatchError> {
        Ok(self.read()?.config.policy)
    }

    /// Replaces the chain policy.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the registry lock is poisoned.
    pub fn set_policy(&self, policy: ChainPolicy) -> Result<(), DispatchError> {
        self.write()?.config.policy = policy;
        Ok(())
    }

    /// Resolves `topic` through the resolver chain.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoResolvers`] or
    /// [`DispatchError::TopicUndefined`] when resolution fails.
    pub fn resolve(&self, topic: &str) -> Result<EndpointDefinition, DispatchError> {
        let registry = self.read()?;
        registry.resolvers.resolve(topic, &registry.store)
    }

    /// Returns every defined endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the registry lock is poisoned.
    pub fn endpoints(&self) -> Result<Vec<EndpointDefinition>, DispatchError> {
        Ok(self.read()?.store.endpoints())
    }

    /// Dispatches a request for `topic`.
    ///
    /// `options` are merged over the dispatcher options, call values winning.
    ///
    /// # Errors
    ///
    /// Fails before any interceptor runs when no resolver is registered, the
    /// topic is unknown or a required URL parameter is missing. Otherwise
    /// returns the rejection set by the chain, or
    /// [`DispatchError::Unresolved`] when nothing settled the request.
    pub async fn request(&self, topic: &str, params: Params, options: Options) -> Result<Value, DispatchError> {
        let (state, interceptors, policy) = {
            let registry = self.read()?;
            let endpoint = registry.resolvers.resolve(topic, &registry.store)?;
            let merged = options.merged_over(&registry.config.options);
            let state = RequestState::prepare(endpoint, params, merged)?;
            (state, Arc::clone(&registry.interceptors), registry.config.policy)
        };
        debug!(
            target: DISPATCH_TARGET,
            topic,
            url = state.url(),
            transport = state.endpoint().transport_kind(),
            "dispatching request"
        );
        ChainExecutor::new(&interceptors, policy).run(state).await
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Registry>, DispatchError> {
        self.registry.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Registry>, DispatchError> {
        self.registry.write().map_err(poisoned)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> DispatchError {
    DispatchError::internal("dispatcher registry lock poisoned")
}
