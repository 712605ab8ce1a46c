//! Topic-addressed request dispatch for conduit.
//!
//! Callers name a *topic* and hand over parameters; the [`Dispatcher`] maps the
//! topic to an [`EndpointDefinition`] through an ordered [`ResolverChain`],
//! expands the endpoint URL template, and walks a per-call [`RequestState`]
//! through the registered interceptors until one of them settles it.
//!
//! # Architecture
//!
//! * [`store`] keeps endpoint definitions as a deep-merged tree with dotted
//!   namespaces, and binds local [`Delegate`] implementations to them.
//! * [`resolver`] turns topics into endpoints; the first resolver with an
//!   answer wins.
//! * [`template`] substitutes `:name` and `:name?` URL segments.
//! * [`request`] holds the per-call state and its one-way outcome.
//! * [`interceptor`] defines the closed set of chain links: pre-filters,
//!   transports and post-filters.
//! * [`chain`] runs the links strictly in order, containing errors and panics
//!   as rejections.
//!
//! Concrete network transports live in `conduit-transport`; route binding for
//! delegated endpoints lives in `conduit-routes`.

pub mod chain;
pub mod delegate;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod interceptor;
pub mod options;
pub mod request;
pub mod resolver;
pub mod store;
pub mod template;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

#[cfg(test)]
mod tests;

/// Parameter set passed with a request.
pub type Params = serde_json::Map<String, serde_json::Value>;

pub use self::chain::{ChainExecutor, ChainPolicy};
pub use self::delegate::{Delegate, DelegateMap, LOCAL_TRANSPORT, LocalTransport, delegate_fn};
pub use self::dispatcher::Dispatcher;
pub use self::endpoint::{DEFAULT_TRANSPORT, EndpointDefinition};
pub use self::error::{DispatchError, ErrorCategory, TransportError, TransportErrorKind};
pub use self::interceptor::{Filter, Interceptor, Transport};
pub use self::options::{DispatcherConfig, Options};
pub use self::request::{Outcome, RequestSnapshot, RequestState, Settlement};
pub use self::resolver::{PathResolver, Resolver, ResolverChain};
pub use self::store::DefinitionStore;
pub use self::template::MissingParams;
