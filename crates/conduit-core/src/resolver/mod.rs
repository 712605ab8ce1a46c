//! Topic resolution.
//!
//! A [`Resolver`] maps a topic to an endpoint definition, returning `None` to
//! let the next resolver try. The [`ResolverChain`] consults resolvers in
//! registration order and returns the first hit.

use std::fmt;
use std::sync::Arc;

use crate::endpoint::EndpointDefinition;
use crate::error::DispatchError;
use crate::store::DefinitionStore;

/// Maps a topic onto an endpoint definition.
#[cfg_attr(test, mockall::automock)]
pub trait Resolver: Send + Sync {
    /// Returns the endpoint for `topic`, or `None` if this resolver does not
    /// know it.
    fn resolve(&self, topic: &str, store: &DefinitionStore) -> Option<EndpointDefinition>;
}

impl<F> Resolver for F
where
    F: Fn(&str, &DefinitionStore) -> Option<EndpointDefinition> + Send + Sync,
{
    fn resolve(&self, topic: &str, store: &DefinitionStore) -> Option<EndpointDefinition> {
        self(topic, store)
    }
}

/// Resolves topics as dotted paths into the definition store.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

impl Resolver for PathResolver {
    fn resolve(&self, topic: &str, store: &DefinitionStore) -> Option<EndpointDefinition> {
        store.lookup(topic)
    }
}

/// Ordered list of resolvers.
#[derive(Clone, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn Resolver>>,
}

impl ResolverChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resolver.
    pub fn push(&mut self, resolver: Arc<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    /// Number of registered resolvers.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns `true` when no resolver is registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Returns the first endpoint any resolver finds for `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoResolvers`] when the chain is empty and
    /// [`DispatchError::TopicUndefined`] when every resolver declines.
    pub fn resolve(&self, topic: &str, store: &DefinitionStore) -> Result<EndpointDefinition, DispatchError> {
        if self.resolvers.is_empty() {
            return Err(DispatchError::NoResolvers);
        }
        self.resolvers
            .iter()
            .find_map(|resolver| resolver.resolve(topic, store))
            .ok_or_else(|| DispatchError::topic_undefined(topic, self.resolvers.len()))
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverChain")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
