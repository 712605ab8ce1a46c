//! Endpoint definition store.
//!
//! The [`DefinitionStore`] keeps endpoint definitions as a JSON tree keyed by
//! topic. Nested objects form dotted namespaces: `{"user": {"get": {...}}}`
//! defines the topic `user.get`. Repeated [`DefinitionStore::define`] calls
//! deep-merge into the tree and re-stamp every endpoint's `topic` with its
//! key path.
//!
//! An object is an endpoint when it carries `url`, `method`, `transport` or
//! `client`, holds any non-object value, or is empty. Otherwise it is a
//! namespace. The stamped `topic` field never counts towards the decision, so
//! an empty placeholder filled in by a later merge becomes a namespace.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::delegate::{Delegate, DelegateMap};
use crate::endpoint::EndpointDefinition;
use crate::error::DispatchError;

const ENDPOINT_MARKERS: [&str; 4] = ["url", "method", "transport", "client"];
const TOPIC_FIELD: &str = "topic";

/// Topic-keyed tree of endpoint definitions.
#[derive(Clone, Default)]
pub struct DefinitionStore {
    tree: Map<String, Value>,
    delegates: HashMap<String, Arc<dyn Delegate>>,
}

impl DefinitionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-merges `definition` into the store.
    ///
    /// Objects merge key by key and arrays index by index; any other incoming
    /// value replaces the existing one. The merge is validated before it is
    /// committed, so a failed call leaves the store unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidRegistration`] when `definition` is not
    /// an object, and [`DispatchError::InvalidDefinition`] when a merged
    /// endpoint has malformed fields.
    pub fn define(&mut self, definition: Value) -> Result<(), DispatchError> {
        let Value::Object(incoming) = definition else {
            return Err(DispatchError::invalid_registration(
                "define: definitions must be an object keyed by topic",
            ));
        };
        let mut merged = self.tree.clone();
        merge_maps(&mut merged, incoming);
        stamp_topics(&mut merged, "");

        let mut leaves = Vec::new();
        collect_leaves(&merged, "", &mut leaves);
        for (topic, fields) in leaves {
            EndpointDefinition::from_fields(topic, fields)?;
        }

        self.tree = merged;
        Ok(())
    }

    /// Attaches local implementations to the endpoints they name.
    ///
    /// Topics with no matching endpoint are ignored. Returns the number of
    /// endpoints that received an implementation.
    pub fn delegate(&mut self, implementations: DelegateMap) -> usize {
        let mut attached = 0;
        for (topic, implementation) in implementations {
            if self.leaf(&topic).is_some() {
                self.delegates.insert(topic, implementation);
                attached += 1;
            }
        }
        attached
    }

    /// Looks up the endpoint registered under a possibly dotted topic.
    ///
    /// A top-level key that literally contains dots takes precedence over a
    /// namespace walk.
    #[must_use]
    pub fn lookup(&self, topic: &str) -> Option<EndpointDefinition> {
        let fields = self.leaf(topic)?;
        let mut endpoint = EndpointDefinition::from_fields(topic, fields).ok()?;
        if let Some(delegate) = self.delegates.get(topic) {
            endpoint = endpoint.with_delegate(Arc::clone(delegate));
        }
        Some(endpoint)
    }

    /// Returns every endpoint topic in key order.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        let mut leaves = Vec::new();
        collect_leaves(&self.tree, "", &mut leaves);
        leaves.into_iter().map(|(topic, _)| topic).collect()
    }

    /// Returns every endpoint, with delegates attached.
    #[must_use]
    pub fn endpoints(&self) -> Vec<EndpointDefinition> {
        self.topics().iter().filter_map(|topic| self.lookup(topic)).collect()
    }

    /// Raw definition tree.
    #[must_use]
    pub const fn tree(&self) -> &Map<String, Value> {
        &self.tree
    }

    /// Number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics().len()
    }

    /// Returns `true` when no endpoint is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn leaf(&self, topic: &str) -> Option<&Map<String, Value>> {
        if let Some(Value::Object(fields)) = self.tree.get(topic) {
            return is_endpoint(fields).then_some(fields);
        }
        let mut segments = topic.split('.');
        let first = segments.next()?;
        let mut node = self.tree.get(first)?.as_object()?;
        for segment in segments {
            if is_endpoint(node) {
                return None;
            }
            node = node.get(segment)?.as_object()?;
        }
        is_endpoint(node).then_some(node)
    }
}

impl std::fmt::Debug for DefinitionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut delegated: Vec<_> = self.delegates.keys().collect();
        delegated.sort();
        f.debug_struct("DefinitionStore")
            .field("tree", &self.tree)
            .field("delegated", &delegated)
            .finish()
    }
}

fn is_endpoint(fields: &Map<String, Value>) -> bool {
    fields.keys().all(|key| key == TOPIC_FIELD)
        || ENDPOINT_MARKERS.iter().any(|marker| fields.contains_key(*marker))
        || fields
            .iter()
            .any(|(key, value)| key != TOPIC_FIELD && !value.is_object())
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

fn merge_maps(target: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        match target.entry(key) {
            Entry::Occupied(mut slot) => merge_values(slot.get_mut(), value),
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
}

fn merge_values(target: &mut Value, update: Value) {
    match (target, update) {
        (Value::Object(existing), Value::Object(fields)) => merge_maps(existing, fields),
        (Value::Array(existing), Value::Array(items)) => {
            let mut incoming = items.into_iter();
            for (slot, item) in existing.iter_mut().zip(incoming.by_ref()) {
                merge_values(slot, item);
            }
            existing.extend(incoming);
        }
        (slot, replacement) => *slot = replacement,
    }
}

fn stamp_topics(node: &mut Map<String, Value>, prefix: &str) {
    for (key, value) in node.iter_mut() {
        let Value::Object(fields) = value else {
            continue;
        };
        let path = join_path(prefix, key);
        if is_endpoint(fields) {
            fields.insert(TOPIC_FIELD.into(), Value::String(path));
        } else {
            // A namespace keeps no stamp from the time it was an empty leaf.
            if fields.get(TOPIC_FIELD).is_some_and(|stamp| !stamp.is_object()) {
                fields.remove(TOPIC_FIELD);
            }
            stamp_topics(fields, &path);
        }
    }
}

fn collect_leaves<'a>(node: &'a Map<String, Value>, prefix: &str, out: &mut Vec<(String, &'a Map<String, Value>)>) {
    for (key, value) in node {
        let Value::Object(fields) = value else {
            continue;
        };
        let path = join_path(prefix, key);
        if is_endpoint(fields) {
            out.push((path, fields));
        } else {
            collect_leaves(fields, &path, out);
        }
    }
}

#[cfg(test)]
mod tests;
