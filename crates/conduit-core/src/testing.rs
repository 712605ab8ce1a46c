//! Scripted dispatch double for tests.
//!
//! [`ScriptedDispatch`] installs an accept-any resolver and a transport that
//! parks every request until the test answers it. Answers given before a
//! request arrives are queued and consumed by the next request on that topic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::dispatcher::Dispatcher;
use crate::endpoint::EndpointDefinition;
use crate::error::DispatchError;
use crate::interceptor::{Interceptor, Transport};
use crate::request::{RequestState, Settlement};
use crate::store::DefinitionStore;

/// Tracing target for the scripted double.
pub(crate) const SCRIPT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::testing");

/// Transport kind used by the scripted transport.
pub const SCRIPTED_TRANSPORT: &str = "scripted";

#[derive(Default)]
struct Script {
    pending: Vec<(String, oneshot::Sender<Settlement>)>,
    queued: HashMap<String, Settlement>,
}

/// Test double that lets a test answer dispatched requests by topic.
#[derive(Clone, Default)]
pub struct ScriptedDispatch {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDispatch {
    /// Installs the scripted resolver and transport on `dispatcher`.
    ///
    /// Every topic resolves, and every request waits for a scripted answer.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the dispatcher lock is poisoned.
    pub fn install(dispatcher: &Dispatcher) -> Result<Self, DispatchError> {
        let scripted = Self::default();
        dispatcher.register_resolver(|topic: &str, _: &DefinitionStore| {
            Some(EndpointDefinition::new(topic).with_transport(SCRIPTED_TRANSPORT))
        })?;
        dispatcher.use_interceptor(Interceptor::transport(ScriptedTransport {
            script: Arc::clone(&scripted.script),
        }))?;
        Ok(scripted)
    }

    /// Resolves the oldest pending request on `topic`, or queues the value for
    /// the next one.
    pub fn resolve(&self, topic: &str, value: Value) {
        self.answer(topic, Settlement::Resolved(value));
    }

    /// Rejects the oldest pending request on `topic`, or queues the error for
    /// the next one.
    pub fn reject(&self, topic: &str, error: DispatchError) {
        self.answer(topic, Settlement::Rejected(error));
    }

    /// Returns `true` if a request on `topic` is waiting for an answer.
    #[must_use]
    pub fn has_request_for_topic(&self, topic: &str) -> bool {
        self.lock().pending.iter().any(|(pending, _)| pending == topic)
    }

    /// Returns `true` if any request is waiting for an answer.
    #[must_use]
    pub fn has_requests(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    /// Returns `true` if an answer is queued with no request to take it.
    #[must_use]
    pub fn has_queued_responses(&self) -> bool {
        !self.lock().queued.is_empty()
    }

    /// Drops every waiting request; their callers observe a rejection.
    pub fn clear_all(&self) {
        self.lock().pending.clear();
    }

    fn answer(&self, topic: &str, settlement: Settlement) {
        let mut script = self.lock();
        let Some(index) = script.pending.iter().position(|(pending, _)| pending == topic) else {
            script.queued.insert(topic.to_owned(), settlement);
            return;
        };
        let (_, reply) = script.pending.remove(index);
        if let Err(unsent) = reply.send(settlement) {
            debug!(target: SCRIPT_TARGET, topic, ?unsent, "scripted request was abandoned");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn kind(&self) -> &str {
        SCRIPTED_TRANSPORT
    }

    async fn call(&self, request: &RequestState) -> Result<Value, DispatchError> {
        let topic = request.topic().to_owned();
        let waiting = {
            let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(settlement) = script.queued.remove(&topic) {
                return settle(settlement);
            }
            let (reply, waiting) = oneshot::channel();
            script.pending.push((topic.clone(), reply));
            waiting
        };
        match waiting.await {
            Ok(settlement) => settle(settlement),
            Err(_) => Err(DispatchError::interceptor(format!(
                "scripted request for '{topic}' was cleared"
            ))),
        }
    }
}

fn settle(settlement: Settlement) -> Result<Value, DispatchError> {
    match settlement {
        Settlement::Resolved(value) => Ok(value),
        Settlement::Rejected(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::Params;
    use crate::options::Options;

    async fn wait_for(scripted: &ScriptedDispatch, topic: &str) {
        for _ in 0..100 {
            if scripted.has_request_for_topic(topic) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no request arrived for {topic}");
    }

    #[tokio::test]
    async fn answers_pending_requests() {
        let dispatcher = Arc::new(Dispatcher::new());
        let scripted = ScriptedDispatch::install(&dispatcher).expect("install");

        let caller = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.request("user.get", Params::new(), Options::new()).await })
        };
        wait_for(&scripted, "user.get").await;
        assert!(scripted.has_requests());

        scripted.resolve("user.get", json!({"id": 1}));
        let reply = caller.await.expect("task joins").expect("scripted resolve");
        assert_eq!(reply, json!({"id": 1}));
        assert!(!scripted.has_requests());
    }

    #[tokio::test]
    async fn queued_answers_serve_the_next_request() {
        let dispatcher = Dispatcher::new();
        let scripted = ScriptedDispatch::install(&dispatcher).expect("install");
        scripted.reject("save", DispatchError::interceptor("quota"));
        assert!(scripted.has_queued_responses());

        let error = dispatcher
            .request("save", Params::new(), Options::new())
            .await
            .expect_err("queued rejection");
        assert!(error.to_string().contains("quota"));
        assert!(!scripted.has_queued_responses());
    }

    #[tokio::test]
    async fn clearing_rejects_waiting_callers() {
        let dispatcher = Arc::new(Dispatcher::new());
        let scripted = ScriptedDispatch::install(&dispatcher).expect("install");

        let caller = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.request("slow", Params::new(), Options::new()).await })
        };
        wait_for(&scripted, "slow").await;
        scripted.clear_all();

        let error = caller.await.expect("task joins").expect_err("cleared");
        assert!(error.to_string().contains("cleared"));
    }

    #[tokio::test]
    async fn answering_an_abandoned_request_neither_queues_nor_panics() {
        let dispatcher = Arc::new(Dispatcher::new());
        let scripted = ScriptedDispatch::install(&dispatcher).expect("install");

        let caller = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.request("gone", Params::new(), Options::new()).await })
        };
        wait_for(&scripted, "gone").await;
        caller.abort();
        assert!(caller.await.expect_err("aborted").is_cancelled());

        scripted.resolve("gone", json!(1));
        assert!(!scripted.has_requests());
        assert!(!scripted.has_queued_responses());
    }
}
