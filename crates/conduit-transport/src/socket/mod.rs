//! WebSocket transport adapter.
//!
//! [`WebSocketTransport`] serves endpoints whose transport kind is `socket`.
//! Each call opens a connection, emits `{"topic": ..., "params": ...}` and
//! waits for a reply frame whose `event` names the success or failure event
//! for the topic. The success event defaults to `on` followed by the
//! capitalised topic and can be overridden with the endpoint's
//! `successEvent` field; `failureEvent` names the rejecting event. Frames for
//! other events are ignored.

use std::time::Duration;

use async_trait::async_trait;
use conduit_core::{DispatchError, RequestState, Transport, TransportError, TransportErrorKind};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Tracing target for socket transport operations.
pub(crate) const SOCKET_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::socket");

/// Transport kind served by [`WebSocketTransport`].
pub const SOCKET_TRANSPORT: &str = "socket";

/// Endpoint field overriding the success event name.
pub const SUCCESS_EVENT: &str = "successEvent";

/// Endpoint field naming the failure event.
pub const FAILURE_EVENT: &str = "failureEvent";

/// Server address used when none is configured.
pub const DEFAULT_SOCKET_URL: &str = "ws://localhost:8100";

/// Reply budget used when the request carries no `timeout` option.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(15);

/// Performs endpoint calls over a WebSocket connection.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
    timeout: Duration,
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOCKET_URL.to_owned(),
            timeout: DEFAULT_SOCKET_TIMEOUT,
        }
    }
}

impl WebSocketTransport {
    /// Creates an adapter for the default server address.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the adapter at another server.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Changes the default reply budget.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the server address.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn exchange(&self, request: &RequestState, events: &Events) -> Result<Value, TransportError> {
        let (mut socket, _) = connect_async(self.url.as_str()).await.map_err(|error| {
            TransportError::new(TransportErrorKind::Connect, format!("failed to connect to {}: {error}", self.url))
        })?;

        let frame = json!({"topic": request.topic(), "params": request.params()});
        socket
            .send(Message::Text(frame.to_string()))
            .await
            .map_err(|error| TransportError::new(TransportErrorKind::Connect, format!("failed to send: {error}")))?;

        let reply = loop {
            let Some(message) = socket.next().await else {
                break Err(closed(request.topic()));
            };
            let text = match message {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break Err(closed(request.topic())),
                Ok(_) => continue,
                Err(error) => {
                    break Err(TransportError::new(
                        TransportErrorKind::Protocol,
                        format!("socket error: {error}"),
                    ));
                }
            };
            if let Some(settled) = events.settle(&text) {
                break settled;
            }
        };

        if let Err(error) = socket.close(None).await {
            debug!(target: SOCKET_TARGET, %error, "socket close failed");
        }
        reply
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn kind(&self) -> &str {
        SOCKET_TRANSPORT
    }

    async fn call(&self, request: &RequestState) -> Result<Value, DispatchError> {
        let events = Events::for_request(request);
        let budget = request.options().timeout().unwrap_or(self.timeout);
        debug!(
            target: SOCKET_TARGET,
            topic = request.topic(),
            url = %self.url,
            success = %events.success,
            "sending socket request"
        );

        match tokio::time::timeout(budget, self.exchange(request, &events)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => {
                warn!(target: SOCKET_TARGET, topic = request.topic(), %error, "socket request failed");
                Err(error.into())
            }
            Err(_) => {
                warn!(target: SOCKET_TARGET, topic = request.topic(), ?budget, "socket request timed out");
                Err(TransportError::timeout(budget.as_millis()).into())
            }
        }
    }
}

/// Event names that settle one socket request.
#[derive(Debug)]
struct Events {
    success: String,
    failure: Option<String>,
}

impl Events {
    fn for_request(request: &RequestState) -> Self {
        let endpoint = request.endpoint();
        let success = endpoint
            .extra(SUCCESS_EVENT)
            .and_then(Value::as_str)
            .map_or_else(|| success_event(endpoint.topic()), str::to_owned);
        let failure = endpoint.extra(FAILURE_EVENT).and_then(Value::as_str).map(str::to_owned);
        Self { success, failure }
    }

    /// Returns the settlement carried by `frame`, if it answers this request.
    fn settle(&self, frame: &str) -> Option<Result<Value, TransportError>> {
        let Ok(Value::Object(mut fields)) = serde_json::from_str::<Value>(frame) else {
            debug!(target: SOCKET_TARGET, "ignoring unparseable frame");
            return None;
        };
        let event = fields.get("event").and_then(Value::as_str)?.to_owned();
        let data = fields.remove("data").unwrap_or(Value::Null);
        if event == self.success {
            return Some(Ok(data));
        }
        if self.failure.as_deref() == Some(event.as_str()) {
            return Some(Err(TransportError::new(
                TransportErrorKind::Remote,
                format!("server answered with '{event}'"),
            )
            .with_body(data.to_string())));
        }
        None
    }
}

/// Builds the default success event name, `on` plus the capitalised topic.
fn success_event(topic: &str) -> String {
    let mut chars = topic.chars();
    chars.next().map_or_else(
        || "on".to_owned(),
        |first| format!("on{}{}", first.to_uppercase(), chars.as_str()),
    )
}

fn closed(topic: &str) -> TransportError {
    TransportError::new(
        TransportErrorKind::Protocol,
        format!("connection closed before '{topic}' was answered"),
    )
}
