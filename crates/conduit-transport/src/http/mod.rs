//! HTTP transport adapter.
//!
//! [`HttpTransport`] serves endpoints whose transport kind is `http` (or
//! unset). The request URL is `host + base + endpoint.url`, where `host` and
//! `base` come from the adapter when configured there and from the request
//! options otherwise. Headers from `httpHeaders` and the `csrf` token are sent
//! with every call. `GET`, `DELETE` and `HEAD` encode the remaining
//! parameters into the query string; other methods send them as a JSON body.

use std::time::Duration;

use async_trait::async_trait;
use conduit_core::{DispatchError, RequestState, Transport, TransportError, TransportErrorKind};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::query;

/// Tracing target for HTTP transport operations.
pub(crate) const HTTP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::http");

/// Header carrying the CSRF token.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Transport kind served by [`HttpTransport`].
pub const HTTP_TRANSPORT: &str = "http";

/// Performs endpoint calls over HTTP with `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
    host: Option<String>,
    base: Option<String>,
}

impl HttpTransport {
    /// Creates an adapter with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an adapter around an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            ..Self::default()
        }
    }

    /// Fixes the host, overriding the `host` option.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Fixes the base path, overriding the `base` option.
    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    fn target(&self, request: &RequestState) -> Result<Url, TransportError> {
        let path = request.url().filter(|url| !url.is_empty()).ok_or_else(|| {
            TransportError::new(TransportErrorKind::MissingUrl, "no URL provided")
        })?;
        let host = self.host.as_deref().or_else(|| request.options().host()).unwrap_or_default();
        let base = self.base.as_deref().or_else(|| request.options().base()).unwrap_or_default();
        let full = format!("{host}{base}{path}");
        Url::parse(&full).map_err(|error| {
            TransportError::new(TransportErrorKind::MissingUrl, format!("invalid URL '{full}': {error}"))
                .with_path(full.clone())
        })
    }

    fn build(&self, method: &Method, mut url: Url, request: &RequestState) -> RequestBuilder {
        let sends_body = !matches!(*method, Method::GET | Method::DELETE | Method::HEAD);
        if !sends_body && !request.params().is_empty() {
            let encoded = query::encode(request.params());
            let combined = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                _ => encoded,
            };
            url.set_query(Some(&combined));
        }

        let mut builder = self.client.request(method.clone(), url);
        for (name, value) in request.options().headers() {
            builder = builder.header(name, value);
        }
        if let Some(token) = request.options().csrf() {
            builder = builder.header(CSRF_HEADER, token);
        }
        if let Some(timeout) = request.options().timeout() {
            builder = builder.timeout(timeout);
        }
        if sends_body {
            builder = builder.json(request.params());
        }
        builder
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> &str {
        HTTP_TRANSPORT
    }

    async fn call(&self, request: &RequestState) -> Result<Value, DispatchError> {
        let method = parse_method(request.endpoint().method())?;
        let url = self.target(request)?;
        let path = url.path().to_owned();
        debug!(
            target: HTTP_TARGET,
            topic = request.topic(),
            %method,
            %url,
            "sending HTTP request"
        );

        let timeout = request.options().timeout();
        let response = self
            .build(&method, url, request)
            .send()
            .await
            .map_err(|error| send_error(&error, timeout, &method, &path))?;
        read_response(response, &method, &path).await.map_err(Into::into)
    }
}

/// Maps an endpoint method onto an HTTP method.
fn parse_method(method: Option<&str>) -> Result<Method, TransportError> {
    let normalised = method.unwrap_or_default().trim().to_ascii_lowercase();
    match normalised.as_str() {
        "get" => Ok(Method::GET),
        "post" => Ok(Method::POST),
        "put" => Ok(Method::PUT),
        "patch" => Ok(Method::PATCH),
        "delete" | "del" => Ok(Method::DELETE),
        "head" => Ok(Method::HEAD),
        _ => Err(TransportError::new(
            TransportErrorKind::InvalidMethod,
            format!("invalid HTTP method '{normalised}'"),
        )),
    }
}

fn send_error(error: &reqwest::Error, timeout: Option<Duration>, method: &Method, path: &str) -> TransportError {
    let base = if error.is_timeout() {
        TransportError::timeout(timeout.map_or(0, |budget| budget.as_millis()))
    } else {
        TransportError::new(TransportErrorKind::Connect, error.to_string())
    };
    warn!(target: HTTP_TARGET, %method, path, %error, "HTTP request failed");
    base.with_method(method.as_str()).with_path(path)
}

async fn read_response(response: Response, method: &Method, path: &str) -> Result<Value, TransportError> {
    let status = response.status();
    let body = response.text().await.map_err(|error| {
        TransportError::new(TransportErrorKind::Decode, format!("failed to read body: {error}"))
            .with_status(status.as_u16())
            .with_method(method.as_str())
            .with_path(path)
    })?;

    if !status.is_success() {
        debug!(target: HTTP_TARGET, %method, path, status = status.as_u16(), "HTTP status not ok");
        return Err(TransportError::new(TransportErrorKind::Status, "not ok")
            .with_status(status.as_u16())
            .with_method(method.as_str())
            .with_path(path)
            .with_body(body));
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|error| {
        TransportError::new(TransportErrorKind::Decode, format!("invalid JSON body: {error}"))
            .with_status(status.as_u16())
            .with_method(method.as_str())
            .with_path(path)
            .with_body(body.clone())
    })
}
