//! Network transport adapters for conduit.
//!
//! Each adapter implements [`conduit_core::Transport`] for one transport kind
//! and is registered on a [`conduit_core::Dispatcher`] as a transport
//! interceptor. The chain only invokes an adapter for endpoints whose kind it
//! accepts.
//!
//! * [`HttpTransport`] serves `http` endpoints through `reqwest`.
//! * [`WebSocketTransport`] serves `socket` endpoints through
//!   `tokio-tungstenite`.
//!
//! # Example
//!
//! ```rust,no_run
//! use conduit_core::{Dispatcher, Interceptor, PathResolver};
//! use conduit_transport::{HttpTransport, WebSocketTransport};
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.register_resolver(PathResolver).expect("resolver registers");
//! dispatcher
//!     .use_interceptor(Interceptor::transport(HttpTransport::new().with_host("https://example.com")))
//!     .expect("http adapter registers");
//! dispatcher
//!     .use_interceptor(Interceptor::transport(WebSocketTransport::new()))
//!     .expect("socket adapter registers");
//! ```

pub mod http;
pub mod query;
pub mod socket;

pub use self::http::{CSRF_HEADER, HTTP_TRANSPORT, HttpTransport};
pub use self::socket::{SOCKET_TRANSPORT, WebSocketTransport};
