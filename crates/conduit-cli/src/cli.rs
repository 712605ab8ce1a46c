//! CLI argument definitions for conduit.

use clap::Parser;
use serde_json::Value;

/// Command-line interface for dispatching one topic.
#[derive(Parser, Debug)]
#[command(name = "conduit", about = "Dispatches a topic through configured endpoint definitions")]
pub(crate) struct Cli {
    /// Lists defined topics and exits.
    #[arg(long)]
    pub(crate) list: bool,
    /// Pretty-prints the JSON reply.
    #[arg(long)]
    pub(crate) pretty: bool,
    /// WebSocket server for `socket` endpoints.
    #[arg(long, value_name = "URL")]
    pub(crate) socket_url: Option<String>,
    /// Request parameter; the value is parsed as JSON when possible.
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub(crate) params: Vec<(String, Value)>,
    /// Topic to dispatch (for example `user.get`).
    #[arg(value_name = "TOPIC")]
    pub(crate) topic: Option<String>,
}

/// Parses `key=value`, reading the value as JSON and falling back to a
/// string.
pub(crate) fn parse_param(text: &str) -> Result<(String, Value), String> {
    let (key, raw) = text
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{text}'"))?;
    if key.is_empty() {
        return Err(format!("parameter name missing in '{text}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
    Ok((key.to_owned(), value))
}
