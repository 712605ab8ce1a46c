//! Command-line runtime for conduit.
//!
//! [`run`] splits configuration flags from the command, loads layered
//! configuration, initialises telemetry, reads the endpoint definitions file
//! and dispatches one topic through a [`Dispatcher`] wired with the HTTP,
//! WebSocket and local transports. The JSON reply is written to stdout;
//! failures are reported on stderr with a failing exit code.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use conduit_config::Config;
use conduit_core::{
    DispatchError, Dispatcher, Interceptor, LocalTransport, Options, Params, PathResolver,
};
use conduit_transport::{HttpTransport, WebSocketTransport};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

mod cli;
mod config;
pub mod telemetry;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};

/// Tracing target for CLI operations.
pub(crate) const CLI_TARGET: &str = env!("CARGO_PKG_NAME");

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, W, E, L>(args: I, stdout: &mut W, stderr: &mut E, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&arguments);

    let result = Cli::try_parse_from(split.cli_arguments)
        .map_err(AppError::CliUsage)
        .and_then(|cli| loader.load(&split.config_arguments).map(|config| (cli, config)))
        .and_then(|(cli, config)| execute(&cli, &config, stdout));

    match result {
        Ok(exit_code) => exit_code,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            if write!(stdout, "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            if writeln!(stderr, "{error}").is_err() {
                debug!(target: CLI_TARGET, "stderr closed while reporting failure");
            }
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(cli: &Cli, config: &Config, stdout: &mut W) -> Result<ExitCode, AppError> {
    telemetry::initialise(config)?;
    if !cli.list && cli.topic.is_none() {
        return Err(AppError::MissingTopic);
    }
    let dispatcher = build_dispatcher(config, cli.socket_url.as_deref())?;

    if cli.list {
        for endpoint in dispatcher.endpoints()? {
            writeln!(
                stdout,
                "{}\t{}\t{}\t{}",
                endpoint.topic(),
                endpoint.transport_kind(),
                endpoint.method().unwrap_or("-").to_ascii_uppercase(),
                endpoint.url().unwrap_or("-"),
            )
            .map_err(AppError::WriteOutput)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let topic = cli.topic.as_deref().ok_or(AppError::MissingTopic)?;
    let params: Params = cli.params.iter().cloned().collect();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;
    debug!(target: CLI_TARGET, topic, "dispatching from command line");
    let reply = runtime.block_on(dispatcher.request(topic, params, Options::new()))?;

    write_reply(stdout, &reply, cli.pretty)?;
    Ok(ExitCode::SUCCESS)
}

/// Builds a dispatcher from configuration and the definitions file.
fn build_dispatcher(config: &Config, socket_url: Option<&str>) -> Result<Dispatcher, AppError> {
    let definitions = load_definitions(config.definitions_path())?;
    let dispatcher = Dispatcher::with_config(config.dispatcher_config());
    dispatcher.register_resolver(PathResolver)?;
    dispatcher.define(definitions)?;

    let socket = socket_url.map_or_else(WebSocketTransport::new, |url| WebSocketTransport::new().with_url(url));
    dispatcher.use_interceptor(Interceptor::transport(HttpTransport::new()))?;
    dispatcher.use_interceptor(Interceptor::transport(socket))?;
    dispatcher.use_interceptor(Interceptor::transport(LocalTransport))?;
    Ok(dispatcher)
}

fn load_definitions(path: &Utf8PathBuf) -> Result<Value, AppError> {
    let text = fs::read_to_string(path).map_err(|source| AppError::ReadDefinitions {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| AppError::ParseDefinitions {
        path: path.clone(),
        source,
    })
}

fn write_reply<W: Write>(stdout: &mut W, reply: &Value, pretty: bool) -> Result<(), AppError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(reply)
    } else {
        serde_json::to_string(reply)
    }
    .map_err(AppError::SerialiseReply)?;
    writeln!(stdout, "{rendered}").map_err(AppError::WriteOutput)
}

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("the topic must be provided")]
    MissingTopic,
    #[error("failed to read definitions from {path}: {source}")]
    ReadDefinitions {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse definitions in {path}: {source}")]
    ParseDefinitions {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Telemetry(#[from] telemetry::TelemetryError),
    #[error("failed to start the async runtime: {0}")]
    Runtime(io::Error),
    #[error("request failed: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("failed to serialise reply: {0}")]
    SerialiseReply(serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}
