//! CLI entrypoint for conduit.
//!
//! The binary delegates to [`conduit_cli::run`], which loads configuration,
//! initialises telemetry, loads endpoint definitions and dispatches one
//! topic, printing the JSON reply.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    conduit_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
