//! Configuration loading helpers for the CLI.
//!
//! Configuration flags are handed to `ortho_config`; everything else goes to
//! the command parser. Configuration flags must appear before the topic and
//! its parameters.

use std::ffi::{OsStr, OsString};

use conduit_config::Config;
use ortho_config::OrthoConfig;

use crate::AppError;

/// CLI flags recognised by the configuration loader.
///
/// Keep in sync with the fields of [`conduit_config::Config`].
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--base-url",
    "--host",
    "--csrf-token",
    "--timeout-ms",
    "--definitions-path",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the configuration-only arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Skip;
    }
    let (flag, has_inline_value) = text
        .split_once('=')
        .map_or((text.as_ref(), false), |(flag, _)| (flag, true));
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Skip
    }
}

/// Arguments split between the configuration loader and the command parser.
#[derive(Debug, Default)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) cli_arguments: Vec<OsString>,
}

/// Splits leading configuration flags (and their values) from the command
/// arguments. The program name is passed to both halves.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut split = ConfigArgumentSplit::default();
    let mut remaining = args.iter();
    if let Some(program) = remaining.next() {
        split.config_arguments.push(program.clone());
        split.cli_arguments.push(program.clone());
    }

    let mut pending_value = false;
    let mut in_config = true;
    for argument in remaining {
        if in_config && pending_value {
            split.config_arguments.push(argument.clone());
            pending_value = false;
            continue;
        }
        match (in_config, classify(argument)) {
            (true, FlagAction::Include { needs_value }) => {
                split.config_arguments.push(argument.clone());
                pending_value = needs_value;
            }
            _ => {
                in_config = false;
                split.cli_arguments.push(argument.clone());
            }
        }
    }
    split
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case::separate_value("--host", FlagAction::Include { needs_value: true })]
    #[case::inline_value("--log-filter=debug", FlagAction::Include { needs_value: false })]
    #[case::command_flag("--pretty", FlagAction::Skip)]
    #[case::positional("user.get", FlagAction::Skip)]
    fn classifies_flags(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(classify(OsStr::new(argument)), expected);
    }

    #[test]
    fn leading_config_flags_are_split_off() {
        let split = split_config_arguments(&os(&[
            "conduit",
            "--host",
            "http://localhost",
            "--log-format=compact",
            "--pretty",
            "ping",
            "--host",
            "ignored",
        ]));
        assert_eq!(
            split.config_arguments,
            os(&["conduit", "--host", "http://localhost", "--log-format=compact"])
        );
        assert_eq!(split.cli_arguments, os(&["conduit", "--pretty", "ping", "--host", "ignored"]));
    }
}
