use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output format for conduit's diagnostic events on stderr.
///
/// The dispatch reply itself always goes to stdout as JSON; this only shapes
/// the interceptor chain and transport logs.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event with fields flattened, for log pipelines.
    #[default]
    Json,
    /// Single line per event.
    Compact,
    /// Multi-line events with source locations, for following a request
    /// through the chain by hand.
    Pretty,
}

impl LogFormat {
    /// Returns `true` when the format may carry ANSI colour codes.
    ///
    /// JSON lines are consumed by machines and stay uncoloured even on a
    /// terminal.
    #[must_use]
    pub const fn colourises(self) -> bool {
        !matches!(self, Self::Json)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;
