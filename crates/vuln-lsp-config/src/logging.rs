use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats for the bootstrap binary.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Verbosity requested from the backend process through `--log-level`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BackendLogLevel {
    /// Every protocol exchange.
    Trace,
    /// Diagnostic detail.
    Debug,
    /// Lifecycle events only.
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures only.
    Error,
}

impl BackendLogLevel {
    /// Renders the level as the backend's command-line flag.
    #[must_use]
    pub fn as_argument(self) -> String {
        format!("--log-level={self}")
    }
}

/// Errors encountered while parsing a [`LogFormat`] or [`BackendLogLevel`] from text.
pub type LogParseError = strum::ParseError;
