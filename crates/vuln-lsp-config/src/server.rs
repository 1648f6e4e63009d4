//! Backend process settings.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::{default_executable, default_server_args};
use crate::logging::BackendLogLevel;

/// Argument profile used when launching the backend.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LaunchMode {
    /// Normal editing sessions.
    #[default]
    Run,
    /// Sessions started while debugging the integration.
    Debug,
}

/// How the backend's environment is seeded.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EnvironmentPolicy {
    /// Inherit the parent console environment so the backend can resolve
    /// toolchain and proxy settings from the user's shell.
    #[default]
    InheritConsole,
    /// Start from an empty environment.
    Empty,
}

/// Launch settings for the backend binary.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Executable name or path.
    pub executable: String,
    /// Arguments for [`LaunchMode::Run`], passed through verbatim.
    pub args: Vec<String>,
    /// Arguments for [`LaunchMode::Debug`]; `args` is used when absent.
    pub debug_args: Option<Vec<String>>,
    /// Appended as `--log-level=<level>` when set.
    pub log_level: Option<BackendLogLevel>,
    /// Environment seeding policy.
    pub environment: EnvironmentPolicy,
    /// Working directory for the spawned process.
    pub working_dir: Option<Utf8PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            args: default_server_args(),
            debug_args: None,
            log_level: None,
            environment: EnvironmentPolicy::default(),
            working_dir: None,
        }
    }
}

impl ServerConfig {
    /// Returns the ordered argument list for the launch mode.
    #[must_use]
    pub fn arguments(&self, mode: LaunchMode) -> Vec<String> {
        let base = match (mode, &self.debug_args) {
            (LaunchMode::Debug, Some(debug_args)) => debug_args,
            (LaunchMode::Debug, None) | (LaunchMode::Run, _) => &self.args,
        };
        let mut arguments = base.clone();
        if let Some(level) = self.log_level {
            arguments.push(level.as_argument());
        }
        arguments
    }
}
