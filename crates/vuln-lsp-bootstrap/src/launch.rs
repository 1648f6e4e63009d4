//! Launch specification handed to the transport.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str::Utf8Error;

use lsp_types::DocumentFilter;
use serde::Serialize;
use vuln_lsp_config::{DocumentSelectorConfig, EnvironmentPolicy, IntegrationConfig, LaunchMode};

/// Character encoding used for backend output.
///
/// Fixed to UTF-8 so diagnostic text round-trips regardless of host locale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum OutputEncoding {
    /// UTF-8.
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
}

impl OutputEncoding {
    /// IANA label of the encoding.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
        }
    }

    /// Decodes backend output.
    pub fn decode(self, bytes: &[u8]) -> Result<&str, Utf8Error> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes),
        }
    }
}

/// Filter the transport uses to route document-specific requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSelector {
    /// URI scheme, normally `file`.
    pub scheme: String,
    /// Glob such as `**/pom.xml`.
    pub pattern: String,
}

impl DocumentSelector {
    /// Converts the selector to its protocol representation.
    #[must_use]
    pub fn to_document_filter(&self) -> DocumentFilter {
        DocumentFilter {
            language: None,
            scheme: Some(self.scheme.clone()),
            pattern: Some(self.pattern.clone()),
        }
    }
}

impl From<&DocumentSelectorConfig> for DocumentSelector {
    fn from(config: &DocumentSelectorConfig) -> Self {
        Self {
            scheme: config.scheme.clone(),
            pattern: config.pattern.clone(),
        }
    }
}

/// Everything the transport needs to start a backend process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchSpec {
    /// Integration identifier, also used as the client name.
    pub integration: String,
    /// Executable name or path.
    pub executable: String,
    /// Ordered arguments, passed through verbatim.
    pub args: Vec<String>,
    /// How the process environment is seeded.
    pub environment: EnvironmentPolicy,
    /// Encoding of backend output.
    pub encoding: OutputEncoding,
    /// Routing filter for document-specific requests.
    pub document_selector: DocumentSelector,
    /// Working directory, when configured.
    pub working_dir: Option<PathBuf>,
}

impl LaunchSpec {
    /// Builds the specification for an integration and launch mode.
    #[must_use]
    pub fn from_config(config: &IntegrationConfig, mode: LaunchMode) -> Self {
        Self {
            integration: config.id.clone(),
            executable: config.server.executable.clone(),
            args: config.server.arguments(mode),
            environment: config.server.environment,
            encoding: OutputEncoding::Utf8,
            document_selector: DocumentSelector::from(&config.document_selector),
            working_dir: config
                .server
                .working_dir
                .as_ref()
                .map(|dir| dir.as_std_path().to_path_buf()),
        }
    }

    /// Renders the process command with piped stdin and stdout.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.executable);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        if self.environment == EnvironmentPolicy::Empty {
            command.env_clear();
        }

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        command
    }
}
