//! Configuration shared by the bootstrap layer and its binary.
//!
//! An [`IntegrationConfig`] describes one editor integration: which documents
//! activate it, how its backend binary is launched, and which optional editor
//! capabilities it opts into. Presets cover the known integrations; a TOML
//! file may override any field, with missing keys falling back to the
//! vulnerability preset.

mod capability;
mod defaults;
mod logging;
mod server;

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use capability::{CapabilityToggles, OptionalCapability};
pub use defaults::{
    DEFAULT_DOCUMENT_PATTERN, DEFAULT_DOCUMENT_SCHEME, DEFAULT_EXECUTABLE, DEFAULT_LOG_FILTER,
    DEFAULT_TARGET_EXTENSION, IQ_LSP_DISPLAY_NAME, IQ_LSP_ID, VULN_LSP_DISPLAY_NAME, VULN_LSP_ID,
    default_log_filter_string, default_log_format,
};
pub use logging::{BackendLogLevel, LogFormat, LogParseError};
pub use server::{EnvironmentPolicy, LaunchMode, ServerConfig};

use defaults::{
    default_display_name, default_document_pattern, default_document_scheme, default_id,
    default_target_extension,
};

/// Routing filter handed to the transport for document-specific requests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentSelectorConfig {
    /// URI scheme, normally `file`.
    pub scheme: String,
    /// Glob matched by the transport, e.g. `**/pom.xml`.
    pub pattern: String,
}

impl Default for DocumentSelectorConfig {
    fn default() -> Self {
        Self {
            scheme: default_document_scheme(),
            pattern: default_document_pattern(),
        }
    }
}

/// Complete description of one editor integration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrationConfig {
    /// Stable identifier, also sent as the client name during the handshake.
    pub id: String,
    /// Name shown to users.
    pub display_name: String,
    /// Extension (without the dot) that activates the integration.
    pub target_extension: String,
    /// Routing filter for the transport.
    pub document_selector: DocumentSelectorConfig,
    /// Backend launch settings.
    pub server: ServerConfig,
    /// Optional capabilities the integration opts into.
    pub capabilities: CapabilityToggles,
    /// `tracing` filter expression for the bootstrap binary.
    pub log_filter: String,
    /// Output format for the bootstrap binary's logs.
    pub log_format: LogFormat,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self::vuln_lsp()
    }
}

impl IntegrationConfig {
    /// Preset for the vulnerability integration backed by OSS Index.
    #[must_use]
    pub fn vuln_lsp() -> Self {
        Self {
            id: default_id(),
            display_name: default_display_name(),
            target_extension: default_target_extension(),
            document_selector: DocumentSelectorConfig::default(),
            server: ServerConfig::default(),
            capabilities: CapabilityToggles::default(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }

    /// Preset for the IQ integration, whose backend also serves completions.
    #[must_use]
    pub fn iq_lsp() -> Self {
        Self {
            id: IQ_LSP_ID.to_owned(),
            display_name: IQ_LSP_DISPLAY_NAME.to_owned(),
            server: ServerConfig {
                executable: IQ_LSP_ID.to_owned(),
                args: Vec::new(),
                ..ServerConfig::default()
            },
            capabilities: CapabilityToggles {
                completion: true,
                goto_definition: false,
            },
            ..Self::vuln_lsp()
        }
    }

    /// Looks up a preset by integration identifier.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.trim() {
            VULN_LSP_ID => Ok(Self::vuln_lsp()),
            IQ_LSP_ID => Ok(Self::iq_lsp()),
            other => Err(ConfigError::UnknownPreset {
                name: other.to_owned(),
            }),
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).map_err(|source| ConfigError::Parse {
            path: None,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load_from_path(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the integration unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::invalid("id", "must not be empty"));
        }
        if self.server.executable.trim().is_empty() {
            return Err(ConfigError::invalid("server.executable", "must not be empty"));
        }
        if self.target_extension.is_empty() {
            return Err(ConfigError::invalid("target_extension", "must not be empty"));
        }
        if self.target_extension.contains('.') {
            return Err(ConfigError::invalid(
                "target_extension",
                "must be a bare extension without '.'",
            ));
        }
        if self.document_selector.pattern.trim().is_empty() {
            return Err(ConfigError::invalid(
                "document_selector.pattern",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

/// Errors raised while loading integration configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        /// File that was requested.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The configuration was not valid TOML for the schema.
    #[error("failed to parse configuration{}: {source}", display_path(.path.as_ref()))]
    Parse {
        /// File being parsed, when loaded from disk.
        path: Option<Utf8PathBuf>,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// A field holds an unusable value.
    #[error("invalid configuration value for '{field}': {reason}")]
    Invalid {
        /// Dotted field path.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// No preset exists with the requested name.
    #[error("unknown integration preset '{name}'")]
    UnknownPreset {
        /// Name supplied by the caller.
        name: String,
    },
}

impl ConfigError {
    const fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}

fn display_path(path: Option<&Utf8PathBuf>) -> String {
    path.map(|path| format!(" '{path}'")).unwrap_or_default()
}
