//! Default values shared by the integration presets and the TOML loader.

use crate::logging::LogFormat;

/// Identifier of the vulnerability integration.
pub const VULN_LSP_ID: &str = "vuln-lsp";

/// Identifier of the IQ integration variant.
pub const IQ_LSP_ID: &str = "iq-lsp";

/// Backend binary launched by the vulnerability integration.
pub const DEFAULT_EXECUTABLE: &str = "vuln-lsp";

/// File extension that activates the integration.
pub const DEFAULT_TARGET_EXTENSION: &str = "xml";

/// URI scheme of documents routed to the backend.
pub const DEFAULT_DOCUMENT_SCHEME: &str = "file";

/// Glob used by the transport to route document requests to the backend.
pub const DEFAULT_DOCUMENT_PATTERN: &str = "**/pom.xml";

/// Default log filter expression used by the bootstrap binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Human-readable name of the vulnerability integration.
pub const VULN_LSP_DISPLAY_NAME: &str = "Vulnerability Language Server";

/// Human-readable name of the IQ integration variant.
pub const IQ_LSP_DISPLAY_NAME: &str = "IQ Language Server";

pub(crate) fn default_id() -> String {
    VULN_LSP_ID.to_owned()
}

pub(crate) fn default_display_name() -> String {
    VULN_LSP_DISPLAY_NAME.to_owned()
}

pub(crate) fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_owned()
}

pub(crate) fn default_target_extension() -> String {
    DEFAULT_TARGET_EXTENSION.to_owned()
}

pub(crate) fn default_document_scheme() -> String {
    DEFAULT_DOCUMENT_SCHEME.to_owned()
}

pub(crate) fn default_document_pattern() -> String {
    DEFAULT_DOCUMENT_PATTERN.to_owned()
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the bootstrap binary.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Arguments passed to the vulnerability backend in both launch modes.
pub(crate) fn default_server_args() -> Vec<String> {
    vec![String::from("-s"), String::from("oss-index")]
}
