//! Command-line argument definitions.

use camino::Utf8PathBuf;
use clap::Parser;
use vuln_lsp_config::{LaunchMode, LogFormat, OptionalCapability};

/// Replays document-open events through an editor integration.
#[derive(Parser, Debug)]
#[command(name = "vuln-lsp-bootstrap", version)]
pub(crate) struct Cli {
    /// Loads the integration from a TOML file instead of a preset.
    #[arg(long, value_name = "PATH", conflicts_with = "integration")]
    pub(crate) config: Option<Utf8PathBuf>,
    /// Preset integration to use.
    #[arg(long, value_name = "NAME", default_value = "vuln-lsp")]
    pub(crate) integration: String,
    /// Argument profile for the backend.
    #[arg(long, default_value_t = LaunchMode::Run)]
    pub(crate) mode: LaunchMode,
    /// Project scope the documents belong to.
    #[arg(long, value_name = "ID", default_value = "default")]
    pub(crate) scope: String,
    /// Overrides the log filter.
    #[arg(long, value_name = "FILTER")]
    pub(crate) log_filter: Option<String>,
    /// Overrides the log format.
    #[arg(long, value_name = "FORMAT")]
    pub(crate) log_format: Option<LogFormat>,
    /// Opts into an optional capability; may be repeated.
    #[arg(long = "enable", value_name = "CAPABILITY")]
    pub(crate) enable: Vec<OptionalCapability>,
    /// Records starts instead of spawning the backend.
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Documents to open, in order.
    #[arg(value_name = "DOC", required = true)]
    pub(crate) documents: Vec<String>,
}
