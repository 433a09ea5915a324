#![allow(clippy::must_use_candidate)]

pub mod anthropic;
mod env;
mod loader;
pub mod telemetry;

use serde::Deserialize;

pub use anthropic::{AnthropicConfig, LastMessageRole};
pub use env::{ExpandError, expand_env};
pub use telemetry::{ExportProtocol, ExporterConfig, TelemetryConfig, TracingConfig};

/// Top-level Parley configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Anthropic provider configuration
    pub anthropic: AnthropicConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
