use std::path::PathBuf;

use clap::Parser;

/// Parley chat client
#[derive(Debug, Parser)]
#[command(name = "parley", about = "Stream chat completions from Anthropic models")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "parley.toml", env = "PARLEY_CONFIG")]
    pub config: PathBuf,

    /// Override the configured model
    #[arg(short, long, env = "PARLEY_MODEL")]
    pub model: Option<String>,

    /// System prompt sent with every request
    #[arg(short, long)]
    pub system: Option<String>,

    /// Sampling temperature between 0 and 1
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Log filter in `RUST_LOG` syntax
    #[arg(long, default_value = "warn", env = "PARLEY_LOG")]
    pub log: String,

    /// Prompt to complete; reads conversation turns from stdin when omitted
    pub prompt: Vec<String>,
}

impl Args {
    /// Prompt given on the command line, if any
    pub fn prompt(&self) -> Option<String> {
        (!self.prompt.is_empty()).then(|| self.prompt.join(" "))
    }
}
