//! ingress-annotations CLI library

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};

use ingress_common::telemetry::LogFormat;

/// Inspect how an ingress's annotations are interpreted
#[derive(Parser, Debug)]
#[command(name = "ingress-annotations")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log line format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the typed configuration of an Ingress manifest
    Extract(commands::extract::ExtractArgs),
    /// List the annotation keys read for each feature
    Keys(commands::keys::KeysArgs),
}

/// `--log-format` values
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    /// Human readable
    Text,
    /// One JSON object per line
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Cli {
    /// Run the CLI command
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Extract(args) => commands::extract::run(args),
            Commands::Keys(args) => commands::keys::run(args),
        }
    }
}
