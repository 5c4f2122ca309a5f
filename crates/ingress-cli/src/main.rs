//! ingress-annotations CLI
//!
//! Offline extraction of ingress annotations for operators.

use clap::Parser;

use ingress_cli::Cli;
use ingress_common::telemetry::{init_tracing, TelemetryConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(TelemetryConfig {
        format: cli.log_format.into(),
        default_filter: None,
    })?;

    cli.run()
}
