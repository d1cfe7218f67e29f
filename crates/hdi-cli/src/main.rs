//! hdi CLI
//!
//! Create, inspect, update and delete HDInsight clusters from declarative documents.

use clap::Parser;

use hdi_cli::{Cli, Result};
use hdi_common::telemetry::{init_telemetry, LogFormat, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    let _telemetry = init_telemetry(TelemetryConfig {
        log_format,
        ..Default::default()
    })?;

    cli.run().await
}
