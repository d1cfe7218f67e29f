//! `hdi create` - create a cluster from a document and wait for it

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::info;

use hdi_common::{ClusterKind, ObservedCluster};

use super::{interruptible, print_document, print_observed_table, read_spec, reconciler, redacted, OutputFormat};
use crate::config::ConnectionArgs;
use crate::Result;

/// Create a cluster
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Cluster document (YAML or JSON)
    #[arg(short = 'f', long)]
    pub file: PathBuf,

    /// Cluster kind
    #[arg(short, long)]
    pub kind: ClusterKind,

    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub output: OutputFormat,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Serialize)]
struct Created<'a> {
    id: &'a str,
    cluster: &'a ObservedCluster,
}

pub async fn run(args: CreateArgs) -> Result<()> {
    let spec = read_spec(&args.file)?;
    let reconciler = reconciler(&args.connection, args.kind)?;

    info!(cluster = %spec.name, kind = %args.kind, "creating cluster, this can take a while");
    let (id, observed) = reconciler.create(&spec, &interruptible()).await?;

    match args.output {
        OutputFormat::Table => print_observed_table(&observed),
        format => print_document(
            &Created {
                id: &id,
                cluster: &redacted(&observed),
            },
            format,
        )?,
    }
    Ok(())
}
