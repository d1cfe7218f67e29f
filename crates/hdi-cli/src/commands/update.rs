//! `hdi update` - apply changed fields of a document to an existing cluster

use std::path::PathBuf;

use clap::Args;

use hdi_common::{ChangeSet, ClusterKind};

use super::{interruptible, print_observed, read_spec, reconciler, OutputFormat};
use crate::config::ConnectionArgs;
use crate::Result;

/// Update a cluster
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Cluster resource id
    pub id: String,

    /// Desired cluster document (YAML or JSON)
    #[arg(short = 'f', long)]
    pub file: PathBuf,

    /// Cluster kind
    #[arg(short, long)]
    pub kind: ClusterKind,

    /// Comma separated list of fields that changed, e.g. "tags,roles"
    #[arg(long, default_value = "")]
    pub changed: ChangeSet,

    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub output: OutputFormat,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

pub async fn run(args: UpdateArgs) -> Result<()> {
    let spec = read_spec(&args.file)?;
    let reconciler = reconciler(&args.connection, args.kind)?;

    let observed = reconciler
        .update(&args.id, &spec, &args.changed, &interruptible())
        .await?;

    print_observed(&observed, args.output)
}
