//! `hdi show` - read a cluster by id

use std::path::PathBuf;

use clap::Args;

use hdi_common::ClusterKind;

use super::{interruptible, print_observed, read_spec, reconciler, OutputFormat};
use crate::config::ConnectionArgs;
use crate::{Error, Result};

/// Show a cluster
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Cluster resource id
    pub id: String,

    /// Cluster kind
    #[arg(short, long)]
    pub kind: ClusterKind,

    /// Last applied document; fills in credentials the provider never returns
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub output: OutputFormat,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

pub async fn run(args: ShowArgs) -> Result<()> {
    let existing = args.file.as_deref().map(read_spec).transpose()?;
    let reconciler = reconciler(&args.connection, args.kind)?;

    let observed = reconciler
        .read(
            &args.id,
            existing.as_ref().map(|spec| &spec.roles),
            &interruptible(),
        )
        .await?
        .ok_or_else(|| Error::ClusterNotFound {
            id: args.id.clone(),
        })?;

    print_observed(&observed, args.output)
}
