//! `hdi delete` - delete a cluster and wait until it is gone

use clap::Args;

use hdi_common::ClusterKind;

use super::{interruptible, reconciler};
use crate::config::ConnectionArgs;
use crate::Result;

/// Delete a cluster
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Cluster resource id
    pub id: String,

    /// Cluster kind
    #[arg(short, long)]
    pub kind: ClusterKind,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

pub async fn run(args: DeleteArgs) -> Result<()> {
    let reconciler = reconciler(&args.connection, args.kind)?;
    reconciler.delete(&args.id, &interruptible()).await?;
    println!("deleted {}", args.id);
    Ok(())
}
