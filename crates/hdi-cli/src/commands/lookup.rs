//! `hdi lookup` - read-only view of a cluster by resource group and name

use clap::Args;

use hdi_cluster::lookup_cluster;
use hdi_common::ClusterSummary;
use hdi_provider::HttpClusterApi;

use super::{interruptible, print_document, print_table, OutputFormat};
use crate::config::{ConnectionArgs, Settings};
use crate::{Error, Result};

/// Look a cluster up by name
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Resource group holding the cluster
    #[arg(short = 'g', long)]
    pub resource_group: String,

    /// Cluster name
    #[arg(short, long)]
    pub name: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub output: OutputFormat,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

pub async fn run(args: LookupArgs) -> Result<()> {
    let settings = Settings::load(&args.connection)?;
    let api = HttpClusterApi::new(settings.http)?;
    let mut ctx = interruptible();
    if let Some(timeout) = settings.reconciler.timeout {
        ctx = ctx.with_timeout(timeout);
    }

    let summary = lookup_cluster(&api, &args.resource_group, &args.name, &ctx)
        .await?
        .ok_or_else(|| Error::ClusterNotFound {
            id: format!("{}/{}", args.resource_group, args.name),
        })?;

    match args.output {
        OutputFormat::Table => print_summary_table(&summary),
        format => print_document(&summary, format)?,
    }
    Ok(())
}

fn print_summary_table(summary: &ClusterSummary) {
    let headers = &["NAME", "KIND", "TIER", "VERSION", "LOCATION", "HTTPS", "SSH"];
    let dash = || "-".to_string();
    let row = vec![
        summary.name.clone(),
        summary.kind.clone().unwrap_or_else(dash),
        summary.tier.map(|t| t.to_string()).unwrap_or_else(dash),
        summary.cluster_version.clone().unwrap_or_else(dash),
        summary.location.clone().unwrap_or_else(dash),
        summary.https_endpoint.clone().unwrap_or_else(dash),
        summary.ssh_endpoint.clone().unwrap_or_else(dash),
    ];
    print_table(headers, &[row]);
}
