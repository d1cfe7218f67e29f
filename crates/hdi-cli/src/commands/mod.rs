//! CLI commands

use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use hdi_cluster::ClusterReconciler;
use hdi_common::{ClusterKind, ClusterSpec, ObservedCluster};
use hdi_provider::{CallContext, HttpClusterApi};

use crate::config::{ConnectionArgs, Settings};
use crate::{Error, Result};

pub mod configure;
pub mod create;
pub mod delete;
pub mod kinds;
pub mod lookup;
pub mod schema;
pub mod show;
pub mod update;

/// Output format
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Columnar table
    Table,
    /// JSON
    Json,
    /// YAML (default)
    #[default]
    Yaml,
}

/// Print a document in the requested structured format
///
/// Callers handle [`OutputFormat::Table`] themselves; here it falls back to YAML.
pub fn print_document<T: Serialize>(value: &T, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml | OutputFormat::Table => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

/// Print rows as a column-aligned table with headers.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    println!("{}", format_table(headers, rows));
}

fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let num_cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < num_cols {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let render = |cells: Vec<&str>| -> String {
        let line: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:<width$}", cell, width = w)
            })
            .collect();
        line.join("  ").trim_end().to_string()
    };

    let mut lines = vec![render(headers.to_vec())];
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

/// Print an observed cluster as a two-column table
pub fn print_observed_table(observed: &ObservedCluster) {
    let dash = || "-".to_string();
    let mut rows = vec![
        vec!["ID".to_string(), observed.id.clone()],
        vec!["NAME".to_string(), observed.name.clone()],
        vec!["RESOURCE GROUP".to_string(), observed.resource_group.clone()],
        vec![
            "LOCATION".to_string(),
            observed.location.clone().unwrap_or_else(dash),
        ],
        vec!["KIND".to_string(), observed.kind.clone().unwrap_or_else(dash)],
        vec![
            "TIER".to_string(),
            observed.tier.map(|t| t.to_string()).unwrap_or_else(dash),
        ],
        vec![
            "VERSION".to_string(),
            observed.cluster_version.clone().unwrap_or_else(dash),
        ],
        vec![
            "STATE".to_string(),
            observed.provisioning_state.clone().unwrap_or_else(dash),
        ],
        vec![
            "HTTPS".to_string(),
            observed.https_endpoint.clone().unwrap_or_else(dash),
        ],
        vec![
            "SSH".to_string(),
            observed.ssh_endpoint.clone().unwrap_or_else(dash),
        ],
    ];
    for role in hdi_common::RoleName::ALL {
        if let Some(group) = observed.roles.group(role) {
            let count = group
                .target_instance_count
                .map(|c| c.to_string())
                .unwrap_or_else(|| "fixed".to_string());
            rows.push(vec![
                role.field_name().to_string(),
                format!("{} x {}", count, group.vm_size),
            ]);
        }
    }
    print_table(&["FIELD", "VALUE"], &rows);
}

const REDACTED: &str = "<redacted>";

/// Copy of `observed` with node and gateway credentials masked
///
/// Passwords and SSH keys are carried over from the last applied document and
/// must not reach stdout.
pub fn redacted(observed: &ObservedCluster) -> ObservedCluster {
    let mut shown = observed.clone();
    for role in hdi_common::RoleName::ALL {
        if let Some(group) = shown.roles.group_mut(role).as_mut() {
            if group.password.is_some() {
                group.password = Some(REDACTED.to_string());
            }
            for key in &mut group.ssh_keys {
                *key = REDACTED.to_string();
            }
        }
    }
    if let Some(gateway) = shown.gateway.as_mut() {
        gateway.password = REDACTED.to_string();
    }
    shown
}

/// Print an observed cluster with credentials masked
pub fn print_observed(observed: &ObservedCluster, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Table => {
            print_observed_table(observed);
            Ok(())
        }
        format => print_document(&redacted(observed), format),
    }
}

/// Read a cluster document from a YAML or JSON file
pub fn read_spec(path: &Path) -> Result<ClusterSpec> {
    let data = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&data).map_err(|e| Error::InvalidDocument {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Reconciler for `kind` using the resolved connection settings
pub fn reconciler(connection: &ConnectionArgs, kind: ClusterKind) -> Result<ClusterReconciler> {
    let settings = Settings::load(connection)?;
    let api = HttpClusterApi::new(settings.http)?;
    Ok(ClusterReconciler::new(
        Arc::new(api),
        kind,
        settings.reconciler,
    ))
}

/// Call context cancelled by Ctrl-C
pub fn interruptible() -> CallContext {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling the running operation");
            cancel.cancel();
        }
    });
    CallContext::new(token)
}
