//! `hdi kinds` - describe the supported cluster kinds

use clap::Args;
use serde::Serialize;

use hdi_common::kind::InstanceCount;
use hdi_common::{ClusterKind, KindDefinition, NodeGroupDefinition};

use super::{print_document, print_table, OutputFormat};
use crate::Result;

/// Describe cluster kinds
#[derive(Args, Debug)]
pub struct KindsArgs {
    /// Only describe this kind
    #[arg(short, long)]
    pub kind: Option<ClusterKind>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct KindView {
    kind: ClusterKind,
    provider_kind: &'static str,
    component: &'static str,
    roles: Vec<RoleView>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct RoleView {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fixed_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_count: Option<u32>,
    vm_sizes: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    disks_per_node: Option<(u32, u32)>,
}

impl From<&NodeGroupDefinition> for RoleView {
    fn from(group: &NodeGroupDefinition) -> Self {
        let (fixed_count, min_count, max_count) = match group.count {
            InstanceCount::Fixed(n) => (Some(n), None, None),
            InstanceCount::Range { min, max } => (None, Some(min), Some(max)),
        };
        Self {
            role: group.role.field_name(),
            fixed_count,
            min_count,
            max_count,
            vm_sizes: group.vm_sizes.to_vec(),
            disks_per_node: group.disks.map(|d| (d.min_per_node, d.max_per_node)),
        }
    }
}

impl From<&KindDefinition> for KindView {
    fn from(def: &KindDefinition) -> Self {
        Self {
            kind: def.kind,
            provider_kind: def.provider_kind,
            component: def.component,
            roles: def.node_groups().into_iter().map(RoleView::from).collect(),
        }
    }
}

fn count_label(role: &RoleView) -> String {
    match (role.fixed_count, role.min_count, role.max_count) {
        (Some(n), _, _) => n.to_string(),
        (None, Some(min), Some(max)) => format!("{min}-{max}"),
        _ => "-".to_string(),
    }
}

fn table_rows(views: &[KindView]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for view in views {
        for role in &view.roles {
            rows.push(vec![
                view.kind.to_string(),
                view.component.to_string(),
                role.role.to_string(),
                count_label(role),
                role.disks_per_node
                    .map(|(min, max)| format!("{min}-{max}"))
                    .unwrap_or_else(|| "-".to_string()),
                role.vm_sizes.len().to_string(),
            ]);
        }
    }
    rows
}

pub fn run(args: KindsArgs) -> Result<()> {
    let kinds: Vec<ClusterKind> = match args.kind {
        Some(kind) => vec![kind],
        None => ClusterKind::ALL.to_vec(),
    };
    let views: Vec<KindView> = kinds
        .into_iter()
        .map(|kind| KindView::from(kind.definition()))
        .collect();

    match args.output {
        OutputFormat::Table => print_table(
            &["KIND", "COMPONENT", "ROLE", "COUNT", "DISKS", "VM SIZES"],
            &table_rows(&views),
        ),
        format => print_document(&views, format)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_lists_three_roles() {
        for kind in ClusterKind::ALL {
            let view = KindView::from(kind.definition());
            assert_eq!(view.roles.len(), 3);
            assert_eq!(view.roles[0].role, "headNode");
            assert_eq!(view.roles[0].fixed_count, Some(2));
        }
    }

    #[test]
    fn only_kafka_workers_take_disks() {
        for kind in ClusterKind::ALL {
            let view = KindView::from(kind.definition());
            let worker = &view.roles[1];
            assert_eq!(worker.role, "workerNode");
            assert_eq!(worker.disks_per_node.is_some(), kind == ClusterKind::Kafka);
        }
    }

    #[test]
    fn worker_count_renders_as_range() {
        let view = KindView::from(ClusterKind::Storm.definition());
        let rows = table_rows(&[view]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], "storm");
        assert_eq!(rows[1][2], "workerNode");
        assert!(rows[1][3].contains('-'));
        assert_eq!(rows[0][3], "2");
    }
}
