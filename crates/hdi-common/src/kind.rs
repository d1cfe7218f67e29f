//! Built-in cluster kind registry
//!
//! A cluster kind fixes which node groups a cluster has and how each one may
//! be shaped: whether the caller chooses its instance count, the count bounds,
//! the VM sizes it accepts, whether data disks can be attached and how
//! abbreviated VM size names reported by the provider map back to canonical
//! ones. The tables are static; nothing here is configurable at runtime.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Supported cluster kinds
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ClusterKind {
    /// Batch processing on HDFS and YARN
    Hadoop,
    /// Wide-column store on HDFS
    HBase,
    /// Streaming log with attached data disks on every worker
    Kafka,
    /// In-memory batch and streaming
    Spark,
    /// Real-time stream processing
    Storm,
}

impl ClusterKind {
    /// Every kind, in registry order
    pub const ALL: [ClusterKind; 5] = [
        ClusterKind::Hadoop,
        ClusterKind::HBase,
        ClusterKind::Kafka,
        ClusterKind::Spark,
        ClusterKind::Storm,
    ];

    /// Static definition for this kind
    pub fn definition(self) -> &'static KindDefinition {
        match self {
            ClusterKind::Hadoop => &HADOOP,
            ClusterKind::HBase => &HBASE,
            ClusterKind::Kafka => &KAFKA,
            ClusterKind::Spark => &SPARK,
            ClusterKind::Storm => &STORM,
        }
    }

    /// Lowercase name used in CLI arguments, logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            ClusterKind::Hadoop => "hadoop",
            ClusterKind::HBase => "hbase",
            ClusterKind::Kafka => "kafka",
            ClusterKind::Spark => "spark",
            ClusterKind::Storm => "storm",
        }
    }
}

impl fmt::Display for ClusterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClusterKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = ClusterKind::ALL.iter().map(|k| k.as_str()).collect();
                Error::validation(format!(
                    "unknown cluster kind {s:?}, expected one of: {}",
                    known.join(", ")
                ))
            })
    }
}

/// Operating system the provider runs cluster nodes on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OsType {
    /// Every supported kind runs on Linux
    Linux,
}

impl OsType {
    /// Provider wire value
    pub fn as_str(self) -> &'static str {
        match self {
            OsType::Linux => "Linux",
        }
    }
}

/// The three structural roles of a cluster
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoleName {
    /// Head (gateway/master) nodes
    Head,
    /// Worker nodes, the only group resizable after creation
    Worker,
    /// Coordinator (ZooKeeper) nodes
    Zookeeper,
}

impl RoleName {
    /// Roles in the order the provider expects them
    pub const ALL: [RoleName; 3] = [RoleName::Head, RoleName::Worker, RoleName::Zookeeper];

    /// Canonical provider role name
    ///
    /// The provider keys roles by this string, so it must be reproduced exactly.
    pub fn provider_name(self) -> &'static str {
        match self {
            RoleName::Head => "headnode",
            RoleName::Worker => "workernode",
            RoleName::Zookeeper => "zookeepernode",
        }
    }

    /// Field name of this group in the roles document
    pub fn field_name(self) -> &'static str {
        match self {
            RoleName::Head => "headNode",
            RoleName::Worker => "workerNode",
            RoleName::Zookeeper => "zookeeperNode",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// How many instances a node group runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceCount {
    /// The count is set by the kind; caller input is ignored
    Fixed(u32),
    /// The caller picks a count within inclusive bounds
    Range {
        /// Smallest allowed count
        min: u32,
        /// Largest allowed count
        max: u32,
    },
}

impl InstanceCount {
    /// Whether the caller chooses the count
    pub fn can_specify(self) -> bool {
        matches!(self, InstanceCount::Range { .. })
    }

    /// Lower bound
    pub fn min(self) -> u32 {
        match self {
            InstanceCount::Fixed(n) => n,
            InstanceCount::Range { min, .. } => min,
        }
    }

    /// Upper bound
    pub fn max(self) -> u32 {
        match self {
            InstanceCount::Fixed(n) => n,
            InstanceCount::Range { max, .. } => max,
        }
    }
}

/// Bounds on data disks attached to each node of a group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiskPolicy {
    /// Fewest disks per node
    pub min_per_node: u32,
    /// Most disks per node
    pub max_per_node: u32,
}

/// Static shape of one node group for a kind
#[derive(Debug)]
pub struct NodeGroupDefinition {
    /// Which role this group plays
    pub role: RoleName,
    /// Instance count policy
    pub count: InstanceCount,
    /// Accepted VM sizes (case-sensitive)
    pub vm_sizes: &'static [&'static str],
    /// Data disk policy, `None` when disks cannot be configured
    pub disks: Option<DiskPolicy>,
    /// Provider-reported abbreviation to canonical VM size
    pub sku_overrides: &'static [(&'static str, &'static str)],
}

impl NodeGroupDefinition {
    /// Whether the caller chooses this group's instance count
    pub fn can_specify_count(&self) -> bool {
        self.count.can_specify()
    }

    /// Whether data disks can be configured on this group
    pub fn can_specify_disks(&self) -> bool {
        self.disks.is_some()
    }

    /// Exact-match allow-list check
    pub fn allows_vm_size(&self, vm_size: &str) -> bool {
        self.vm_sizes.contains(&vm_size)
    }

    /// Map a provider-reported VM size to its canonical name
    ///
    /// Abbreviations are matched case-insensitively. Unknown values pass through.
    pub fn canonical_vm_size(&self, reported: &str) -> String {
        self.sku_overrides
            .iter()
            .find(|(abbrev, _)| abbrev.eq_ignore_ascii_case(reported))
            .map(|(_, canonical)| (*canonical).to_string())
            .unwrap_or_else(|| reported.to_string())
    }
}

/// Static definition of a cluster kind
#[derive(Debug)]
pub struct KindDefinition {
    /// The kind this definition describes
    pub kind: ClusterKind,
    /// Provider cluster definition kind, e.g. "Storm"
    pub provider_kind: &'static str,
    /// Key that must be present in the component version map
    pub component: &'static str,
    /// Node operating system
    pub os_type: OsType,
    /// Head node group
    pub head_node: NodeGroupDefinition,
    /// Worker node group
    pub worker_node: NodeGroupDefinition,
    /// Coordinator node group
    pub zookeeper_node: NodeGroupDefinition,
}

impl KindDefinition {
    /// Definition for one role
    pub fn node_group(&self, role: RoleName) -> &NodeGroupDefinition {
        match role {
            RoleName::Head => &self.head_node,
            RoleName::Worker => &self.worker_node,
            RoleName::Zookeeper => &self.zookeeper_node,
        }
    }

    /// All three definitions in provider order
    pub fn node_groups(&self) -> [&NodeGroupDefinition; 3] {
        [&self.head_node, &self.worker_node, &self.zookeeper_node]
    }
}

// ============================================================================
// VM size catalogs
// ============================================================================

const HEAD_NODE_VM_SIZES: &[&str] = &[
    "Standard_A3",
    "Standard_A4",
    "Standard_A4_v2",
    "Standard_A4m_v2",
    "Standard_A6",
    "Standard_A7",
    "Standard_A8_v2",
    "Standard_A8m_v2",
    "Standard_D12_v2",
    "Standard_D13_v2",
    "Standard_D14_v2",
    "Standard_D3_v2",
    "Standard_D4_v2",
    "Standard_D5_v2",
    "Standard_E16_v3",
    "Standard_E20_v3",
    "Standard_E2_v3",
    "Standard_E32_v3",
    "Standard_E4_v3",
    "Standard_E64_v3",
    "Standard_E64i_v3",
    "Standard_E8_v3",
    "Standard_G2",
    "Standard_G3",
    "Standard_G4",
    "Standard_G5",
];

const WORKER_NODE_VM_SIZES: &[&str] = &[
    "Standard_A3",
    "Standard_A4",
    "Standard_A4_v2",
    "Standard_A4m_v2",
    "Standard_A6",
    "Standard_A7",
    "Standard_A8_v2",
    "Standard_A8m_v2",
    "Standard_D3_v2",
    "Standard_D4_v2",
    "Standard_D5_v2",
    "Standard_D12_v2",
    "Standard_D13_v2",
    "Standard_D14_v2",
    "Standard_E2_v3",
    "Standard_E4_v3",
    "Standard_E8_v3",
    "Standard_E16_v3",
    "Standard_E20_v3",
    "Standard_E32_v3",
    "Standard_E64_v3",
    "Standard_E64i_v3",
    "Standard_G2",
    "Standard_G3",
    "Standard_G4",
    "Standard_G5",
];

// The provider pins the coordinator size.
const ZOOKEEPER_NODE_VM_SIZES: &[&str] = &["Standard_A4_V2"];

const HEAD_NODE_SKU_OVERRIDES: &[(&str, &str)] = &[("large", "Standard_A3")];
const WORKER_NODE_SKU_OVERRIDES: &[(&str, &str)] = &[("large", "Standard_A4_v2")];

// No hard limit on workers beyond subscription quota.
const WORKER_COUNT: InstanceCount = InstanceCount::Range { min: 1, max: 9999 };

const fn head_node() -> NodeGroupDefinition {
    NodeGroupDefinition {
        role: RoleName::Head,
        count: InstanceCount::Fixed(2),
        vm_sizes: HEAD_NODE_VM_SIZES,
        disks: None,
        sku_overrides: HEAD_NODE_SKU_OVERRIDES,
    }
}

const fn worker_node(disks: Option<DiskPolicy>) -> NodeGroupDefinition {
    NodeGroupDefinition {
        role: RoleName::Worker,
        count: WORKER_COUNT,
        vm_sizes: WORKER_NODE_VM_SIZES,
        disks,
        sku_overrides: WORKER_NODE_SKU_OVERRIDES,
    }
}

const fn zookeeper_node() -> NodeGroupDefinition {
    NodeGroupDefinition {
        role: RoleName::Zookeeper,
        count: InstanceCount::Fixed(3),
        vm_sizes: ZOOKEEPER_NODE_VM_SIZES,
        disks: None,
        sku_overrides: &[],
    }
}

static HADOOP: KindDefinition = KindDefinition {
    kind: ClusterKind::Hadoop,
    provider_kind: "Hadoop",
    component: "Hadoop",
    os_type: OsType::Linux,
    head_node: head_node(),
    worker_node: worker_node(None),
    zookeeper_node: zookeeper_node(),
};

static HBASE: KindDefinition = KindDefinition {
    kind: ClusterKind::HBase,
    provider_kind: "HBase",
    component: "HBase",
    os_type: OsType::Linux,
    head_node: head_node(),
    worker_node: worker_node(None),
    zookeeper_node: zookeeper_node(),
};

static KAFKA: KindDefinition = KindDefinition {
    kind: ClusterKind::Kafka,
    provider_kind: "Kafka",
    component: "Kafka",
    os_type: OsType::Linux,
    head_node: head_node(),
    worker_node: worker_node(Some(DiskPolicy {
        min_per_node: 1,
        max_per_node: 8,
    })),
    zookeeper_node: zookeeper_node(),
};

static SPARK: KindDefinition = KindDefinition {
    kind: ClusterKind::Spark,
    provider_kind: "Spark",
    component: "Spark",
    os_type: OsType::Linux,
    head_node: head_node(),
    worker_node: worker_node(None),
    zookeeper_node: zookeeper_node(),
};

static STORM: KindDefinition = KindDefinition {
    kind: ClusterKind::Storm,
    provider_kind: "Storm",
    component: "Storm",
    os_type: OsType::Linux,
    head_node: head_node(),
    worker_node: worker_node(None),
    zookeeper_node: zookeeper_node(),
};
