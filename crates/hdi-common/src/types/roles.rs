//! Roles document: one node group per structural role

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::kind::RoleName;

/// Node groups of a cluster
///
/// A missing group is `None`. Create requires all three; Read reports `None`
/// for any group the provider did not return.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RolesSpec {
    /// Head nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_node: Option<NodeGroupSpec>,

    /// Worker nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_node: Option<NodeGroupSpec>,

    /// Coordinator nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zookeeper_node: Option<NodeGroupSpec>,
}

impl RolesSpec {
    /// The group for a role
    pub fn group(&self, role: RoleName) -> Option<&NodeGroupSpec> {
        match role {
            RoleName::Head => self.head_node.as_ref(),
            RoleName::Worker => self.worker_node.as_ref(),
            RoleName::Zookeeper => self.zookeeper_node.as_ref(),
        }
    }

    /// Mutable slot for a role
    pub fn group_mut(&mut self, role: RoleName) -> &mut Option<NodeGroupSpec> {
        match role {
            RoleName::Head => &mut self.head_node,
            RoleName::Worker => &mut self.worker_node,
            RoleName::Zookeeper => &mut self.zookeeper_node,
        }
    }
}

/// One node group
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupSpec {
    /// VM size, must be in the kind's allow-list for this role
    pub vm_size: String,

    /// Admin user created on every node
    pub username: String,

    /// Admin password; the provider never returns it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// SSH public keys; the provider never returns them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_keys: Vec<String>,

    /// Subnet the nodes join; set together with `virtual_network_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,

    /// Virtual network the nodes join; set together with `subnet_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_id: Option<String>,

    /// Instance count, only honored for groups whose count the caller sets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_instance_count: Option<u32>,

    /// Data disks per node, only for groups that take disks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_disks_per_node: Option<u32>,
}
