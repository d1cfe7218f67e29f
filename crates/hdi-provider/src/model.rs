//! Wire model of the HDInsight management API (2018-06-01-preview)
//!
//! Field names follow the provider's JSON. Everything the provider may omit
//! on read is optional.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body of a create request
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCreateParameters {
    /// Normalized region
    pub location: String,
    /// Resource tags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Cluster properties
    pub properties: ClusterCreateProperties,
}

/// Properties of a create request
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCreateProperties {
    /// Cluster version, e.g. "3.6"
    pub cluster_version: String,
    /// Node operating system, e.g. "Linux"
    pub os_type: String,
    /// Service tier, "Standard" or "Premium"
    pub tier: String,
    /// Kind, component versions and configurations
    pub cluster_definition: ClusterDefinition,
    /// Node roles
    pub compute_profile: ComputeProfile,
    /// Attached storage accounts
    pub storage_profile: StorageProfile,
}

/// Kind and configuration of a cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDefinition {
    /// Provider kind, e.g. "Storm"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Component name to version
    #[serde(default)]
    pub component_version: BTreeMap<String, String>,
    /// Named configuration blocks; only sent on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configurations: Option<serde_json::Value>,
}

/// Node roles of a cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComputeProfile {
    /// One entry per role
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl ComputeProfile {
    /// Find a role by its exact provider name
    pub fn find_role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|role| role.name.as_deref() == Some(name))
    }
}

/// One node role
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Provider role name: headnode, workernode or zookeepernode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Minimum instance count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_instance_count: Option<u32>,
    /// Target instance count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_instance_count: Option<u32>,
    /// VM size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_profile: Option<HardwareProfile>,
    /// Operating system profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_profile: Option<OsProfile>,
    /// Network placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network_profile: Option<VirtualNetworkProfile>,
    /// Data disks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_disks_groups: Vec<DataDisksGroup>,
}

/// VM size of a role
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    /// VM size; the provider may report an abbreviation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_size: Option<String>,
}

/// Operating system profile of a role
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OsProfile {
    /// Linux settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux_operating_system_profile: Option<LinuxOperatingSystemProfile>,
}

/// Linux admin account of a role
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinuxOperatingSystemProfile {
    /// Admin user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Admin password, write-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// SSH keys, write-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_profile: Option<SshProfile>,
}

/// SSH keys of a role
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SshProfile {
    /// Public keys
    #[serde(default)]
    pub public_keys: Vec<SshPublicKey>,
}

/// One SSH public key
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SshPublicKey {
    /// Key material
    pub certificate_data: String,
}

/// Network placement of a role
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProfile {
    /// Virtual network id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Subnet id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
}

/// Data disks attached to each node of a role
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataDisksGroup {
    /// Disks per node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disks_per_node: Option<u32>,
}

/// Storage accounts of a create request
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct StorageProfile {
    /// Accounts, the provider spells this key in lowercase
    #[serde(default, rename = "storageaccounts")]
    pub storage_accounts: Vec<StorageAccount>,
}

/// One storage account of a create request
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccount {
    /// Blob endpoint host, e.g. "acct.blob.core.windows.net"
    pub name: String,
    /// Whether this is the default file system
    pub is_default: bool,
    /// Container name
    pub container: String,
    /// Access key
    pub key: String,
}

/// A cluster as returned by GET
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Provider identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Cluster name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Region display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Resource tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Cluster properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ClusterProperties>,
}

/// Properties of a cluster as returned by GET
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProperties {
    /// Cluster version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_version: Option<String>,
    /// Node operating system
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    /// Service tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    /// Kind and component versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_definition: Option<ClusterDefinition>,
    /// Node roles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_profile: Option<ComputeProfile>,
    /// Provisioning state, e.g. "Succeeded"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    /// Cluster state, e.g. "Running"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_state: Option<String>,
    /// Endpoints for connecting to the cluster
    #[serde(default)]
    pub connectivity_endpoints: Vec<ConnectivityEndpoint>,
}

impl ClusterProperties {
    /// Location of the first endpoint with the given name ("HTTPS", "SSH")
    pub fn endpoint_location(&self, name: &str) -> Option<String> {
        self.connectivity_endpoints
            .iter()
            .find(|endpoint| endpoint.name.as_deref() == Some(name))
            .and_then(|endpoint| endpoint.location.clone())
    }
}

/// An endpoint for connecting to the cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityEndpoint {
    /// Endpoint name, named by protocol ("HTTPS", "SSH")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Transport protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Host name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Body of a tag patch
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ClusterPatchParameters {
    /// Complete replacement tag set
    pub tags: BTreeMap<String, String>,
}

/// Body of a worker resize
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResizeParameters {
    /// New worker count
    pub target_instance_count: u32,
}

/// Key/value pairs of a named configuration
pub type ConfigurationValues = BTreeMap<String, String>;
