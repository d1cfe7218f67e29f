//! State reported back to the caller

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::cluster::{GatewaySpec, Tier};
use super::roles::RolesSpec;

/// A cluster as observed on the provider
///
/// Built fresh on every read and never cached. Storage accounts are absent
/// because the provider does not return them.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObservedCluster {
    /// Provider identifier
    pub id: String,

    /// Cluster name
    pub name: String,

    /// Resource group
    pub resource_group: String,

    /// Normalized region (lowercase, no spaces)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Provider cluster kind, e.g. "Storm"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Cluster version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_version: Option<String>,

    /// Service tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,

    /// Component versions
    #[serde(default)]
    pub component_version: BTreeMap<String, String>,

    /// Gateway settings from the gateway configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewaySpec>,

    /// Node groups
    #[serde(default)]
    pub roles: RolesSpec,

    /// Location of the "HTTPS" connectivity endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_endpoint: Option<String>,

    /// Location of the "SSH" connectivity endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_endpoint: Option<String>,

    /// Provisioning state reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,

    /// Resource tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Read-only view of an existing cluster, looked up by name
///
/// Carries no credentials and no roles.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    /// Provider identifier
    pub id: String,

    /// Cluster name
    pub name: String,

    /// Resource group
    pub resource_group: String,

    /// Normalized region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Provider cluster kind, e.g. "Spark"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Service tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,

    /// Cluster version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_version: Option<String>,

    /// Component versions
    #[serde(default)]
    pub component_version: BTreeMap<String, String>,

    /// Location of the "HTTPS" connectivity endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_endpoint: Option<String>,

    /// Location of the "SSH" connectivity endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_endpoint: Option<String>,

    /// Resource tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}
