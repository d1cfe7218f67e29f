//! Desired state for a cluster

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::roles::RolesSpec;
use crate::Error;

/// Desired state of a cluster, supplied by the caller on every call
///
/// The kind is not part of the document; a reconciler is bound to one kind
/// and applies its definition to every spec it handles.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Cluster name, unique within the resource group
    pub name: String,

    /// Resource group the cluster lives in
    pub resource_group: String,

    /// Region, e.g. "West Europe" or "westeurope"
    pub location: String,

    /// Provider cluster version, e.g. "3.6"
    pub cluster_version: String,

    /// Service tier
    #[serde(default)]
    pub tier: Tier,

    /// Component name to version, e.g. {"Storm": "1.1"}
    pub component_version: BTreeMap<String, String>,

    /// Gateway (Ambari REST) credentials
    pub gateway: GatewaySpec,

    /// Storage accounts, accepted on create and never read back
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage_accounts: Vec<StorageAccountSpec>,

    /// Node groups
    pub roles: RolesSpec,

    /// Resource tags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl ClusterSpec {
    /// Validate the fields that do not depend on the cluster kind
    pub fn validate(&self) -> Result<(), Error> {
        let required = [
            ("name", &self.name),
            ("resourceGroup", &self.resource_group),
            ("location", &self.location),
            ("clusterVersion", &self.cluster_version),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::validation_for_field(
                    &self.name,
                    field,
                    format!("{field} cannot be empty"),
                ));
            }
        }

        if self.gateway.username.is_empty() {
            return Err(Error::validation_for_field(
                &self.name,
                "gateway.username",
                "gateway username cannot be empty",
            ));
        }

        Ok(())
    }
}

/// Service tier
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum Tier {
    /// Standard tier
    #[default]
    Standard,
    /// Premium tier (enterprise security package)
    Premium,
}

impl Tier {
    /// Provider wire value
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Standard => "Standard",
            Tier::Premium => "Premium",
        }
    }

    /// Parse the tier the provider reports, ignoring case
    pub fn from_provider(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("standard") {
            Some(Tier::Standard)
        } else if value.eq_ignore_ascii_case("premium") {
            Some(Tier::Premium)
        } else {
            None
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// Gateway credentials, stored by the provider as the "gateway" configuration
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySpec {
    /// Whether HTTP basic auth to the gateway is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Gateway user
    pub username: String,

    /// Gateway password
    pub password: String,
}

/// A storage account attached at creation time
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountSpec {
    /// Container URL, e.g. "https://acct.blob.core.windows.net/container"
    pub storage_container_id: String,

    /// Account access key
    pub storage_account_key: String,

    /// Whether this is the cluster's default file system
    #[serde(default)]
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_yaml() -> &'static str {
        r#"
name: storm-prod
resourceGroup: rg-analytics
location: West Europe
clusterVersion: "3.6"
componentVersion:
  Storm: "1.1"
gateway:
  username: admin
  password: Passw0rd!
storageAccounts:
  - storageContainerId: https://acct.blob.core.windows.net/data
    storageAccountKey: a2V5
    isDefault: true
roles:
  headNode:
    vmSize: Standard_A4_v2
    username: sshuser
    password: Passw0rd!
  workerNode:
    vmSize: Standard_A4_v2
    username: sshuser
    password: Passw0rd!
    targetInstanceCount: 3
  zookeeperNode:
    vmSize: Standard_A4_V2
    username: sshuser
    password: Passw0rd!
tags:
  env: prod
"#
    }

    #[test]
    fn spec_parses_from_camel_case_yaml() {
        let spec: ClusterSpec = serde_yaml::from_str(spec_yaml()).expect("spec should parse");
        assert_eq!(spec.name, "storm-prod");
        assert_eq!(spec.tier, Tier::Standard);
        assert!(spec.gateway.enabled);
        assert_eq!(spec.component_version["Storm"], "1.1");
        assert_eq!(spec.storage_accounts.len(), 1);
        assert!(spec.storage_accounts[0].is_default);
        let worker = spec.roles.worker_node.as_ref().expect("worker present");
        assert_eq!(worker.target_instance_count, Some(3));
        assert_eq!(spec.tags["env"], "prod");
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn validate_names_fields_as_the_document_does() {
        let mut spec: ClusterSpec = serde_yaml::from_str(spec_yaml()).expect("spec should parse");
        spec.resource_group = String::new();
        match spec.validate().expect_err("blank resource group") {
            Error::Validation { field, message, .. } => {
                assert_eq!(field.as_deref(), Some("resourceGroup"));
                assert!(message.starts_with("resourceGroup"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let mut spec: ClusterSpec = serde_yaml::from_str(spec_yaml()).expect("spec should parse");
        spec.cluster_version = " ".to_string();
        match spec.validate().expect_err("blank cluster version") {
            Error::Validation { field, .. } => assert_eq!(field.as_deref(), Some("clusterVersion")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_blank_location() {
        let mut spec: ClusterSpec = serde_yaml::from_str(spec_yaml()).expect("spec should parse");
        spec.location = "  ".to_string();
        let err = spec.validate().expect_err("blank location");
        match err {
            Error::Validation { field, cluster, .. } => {
                assert_eq!(field.as_deref(), Some("location"));
                assert_eq!(cluster, "storm-prod");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn tier_from_provider_ignores_case() {
        assert_eq!(Tier::from_provider("standard"), Some(Tier::Standard));
        assert_eq!(Tier::from_provider("PREMIUM"), Some(Tier::Premium));
        assert_eq!(Tier::from_provider("basic"), None);
    }
}
