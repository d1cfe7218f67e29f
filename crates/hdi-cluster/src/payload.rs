//! Translation between desired-state documents and provider payloads

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use hdi_common::{
    ClusterSpec, ClusterSummary, Error, GatewaySpec, KindDefinition, ObservedCluster, Result,
    RolesSpec, StorageAccountSpec, Tier, GATEWAY_CONFIGURATION,
};
use hdi_provider::model::{
    Cluster, ClusterCreateParameters, ClusterCreateProperties, ClusterDefinition, ComputeProfile,
    ConfigurationValues, StorageAccount, StorageProfile,
};
use hdi_provider::Url;

use crate::roles::{expand_roles, flatten_roles};

const GATEWAY_ENABLED: &str = "restAuthCredential.isEnabled";
const GATEWAY_USERNAME: &str = "restAuthCredential.username";
const GATEWAY_PASSWORD: &str = "restAuthCredential.password";

/// Lowercase a region name and drop its spaces: "West Europe" -> "westeurope"
pub fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Check that the component versions name the kind's component
pub fn validate_component_version(
    versions: &BTreeMap<String, String>,
    definition: &KindDefinition,
) -> Result<()> {
    match versions.get(definition.component) {
        Some(version) if !version.trim().is_empty() => Ok(()),
        Some(_) => Err(Error::validation_field(
            format!("componentVersion.{}", definition.component),
            format!("{} version cannot be empty", definition.component),
        )),
        None => Err(Error::validation_field(
            "componentVersion",
            format!(
                "componentVersion must contain a version for {}",
                definition.component
            ),
        )),
    }
}

/// Gateway settings as the provider's configuration block
pub fn expand_gateway(gateway: &GatewaySpec) -> serde_json::Value {
    let mut values = Map::new();
    values.insert(GATEWAY_ENABLED.to_string(), Value::Bool(gateway.enabled));
    values.insert(
        GATEWAY_USERNAME.to_string(),
        Value::String(gateway.username.clone()),
    );
    values.insert(
        GATEWAY_PASSWORD.to_string(),
        Value::String(gateway.password.clone()),
    );

    let mut configurations = Map::new();
    configurations.insert(GATEWAY_CONFIGURATION.to_string(), Value::Object(values));
    Value::Object(configurations)
}

/// Gateway settings from the provider's "gateway" configuration
///
/// An empty configuration yields `None`. A missing or unparseable enabled flag
/// reads as enabled.
pub fn flatten_gateway(values: &ConfigurationValues) -> Option<GatewaySpec> {
    if values.is_empty() {
        return None;
    }
    let enabled = values
        .get(GATEWAY_ENABLED)
        .map(|v| !v.trim().eq_ignore_ascii_case("false"))
        .unwrap_or(true);
    Some(GatewaySpec {
        enabled,
        username: values.get(GATEWAY_USERNAME).cloned().unwrap_or_default(),
        password: values.get(GATEWAY_PASSWORD).cloned().unwrap_or_default(),
    })
}

/// Storage accounts as the provider's storage profile
///
/// Each container id must be a URL of the form
/// `https://<account host>/<container>`. Exactly one account is the default.
pub fn expand_storage_accounts(accounts: &[StorageAccountSpec]) -> Result<StorageProfile> {
    let defaults = accounts.iter().filter(|a| a.is_default).count();
    if defaults != 1 {
        return Err(Error::validation_field(
            "storageAccounts",
            format!("exactly one storage account must be the default, found {defaults}"),
        ));
    }

    let storage_accounts = accounts
        .iter()
        .enumerate()
        .map(|(index, account)| expand_storage_account(index, account))
        .collect::<Result<Vec<_>>>()?;
    Ok(StorageProfile { storage_accounts })
}

fn expand_storage_account(index: usize, account: &StorageAccountSpec) -> Result<StorageAccount> {
    let field = format!("storageAccounts[{index}].storageContainerId");
    let url = Url::parse(&account.storage_container_id).map_err(|e| {
        Error::validation_field(
            &field,
            format!(
                "cannot parse storage container id {:?}: {e}",
                account.storage_container_id
            ),
        )
    })?;

    let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(|| {
        Error::validation_field(
            &field,
            format!("storage container id {:?} has no host", account.storage_container_id),
        )
    })?;
    let container = url.path().trim_matches('/');
    if container.is_empty() || container.contains('/') {
        return Err(Error::validation_field(
            &field,
            format!(
                "storage container id {:?} must name exactly one container",
                account.storage_container_id
            ),
        ));
    }

    Ok(StorageAccount {
        name: host.to_string(),
        is_default: account.is_default,
        container: container.to_string(),
        key: account.storage_account_key.clone(),
    })
}

/// Build the create request for a validated spec
pub fn build_create_parameters(
    spec: &ClusterSpec,
    definition: &KindDefinition,
) -> Result<ClusterCreateParameters> {
    spec.validate()?;
    validate_component_version(&spec.component_version, definition)?;
    let storage_profile = expand_storage_accounts(&spec.storage_accounts)?;
    let roles = expand_roles(&spec.roles, definition)?;

    Ok(ClusterCreateParameters {
        location: normalize_location(&spec.location),
        tags: spec.tags.clone(),
        properties: ClusterCreateProperties {
            cluster_version: spec.cluster_version.clone(),
            os_type: definition.os_type.as_str().to_string(),
            tier: spec.tier.as_str().to_string(),
            cluster_definition: ClusterDefinition {
                kind: Some(definition.provider_kind.to_string()),
                component_version: spec.component_version.clone(),
                configurations: Some(expand_gateway(&spec.gateway)),
            },
            compute_profile: ComputeProfile { roles },
            storage_profile,
        },
    })
}

/// Assemble the observed state of a cluster
///
/// `existing` is the caller's previous roles document, used only for values
/// the provider never returns.
pub fn observed_cluster(
    resource_group: &str,
    name: &str,
    cluster: &Cluster,
    gateway: &ConfigurationValues,
    existing: Option<&RolesSpec>,
    definition: &KindDefinition,
) -> ObservedCluster {
    let props = cluster.properties.as_ref();
    let cluster_definition = props.and_then(|p| p.cluster_definition.as_ref());

    ObservedCluster {
        id: cluster.id.clone().unwrap_or_default(),
        name: name.to_string(),
        resource_group: resource_group.to_string(),
        location: cluster.location.as_deref().map(normalize_location),
        kind: cluster_definition.and_then(|d| d.kind.clone()),
        cluster_version: props.and_then(|p| p.cluster_version.clone()),
        tier: props
            .and_then(|p| p.tier.as_deref())
            .and_then(Tier::from_provider),
        component_version: cluster_definition
            .map(|d| d.component_version.clone())
            .unwrap_or_default(),
        gateway: flatten_gateway(gateway),
        roles: flatten_roles(
            props.and_then(|p| p.compute_profile.as_ref()),
            existing,
            definition,
        ),
        https_endpoint: props.and_then(|p| p.endpoint_location("HTTPS")),
        ssh_endpoint: props.and_then(|p| p.endpoint_location("SSH")),
        provisioning_state: props.and_then(|p| p.provisioning_state.clone()),
        tags: cluster.tags.clone(),
    }
}

/// Read-only summary of a cluster
pub fn cluster_summary(resource_group: &str, name: &str, cluster: &Cluster) -> ClusterSummary {
    let props = cluster.properties.as_ref();
    let cluster_definition = props.and_then(|p| p.cluster_definition.as_ref());

    ClusterSummary {
        id: cluster.id.clone().unwrap_or_default(),
        name: name.to_string(),
        resource_group: resource_group.to_string(),
        location: cluster.location.as_deref().map(normalize_location),
        kind: cluster_definition.and_then(|d| d.kind.clone()),
        tier: props
            .and_then(|p| p.tier.as_deref())
            .and_then(Tier::from_provider),
        cluster_version: props.and_then(|p| p.cluster_version.clone()),
        component_version: cluster_definition
            .map(|d| d.component_version.clone())
            .unwrap_or_default(),
        https_endpoint: props.and_then(|p| p.endpoint_location("HTTPS")),
        ssh_endpoint: props.and_then(|p| p.endpoint_location("SSH")),
        tags: cluster.tags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdi_common::{ClusterKind, NodeGroupSpec};

    fn account(url: &str, is_default: bool) -> StorageAccountSpec {
        StorageAccountSpec {
            storage_container_id: url.to_string(),
            storage_account_key: "a2V5".to_string(),
            is_default,
        }
    }

    fn spec() -> ClusterSpec {
        let group = |size: &str, count: Option<u32>| NodeGroupSpec {
            vm_size: size.to_string(),
            username: "sshuser".to_string(),
            password: Some("Passw0rd!".to_string()),
            target_instance_count: count,
            ..Default::default()
        };
        ClusterSpec {
            name: "storm-1".to_string(),
            resource_group: "rg".to_string(),
            location: "West Europe".to_string(),
            cluster_version: "3.6".to_string(),
            tier: Tier::Standard,
            component_version: BTreeMap::from([("Storm".to_string(), "1.1".to_string())]),
            gateway: GatewaySpec {
                enabled: true,
                username: "admin".to_string(),
                password: "Gw-Passw0rd!".to_string(),
            },
            storage_accounts: vec![account("https://acct.blob.core.windows.net/data", true)],
            roles: RolesSpec {
                head_node: Some(group("Standard_A3", None)),
                worker_node: Some(group("Standard_D4_v2", Some(3))),
                zookeeper_node: Some(group("Standard_A4_V2", None)),
            },
            tags: BTreeMap::from([("env".to_string(), "test".to_string())]),
        }
    }

    #[test]
    fn locations_are_normalized() {
        assert_eq!(normalize_location("West Europe"), "westeurope");
        assert_eq!(normalize_location("eastus2"), "eastus2");
        assert_eq!(normalize_location(" North  Central US "), "northcentralus");
    }

    #[test]
    fn storage_url_splits_into_host_and_container() {
        let profile = expand_storage_accounts(&[account(
            "https://acct.blob.core.windows.net/data",
            true,
        )])
        .expect("valid url");
        let acct = &profile.storage_accounts[0];
        assert_eq!(acct.name, "acct.blob.core.windows.net");
        assert_eq!(acct.container, "data");
        assert!(acct.is_default);
    }

    #[test]
    fn storage_needs_exactly_one_default() {
        assert!(expand_storage_accounts(&[]).is_err());
        assert!(expand_storage_accounts(&[
            account("https://a.blob.core.windows.net/x", true),
            account("https://b.blob.core.windows.net/y", true),
        ])
        .is_err());
        assert!(expand_storage_accounts(&[
            account("https://a.blob.core.windows.net/x", true),
            account("https://b.blob.core.windows.net/y", false),
        ])
        .is_ok());
    }

    #[test]
    fn unparseable_storage_url_is_a_validation_error() {
        for url in ["not a url", "https://acct.blob.core.windows.net/", "https://h/a/b"] {
            let err = expand_storage_accounts(&[account(url, true)])
                .expect_err("bad container id must fail");
            assert!(matches!(err, Error::Validation { .. }), "{url}: {err:?}");
        }
    }

    #[test]
    fn component_version_must_name_the_component() {
        let def = ClusterKind::Storm.definition();
        let mut versions = BTreeMap::from([("Spark".to_string(), "2.3".to_string())]);
        assert!(validate_component_version(&versions, def).is_err());
        versions.insert("Storm".to_string(), "1.1".to_string());
        assert!(validate_component_version(&versions, def).is_ok());
    }

    #[test]
    fn gateway_maps_to_configuration_keys() {
        let value = expand_gateway(&spec().gateway);
        assert_eq!(value["gateway"][GATEWAY_ENABLED], true);
        assert_eq!(value["gateway"][GATEWAY_USERNAME], "admin");
        assert_eq!(value["gateway"][GATEWAY_PASSWORD], "Gw-Passw0rd!");
    }

    #[test]
    fn gateway_reads_back_from_configuration() {
        let values = ConfigurationValues::from([
            (GATEWAY_ENABLED.to_string(), "False".to_string()),
            (GATEWAY_USERNAME.to_string(), "admin".to_string()),
        ]);
        let gateway = flatten_gateway(&values).expect("gateway present");
        assert!(!gateway.enabled);
        assert_eq!(gateway.username, "admin");
        assert_eq!(gateway.password, "");
        assert!(flatten_gateway(&ConfigurationValues::new()).is_none());
    }

    #[test]
    fn create_parameters_carry_the_kind() {
        let params = build_create_parameters(&spec(), ClusterKind::Storm.definition())
            .expect("valid spec");
        assert_eq!(params.location, "westeurope");
        assert_eq!(params.properties.os_type, "Linux");
        assert_eq!(params.properties.tier, "Standard");
        assert_eq!(params.properties.cluster_definition.kind.as_deref(), Some("Storm"));
        assert_eq!(params.properties.compute_profile.roles.len(), 3);
        assert_eq!(params.properties.storage_profile.storage_accounts.len(), 1);
        assert_eq!(params.tags["env"], "test");
    }

    #[test]
    fn invalid_roles_fail_the_payload() {
        let mut spec = spec();
        if let Some(worker) = spec.roles.worker_node.as_mut() {
            worker.target_instance_count = Some(0);
        }
        assert!(build_create_parameters(&spec, ClusterKind::Storm.definition()).is_err());
    }
}
