//! Role mapping between the roles document and the provider's role list
//!
//! Expansion validates each node group against its kind definition and
//! produces exactly three provider roles in `headnode`, `workernode`,
//! `zookeepernode` order. Flattening rebuilds the document from what the
//! provider reports, consulting the caller's previous document only for
//! values the provider never returns.

use hdi_common::{Error, KindDefinition, NodeGroupDefinition, NodeGroupSpec, Result, RoleName, RolesSpec};
use hdi_provider::model::{
    ComputeProfile, DataDisksGroup, HardwareProfile, LinuxOperatingSystemProfile, OsProfile, Role,
    SshProfile, SshPublicKey, VirtualNetworkProfile,
};

fn field_path(role: RoleName, field: &str) -> String {
    format!("roles.{}.{field}", role.field_name())
}

/// Expand the roles document into provider roles
///
/// Every group is required. Validation errors name the offending field; the
/// cluster name is left for the caller to fill in.
pub fn expand_roles(roles: &RolesSpec, definition: &KindDefinition) -> Result<Vec<Role>> {
    definition
        .node_groups()
        .into_iter()
        .map(|group| expand_node_group(group, roles.group(group.role)))
        .collect()
}

/// Expand and validate a single node group
pub fn expand_node_group(
    definition: &NodeGroupDefinition,
    spec: Option<&NodeGroupSpec>,
) -> Result<Role> {
    let role = definition.role;
    let spec = spec.ok_or_else(|| {
        Error::validation_field(
            format!("roles.{}", role.field_name()),
            format!("{role} is required"),
        )
    })?;

    if !definition.allows_vm_size(&spec.vm_size) {
        return Err(Error::validation_field(
            field_path(role, "vmSize"),
            format!(
                "vm size {:?} is not allowed for {role}; allowed sizes: {}",
                spec.vm_size,
                definition.vm_sizes.join(", ")
            ),
        ));
    }

    let count = instance_count(definition, spec)?;

    if spec.username.trim().is_empty() {
        return Err(Error::validation_field(
            field_path(role, "username"),
            format!("{role} username cannot be empty"),
        ));
    }

    let has_password = spec.password.as_deref().is_some_and(|p| !p.is_empty());
    if !has_password && spec.ssh_keys.is_empty() {
        return Err(Error::validation_field(
            field_path(role, "password"),
            format!("{role} needs either a password or at least one SSH key"),
        ));
    }

    let virtual_network_profile = match (&spec.subnet_id, &spec.virtual_network_id) {
        (Some(subnet), Some(network)) => Some(VirtualNetworkProfile {
            id: Some(network.clone()),
            subnet: Some(subnet.clone()),
        }),
        (None, None) => None,
        (Some(_), None) => {
            return Err(Error::validation_field(
                field_path(role, "virtualNetworkId"),
                format!("{role} sets subnetId without virtualNetworkId"),
            ))
        }
        (None, Some(_)) => {
            return Err(Error::validation_field(
                field_path(role, "subnetId"),
                format!("{role} sets virtualNetworkId without subnetId"),
            ))
        }
    };

    let data_disks_groups = data_disks(definition, spec)?;

    let ssh_profile = (!spec.ssh_keys.is_empty()).then(|| SshProfile {
        public_keys: spec
            .ssh_keys
            .iter()
            .map(|key| SshPublicKey {
                certificate_data: key.clone(),
            })
            .collect(),
    });

    Ok(Role {
        name: Some(role.provider_name().to_string()),
        min_instance_count: None,
        target_instance_count: Some(count),
        hardware_profile: Some(HardwareProfile {
            vm_size: Some(spec.vm_size.clone()),
        }),
        os_profile: Some(OsProfile {
            linux_operating_system_profile: Some(LinuxOperatingSystemProfile {
                username: Some(spec.username.clone()),
                password: spec.password.clone().filter(|p| !p.is_empty()),
                ssh_profile,
            }),
        }),
        virtual_network_profile,
        data_disks_groups,
    })
}

/// Resolve the instance count for a group
///
/// Fixed groups ignore whatever the caller supplied.
fn instance_count(definition: &NodeGroupDefinition, spec: &NodeGroupSpec) -> Result<u32> {
    let role = definition.role;
    if !definition.can_specify_count() {
        return Ok(definition.count.min());
    }

    let count = spec.target_instance_count.ok_or_else(|| {
        Error::validation_field(
            field_path(role, "targetInstanceCount"),
            format!("{role} targetInstanceCount is required"),
        )
    })?;

    let (min, max) = (definition.count.min(), definition.count.max());
    if count < min {
        return Err(Error::validation_field(
            field_path(role, "targetInstanceCount"),
            format!("{role} targetInstanceCount {count} is below the minimum of {min}"),
        ));
    }
    if count > max {
        return Err(Error::validation_field(
            field_path(role, "targetInstanceCount"),
            format!("{role} targetInstanceCount {count} is above the maximum of {max}"),
        ));
    }
    Ok(count)
}

fn data_disks(definition: &NodeGroupDefinition, spec: &NodeGroupSpec) -> Result<Vec<DataDisksGroup>> {
    let role = definition.role;
    let Some(policy) = definition.disks else {
        if spec.number_of_disks_per_node.is_some() {
            return Err(Error::validation_field(
                field_path(role, "numberOfDisksPerNode"),
                format!("data disks cannot be configured on {role}"),
            ));
        }
        return Ok(Vec::new());
    };

    let disks = spec.number_of_disks_per_node.ok_or_else(|| {
        Error::validation_field(
            field_path(role, "numberOfDisksPerNode"),
            format!("{role} numberOfDisksPerNode is required"),
        )
    })?;
    if disks < policy.min_per_node || disks > policy.max_per_node {
        return Err(Error::validation_field(
            field_path(role, "numberOfDisksPerNode"),
            format!(
                "{role} numberOfDisksPerNode {disks} must be between {} and {}",
                policy.min_per_node, policy.max_per_node
            ),
        ));
    }

    Ok(vec![DataDisksGroup {
        disks_per_node: Some(disks),
    }])
}

/// Rebuild the roles document from the provider's compute profile
///
/// A role the provider does not return flattens to `None`. `existing` is the
/// caller's last known document; it supplies credentials the provider never
/// echoes and fills gaps, but never overrides an observed value.
pub fn flatten_roles(
    profile: Option<&ComputeProfile>,
    existing: Option<&RolesSpec>,
    definition: &KindDefinition,
) -> RolesSpec {
    let mut roles = RolesSpec::default();
    let Some(profile) = profile else {
        return roles;
    };

    for group in definition.node_groups() {
        let observed = profile.find_role(group.role.provider_name());
        let previous = existing.and_then(|roles| roles.group(group.role));
        *roles.group_mut(group.role) =
            observed.map(|role| flatten_node_group(role, previous, group));
    }
    roles
}

/// Flatten a single provider role
pub fn flatten_node_group(
    role: &Role,
    existing: Option<&NodeGroupSpec>,
    definition: &NodeGroupDefinition,
) -> NodeGroupSpec {
    let linux = role
        .os_profile
        .as_ref()
        .and_then(|os| os.linux_operating_system_profile.as_ref());

    let vm_size = role
        .hardware_profile
        .as_ref()
        .and_then(|hw| hw.vm_size.as_deref())
        .map(|size| definition.canonical_vm_size(size))
        .or_else(|| existing.map(|group| group.vm_size.clone()))
        .unwrap_or_default();

    let username = linux
        .and_then(|profile| profile.username.clone())
        .or_else(|| existing.map(|group| group.username.clone()))
        .unwrap_or_default();

    let target_instance_count = if definition.can_specify_count() {
        role.target_instance_count
            .or_else(|| existing.and_then(|group| group.target_instance_count))
    } else {
        None
    };

    let number_of_disks_per_node = if definition.can_specify_disks() {
        role.data_disks_groups
            .first()
            .and_then(|group| group.disks_per_node)
            .or_else(|| existing.and_then(|group| group.number_of_disks_per_node))
    } else {
        None
    };

    let network = role.virtual_network_profile.as_ref();

    NodeGroupSpec {
        vm_size,
        username,
        password: existing.and_then(|group| group.password.clone()),
        ssh_keys: existing.map(|group| group.ssh_keys.clone()).unwrap_or_default(),
        subnet_id: network.and_then(|n| n.subnet.clone()),
        virtual_network_id: network.and_then(|n| n.id.clone()),
        target_instance_count,
        number_of_disks_per_node,
    }
}
