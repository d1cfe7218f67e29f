//! In-memory provider for tests
//!
//! Behaves like the management API closely enough to drive the reconciler end
//! to end: mutating calls return pollable handles, write-only fields are not
//! echoed back, and configured VM sizes can be reported in abbreviated form.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::client::{ClusterApi, OperationHandle, OperationStatus};
use crate::model::{
    Cluster, ClusterCreateParameters, ClusterDefinition, ClusterPatchParameters,
    ClusterProperties, ClusterResizeParameters, ConfigurationValues, ConnectivityEndpoint, Role,
};
use hdi_common::{ClusterId, Error, RoleName};

/// A call made against the in-memory provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiCall {
    /// `create`
    Create {
        /// Resource group
        resource_group: String,
        /// Cluster name
        name: String,
    },
    /// `get`
    Get {
        /// Resource group
        resource_group: String,
        /// Cluster name
        name: String,
    },
    /// `update_tags`
    UpdateTags {
        /// Resource group
        resource_group: String,
        /// Cluster name
        name: String,
        /// Tags sent
        tags: BTreeMap<String, String>,
    },
    /// `resize`
    Resize {
        /// Resource group
        resource_group: String,
        /// Cluster name
        name: String,
        /// Requested worker count
        target_instance_count: u32,
    },
    /// `delete`
    Delete {
        /// Resource group
        resource_group: String,
        /// Cluster name
        name: String,
    },
    /// `get_configuration`
    GetConfiguration {
        /// Resource group
        resource_group: String,
        /// Cluster name
        name: String,
        /// Configuration name
        configuration: String,
    },
    /// `operation_status`
    OperationStatus,
}

struct StoredCluster {
    cluster: Cluster,
    configurations: BTreeMap<String, ConfigurationValues>,
}

enum Outcome {
    Succeed,
    Fail(String),
}

struct PendingOperation {
    remaining_checks: u32,
    outcome: Outcome,
}

#[derive(Default)]
struct State {
    clusters: BTreeMap<(String, String), StoredCluster>,
    operations: HashMap<String, PendingOperation>,
    calls: Vec<ApiCall>,
    in_progress_checks: u32,
    fail_next: Option<String>,
    reported_sizes: Vec<(String, String)>,
}

impl State {
    /// Register a pending operation; its effects have already been applied
    fn start_operation(&mut self, outcome: Outcome) -> OperationHandle {
        let status_url = format!("memory://operations/{}", Uuid::new_v4());
        self.operations.insert(
            status_url.clone(),
            PendingOperation {
                remaining_checks: self.in_progress_checks,
                outcome,
            },
        );
        OperationHandle::pending(status_url, None)
    }

    fn reported_size(&self, canonical: &str) -> String {
        self.reported_sizes
            .iter()
            .find(|(size, _)| size == canonical)
            .map(|(_, reported)| reported.clone())
            .unwrap_or_else(|| canonical.to_string())
    }
}

/// In-memory implementation of [`ClusterApi`]
pub struct InMemoryClusterApi {
    subscription_id: String,
    state: Mutex<State>,
}

impl Default for InMemoryClusterApi {
    fn default() -> Self {
        Self::new("00000000-0000-0000-0000-000000000000")
    }
}

impl InMemoryClusterApi {
    /// Empty provider for the given subscription
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Report every operation as in progress this many times before it finishes
    pub fn with_in_progress_checks(self, checks: u32) -> Self {
        self.state.lock().in_progress_checks = checks;
        self
    }

    /// Report `canonical` VM sizes as `reported` on reads
    pub fn report_vm_size_as(self, canonical: &str, reported: &str) -> Self {
        self.state
            .lock()
            .reported_sizes
            .push((canonical.to_string(), reported.to_string()));
        self
    }

    /// Make the next mutating operation fail with `detail` without applying it
    pub fn fail_next_operation(&self, detail: impl Into<String>) {
        self.state.lock().fail_next = Some(detail.into());
    }

    /// Seed a cluster that exists outside the reconciler's knowledge
    pub fn insert_cluster(&self, resource_group: &str, name: &str, mut cluster: Cluster) {
        if cluster.id.is_none() {
            cluster.id = Some(self.cluster_id(resource_group, name));
        }
        if cluster.name.is_none() {
            cluster.name = Some(name.to_string());
        }
        self.state.lock().clusters.insert(
            (resource_group.to_string(), name.to_string()),
            StoredCluster {
                cluster,
                configurations: BTreeMap::new(),
            },
        );
    }

    /// Remove a cluster behind the reconciler's back
    pub fn remove_cluster(&self, resource_group: &str, name: &str) -> bool {
        self.state
            .lock()
            .clusters
            .remove(&(resource_group.to_string(), name.to_string()))
            .is_some()
    }

    /// Current stored cluster
    pub fn cluster(&self, resource_group: &str, name: &str) -> Option<Cluster> {
        self.state
            .lock()
            .clusters
            .get(&(resource_group.to_string(), name.to_string()))
            .map(|stored| stored.cluster.clone())
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn cluster_id(&self, resource_group: &str, name: &str) -> String {
        ClusterId::new(resource_group, name).to_resource_id(&self.subscription_id)
    }

    fn not_found(resource_group: &str, name: &str) -> Error {
        Error::provider_status(
            404,
            format!("ResourceNotFound: cluster {name} in resource group {resource_group} was not found"),
        )
    }
}

fn scrub_role(role: &Role, reported_size: impl Fn(&str) -> String) -> Role {
    let mut role = role.clone();
    if let Some(profile) = role
        .os_profile
        .as_mut()
        .and_then(|os| os.linux_operating_system_profile.as_mut())
    {
        profile.password = None;
        profile.ssh_profile = None;
    }
    if let Some(size) = role
        .hardware_profile
        .as_mut()
        .and_then(|hw| hw.vm_size.as_mut())
    {
        *size = reported_size(size);
    }
    role
}

fn configuration_values(value: &serde_json::Value) -> ConfigurationValues {
    value
        .as_object()
        .map(|entries| {
            entries
                .iter()
                .map(|(key, value)| {
                    let text = value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_string());
                    (key.clone(), text)
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ClusterApi for InMemoryClusterApi {
    async fn create(
        &self,
        resource_group: &str,
        name: &str,
        params: &ClusterCreateParameters,
    ) -> Result<OperationHandle, Error> {
        let id = self.cluster_id(resource_group, name);
        let mut state = self.state.lock();
        state.calls.push(ApiCall::Create {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
        });

        let key = (resource_group.to_string(), name.to_string());
        if state.clusters.contains_key(&key) {
            return Err(Error::provider_status(
                409,
                format!("Conflict: cluster {name} already exists"),
            ));
        }

        if let Some(detail) = state.fail_next.take() {
            return Ok(state.start_operation(Outcome::Fail(detail)));
        }

        let props = &params.properties;
        let roles = props
            .compute_profile
            .roles
            .iter()
            .map(|role| scrub_role(role, |size| state.reported_size(size)))
            .collect();

        let configurations = props
            .cluster_definition
            .configurations
            .as_ref()
            .and_then(|value| value.as_object())
            .map(|blocks| {
                blocks
                    .iter()
                    .map(|(block, values)| (block.clone(), configuration_values(values)))
                    .collect()
            })
            .unwrap_or_default();

        let cluster = Cluster {
            id: Some(id),
            name: Some(name.to_string()),
            location: Some(params.location.clone()),
            tags: params.tags.clone(),
            properties: Some(ClusterProperties {
                cluster_version: Some(props.cluster_version.clone()),
                os_type: Some(props.os_type.clone()),
                tier: Some(props.tier.clone()),
                cluster_definition: Some(ClusterDefinition {
                    kind: props.cluster_definition.kind.clone(),
                    component_version: props.cluster_definition.component_version.clone(),
                    configurations: None,
                }),
                compute_profile: Some(crate::model::ComputeProfile { roles }),
                provisioning_state: Some("Succeeded".to_string()),
                cluster_state: Some("Running".to_string()),
                connectivity_endpoints: vec![
                    ConnectivityEndpoint {
                        name: Some("SSH".to_string()),
                        protocol: Some("TCP".to_string()),
                        location: Some(format!("{name}-ssh.azurehdinsight.net")),
                        port: Some(22),
                    },
                    ConnectivityEndpoint {
                        name: Some("HTTPS".to_string()),
                        protocol: Some("TCP".to_string()),
                        location: Some(format!("{name}.azurehdinsight.net")),
                        port: Some(443),
                    },
                ],
            }),
        };

        state.clusters.insert(
            key,
            StoredCluster {
                cluster,
                configurations,
            },
        );
        Ok(state.start_operation(Outcome::Succeed))
    }

    async fn get(&self, resource_group: &str, name: &str) -> Result<Option<Cluster>, Error> {
        let mut state = self.state.lock();
        state.calls.push(ApiCall::Get {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
        });
        Ok(state
            .clusters
            .get(&(resource_group.to_string(), name.to_string()))
            .map(|stored| stored.cluster.clone()))
    }

    async fn update_tags(
        &self,
        resource_group: &str,
        name: &str,
        params: &ClusterPatchParameters,
    ) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.calls.push(ApiCall::UpdateTags {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
            tags: params.tags.clone(),
        });
        let stored = state
            .clusters
            .get_mut(&(resource_group.to_string(), name.to_string()))
            .ok_or_else(|| Self::not_found(resource_group, name))?;
        stored.cluster.tags = params.tags.clone();
        Ok(())
    }

    async fn resize(
        &self,
        resource_group: &str,
        name: &str,
        params: &ClusterResizeParameters,
    ) -> Result<OperationHandle, Error> {
        let mut state = self.state.lock();
        state.calls.push(ApiCall::Resize {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
            target_instance_count: params.target_instance_count,
        });

        let key = (resource_group.to_string(), name.to_string());
        if !state.clusters.contains_key(&key) {
            return Err(Self::not_found(resource_group, name));
        }
        if let Some(detail) = state.fail_next.take() {
            return Ok(state.start_operation(Outcome::Fail(detail)));
        }

        if let Some(worker) = state
            .clusters
            .get_mut(&key)
            .and_then(|stored| stored.cluster.properties.as_mut())
            .and_then(|props| props.compute_profile.as_mut())
            .and_then(|profile| {
                profile
                    .roles
                    .iter_mut()
                    .find(|role| role.name.as_deref() == Some(RoleName::Worker.provider_name()))
            })
        {
            worker.target_instance_count = Some(params.target_instance_count);
        }
        Ok(state.start_operation(Outcome::Succeed))
    }

    async fn delete(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Option<OperationHandle>, Error> {
        let mut state = self.state.lock();
        state.calls.push(ApiCall::Delete {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
        });

        let key = (resource_group.to_string(), name.to_string());
        if !state.clusters.contains_key(&key) {
            return Ok(None);
        }
        if let Some(detail) = state.fail_next.take() {
            return Ok(Some(state.start_operation(Outcome::Fail(detail))));
        }
        state.clusters.remove(&key);
        Ok(Some(state.start_operation(Outcome::Succeed)))
    }

    async fn get_configuration(
        &self,
        resource_group: &str,
        name: &str,
        configuration: &str,
    ) -> Result<ConfigurationValues, Error> {
        let mut state = self.state.lock();
        state.calls.push(ApiCall::GetConfiguration {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
            configuration: configuration.to_string(),
        });
        let stored = state
            .clusters
            .get(&(resource_group.to_string(), name.to_string()))
            .ok_or_else(|| Self::not_found(resource_group, name))?;
        Ok(stored
            .configurations
            .get(configuration)
            .cloned()
            .unwrap_or_default())
    }

    async fn operation_status(&self, handle: &OperationHandle) -> Result<OperationStatus, Error> {
        let mut state = self.state.lock();
        state.calls.push(ApiCall::OperationStatus);

        let status_url = match handle {
            OperationHandle::Completed => return Ok(OperationStatus::Succeeded),
            OperationHandle::Pending { status_url, .. } => status_url,
        };

        let operation = state
            .operations
            .get_mut(status_url)
            .ok_or_else(|| Error::provider_status(404, format!("unknown operation {status_url}")))?;

        if operation.remaining_checks > 0 {
            operation.remaining_checks -= 1;
            return Ok(OperationStatus::InProgress { retry_after: None });
        }

        match state.operations.remove(status_url) {
            Some(PendingOperation {
                outcome: Outcome::Fail(detail),
                ..
            }) => Ok(OperationStatus::Failed(detail)),
            _ => Ok(OperationStatus::Succeeded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClusterCreateProperties, ComputeProfile, HardwareProfile};

    fn params() -> ClusterCreateParameters {
        ClusterCreateParameters {
            location: "westeurope".to_string(),
            tags: BTreeMap::from([("env".to_string(), "test".to_string())]),
            properties: ClusterCreateProperties {
                cluster_version: "3.6".to_string(),
                os_type: "Linux".to_string(),
                tier: "Standard".to_string(),
                cluster_definition: ClusterDefinition {
                    kind: Some("Storm".to_string()),
                    component_version: BTreeMap::from([("Storm".to_string(), "1.1".to_string())]),
                    configurations: Some(serde_json::json!({
                        "gateway": {
                            "restAuthCredential.isEnabled": true,
                            "restAuthCredential.username": "admin"
                        }
                    })),
                },
                compute_profile: ComputeProfile {
                    roles: vec![Role {
                        name: Some("headnode".to_string()),
                        target_instance_count: Some(2),
                        hardware_profile: Some(HardwareProfile {
                            vm_size: Some("Standard_A3".to_string()),
                        }),
                        ..Default::default()
                    }],
                },
                storage_profile: Default::default(),
            },
        }
    }

    #[tokio::test]
    async fn create_then_poll_stores_cluster() {
        let api = InMemoryClusterApi::default().with_in_progress_checks(1);
        let handle = api.create("rg", "c1", &params()).await.expect("create accepted");

        assert_eq!(
            api.operation_status(&handle).await.expect("status"),
            OperationStatus::InProgress { retry_after: None }
        );
        assert_eq!(
            api.operation_status(&handle).await.expect("status"),
            OperationStatus::Succeeded
        );

        let cluster = api.get("rg", "c1").await.expect("get").expect("exists");
        assert!(cluster.id.as_deref().unwrap_or_default().ends_with("/clusters/c1"));
        let gateway = api
            .get_configuration("rg", "c1", "gateway")
            .await
            .expect("configuration");
        assert_eq!(gateway["restAuthCredential.isEnabled"], "true");
        assert_eq!(gateway["restAuthCredential.username"], "admin");
    }

    #[tokio::test]
    async fn reads_report_abbreviated_sizes() {
        let api = InMemoryClusterApi::default().report_vm_size_as("Standard_A3", "large");
        api.create("rg", "c1", &params()).await.expect("create accepted");
        let cluster = api.cluster("rg", "c1").expect("exists");
        let head = cluster
            .properties
            .and_then(|p| p.compute_profile)
            .and_then(|p| p.find_role("headnode").cloned())
            .expect("head role");
        assert_eq!(
            head.hardware_profile.and_then(|h| h.vm_size).as_deref(),
            Some("large")
        );
    }

    #[tokio::test]
    async fn failed_operation_leaves_nothing_behind() {
        let api = InMemoryClusterApi::default();
        api.fail_next_operation("QuotaExceeded: no cores left");
        let handle = api.create("rg", "c1", &params()).await.expect("create accepted");
        assert_eq!(
            api.operation_status(&handle).await.expect("status"),
            OperationStatus::Failed("QuotaExceeded: no cores left".to_string())
        );
        assert!(api.cluster("rg", "c1").is_none());
    }

    #[tokio::test]
    async fn delete_of_missing_cluster_is_none() {
        let api = InMemoryClusterApi::default();
        assert!(api.delete("rg", "ghost").await.expect("delete").is_none());
        assert_eq!(
            api.calls(),
            vec![ApiCall::Delete {
                resource_group: "rg".to_string(),
                name: "ghost".to_string()
            }]
        );
    }
}
