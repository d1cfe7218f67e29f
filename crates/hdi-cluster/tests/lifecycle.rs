//! Lifecycle tests for the cluster reconciler against the in-memory provider
//!
//! Each test walks a cluster through create, read, update and delete the way
//! a declarative engine would, checking both the state reported back and the
//! calls the provider saw.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use hdi_cluster::{ClusterReconciler, ReconcilerConfig};
use hdi_common::{
    ChangeSet, ClusterField, ClusterId, ClusterKind, ClusterSpec, Error, GatewaySpec,
    NodeGroupSpec, RolesSpec, StorageAccountSpec, Tier,
};
use hdi_provider::memory::{ApiCall, InMemoryClusterApi};
use hdi_provider::{CallContext, PollConfig};

// ============================================================================
// Fixtures
// ============================================================================

fn group(vm_size: &str, count: Option<u32>) -> NodeGroupSpec {
    NodeGroupSpec {
        vm_size: vm_size.to_string(),
        username: "sshuser".to_string(),
        password: Some("Passw0rd!".to_string()),
        ssh_keys: vec!["ssh-rsa AAAAB3NzaC1yc2E test@example".to_string()],
        target_instance_count: count,
        ..Default::default()
    }
}

fn spec(name: &str, component: &str) -> ClusterSpec {
    ClusterSpec {
        name: name.to_string(),
        resource_group: "rg-analytics".to_string(),
        location: "West Europe".to_string(),
        cluster_version: "3.6".to_string(),
        tier: Tier::Standard,
        component_version: BTreeMap::from([(component.to_string(), "1.1".to_string())]),
        gateway: GatewaySpec {
            enabled: true,
            username: "admin".to_string(),
            password: "Gw-Passw0rd!".to_string(),
        },
        storage_accounts: vec![StorageAccountSpec {
            storage_container_id: "https://acct.blob.core.windows.net/data".to_string(),
            storage_account_key: "a2V5".to_string(),
            is_default: true,
        }],
        roles: RolesSpec {
            head_node: Some(group("Standard_A3", None)),
            worker_node: Some(group("Standard_D4_v2", Some(3))),
            zookeeper_node: Some(group("Standard_A4_V2", None)),
        },
        tags: BTreeMap::from([("env".to_string(), "test".to_string())]),
    }
}

fn storm_spec() -> ClusterSpec {
    spec("storm-1", "Storm")
}

fn config(require_import: bool) -> ReconcilerConfig {
    ReconcilerConfig {
        require_import,
        poll: PollConfig::fixed(Duration::from_secs(5)),
        timeout: None,
    }
}

fn reconciler(api: &Arc<InMemoryClusterApi>, kind: ClusterKind) -> ClusterReconciler {
    ClusterReconciler::new(api.clone(), kind, config(true))
}

fn ctx() -> CallContext {
    CallContext::background()
}

fn count_calls(api: &InMemoryClusterApi, matches: impl Fn(&ApiCall) -> bool) -> usize {
    api.calls().iter().filter(|call| matches(call)).count()
}

// ============================================================================
// Create and read
// ============================================================================

/// Story: A created cluster reads back as the document that created it
#[tokio::test(start_paused = true)]
async fn create_then_read_round_trips_the_document() {
    let api = Arc::new(
        InMemoryClusterApi::new("sub")
            .with_in_progress_checks(2)
            .report_vm_size_as("Standard_A3", "large"),
    );
    let reconciler = reconciler(&api, ClusterKind::Storm);
    let spec = storm_spec();

    let (id, created) = reconciler
        .create(&spec, &ctx())
        .await
        .expect("create should succeed");
    assert_eq!(
        id,
        "/subscriptions/sub/resourceGroups/rg-analytics/providers/Microsoft.HDInsight/clusters/storm-1"
    );
    assert_eq!(created.roles, spec.roles);

    let observed = reconciler
        .read(&id, Some(&spec.roles), &ctx())
        .await
        .expect("read should succeed")
        .expect("cluster exists");
    assert_eq!(observed.id, id);
    assert_eq!(observed.name, "storm-1");
    assert_eq!(observed.resource_group, "rg-analytics");
    assert_eq!(observed.location.as_deref(), Some("westeurope"));
    assert_eq!(observed.kind.as_deref(), Some("Storm"));
    assert_eq!(observed.tier, Some(Tier::Standard));
    assert_eq!(observed.cluster_version.as_deref(), Some("3.6"));
    assert_eq!(observed.component_version, spec.component_version);
    assert_eq!(observed.gateway.as_ref(), Some(&spec.gateway));
    assert_eq!(observed.roles, spec.roles);
    assert_eq!(observed.tags, spec.tags);
    assert_eq!(observed.https_endpoint.as_deref(), Some("storm-1.azurehdinsight.net"));
    assert_eq!(observed.ssh_endpoint.as_deref(), Some("storm-1-ssh.azurehdinsight.net"));
}

/// Story: Kafka workers carry their data disks through create and read
#[tokio::test(start_paused = true)]
async fn kafka_disks_round_trip() {
    let api = Arc::new(InMemoryClusterApi::new("sub"));
    let reconciler = reconciler(&api, ClusterKind::Kafka);
    let mut spec = spec("kafka-1", "Kafka");
    if let Some(worker) = spec.roles.worker_node.as_mut() {
        worker.number_of_disks_per_node = Some(4);
    }

    let (_, observed) = reconciler
        .create(&spec, &ctx())
        .await
        .expect("create should succeed");
    assert_eq!(
        observed.roles.worker_node.and_then(|w| w.number_of_disks_per_node),
        Some(4)
    );
}

/// Story: Creating the same cluster twice fails with the first cluster's id
#[tokio::test(start_paused = true)]
async fn second_create_is_an_import_collision() {
    let api = Arc::new(InMemoryClusterApi::new("sub"));
    let reconciler = reconciler(&api, ClusterKind::Storm);

    let (first_id, _) = reconciler
        .create(&storm_spec(), &ctx())
        .await
        .expect("first create should succeed");
    api.clear_calls();

    let err = reconciler
        .create(&storm_spec(), &ctx())
        .await
        .expect_err("second create must collide");
    match err {
        Error::AlreadyExists { id, .. } => assert_eq!(id, first_id),
        other => panic!("expected already exists, got {other:?}"),
    }
    assert_eq!(count_calls(&api, |c| matches!(c, ApiCall::Create { .. })), 0);
}

#[tokio::test(start_paused = true)]
async fn without_import_protection_the_provider_decides() {
    let api = Arc::new(InMemoryClusterApi::new("sub"));
    let reconciler = ClusterReconciler::new(api.clone(), ClusterKind::Storm, config(false));

    reconciler
        .create(&storm_spec(), &ctx())
        .await
        .expect("first create should succeed");
    let err = reconciler
        .create(&storm_spec(), &ctx())
        .await
        .expect_err("provider rejects the duplicate");
    assert!(matches!(err, Error::Provider { status: Some(409), .. }), "{err:?}");
}

/// Story: A failed deployment surfaces the provider's detail and leaves nothing behind
#[tokio::test(start_paused = true)]
async fn failed_create_reports_provider_detail() {
    let api = Arc::new(InMemoryClusterApi::new("sub").with_in_progress_checks(1));
    api.fail_next_operation("QuotaExceeded: not enough cores in westeurope");
    let reconciler = reconciler(&api, ClusterKind::Storm);

    let err = reconciler
        .create(&storm_spec(), &ctx())
        .await
        .expect_err("create should fail");
    assert!(!err.is_retryable(), "{err:?}");
    match err {
        Error::Provider {
            operation,
            kind,
            cluster,
            resource_group,
            message,
            ..
        } => {
            assert_eq!(operation, "creating");
            assert_eq!(kind, "storm");
            assert_eq!(cluster, "storm-1");
            assert_eq!(resource_group, "rg-analytics");
            assert_eq!(message, "QuotaExceeded: not enough cores in westeurope");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
    assert!(api.cluster("rg-analytics", "storm-1").is_none());
}

#[tokio::test(start_paused = true)]
async fn worker_count_bounds_are_enforced_on_create() {
    let api = Arc::new(InMemoryClusterApi::new("sub"));
    let reconciler = reconciler(&api, ClusterKind::Storm);

    for count in [0, 10000] {
        let mut spec = storm_spec();
        if let Some(worker) = spec.roles.worker_node.as_mut() {
            worker.target_instance_count = Some(count);
        }
        let err = reconciler
            .create(&spec, &ctx())
            .await
            .expect_err("count out of bounds");
        assert!(matches!(err, Error::Validation { .. }), "{count}: {err:?}");
    }
    assert!(api.calls().is_empty());
}

/// Story: A caller asking for five head nodes gets the fixed two
#[tokio::test(start_paused = true)]
async fn fixed_head_count_wins() {
    let api = Arc::new(InMemoryClusterApi::new("sub"));
    let reconciler = reconciler(&api, ClusterKind::Storm);
    let mut spec = storm_spec();
    if let Some(head) = spec.roles.head_node.as_mut() {
        head.target_instance_count = Some(5);
    }

    reconciler
        .create(&spec, &ctx())
        .await
        .expect("create should succeed");
    let head = api
        .cluster("rg-analytics", "storm-1")
        .and_then(|c| c.properties)
        .and_then(|p| p.compute_profile)
        .and_then(|p| p.find_role("headnode").cloned())
        .expect("head role stored");
    assert_eq!(head.target_instance_count, Some(2));
}

/// Story: A cluster removed outside the reconciler reads as absent
#[tokio::test(start_paused = true)]
async fn read_of_removed_cluster_is_none() {
    let api = Arc::new(InMemoryClusterApi::new("sub"));
    let reconciler = reconciler(&api, ClusterKind::Storm);
    let (id, _) = reconciler
        .create(&storm_spec(), &ctx())
        .await
        .expect("create should succeed");

    assert!(api.remove_cluster("rg-analytics", "storm-1"));
    let observed = reconciler
        .read(&id, None, &ctx())
        .await
        .expect("absence is not an error");
    assert!(observed.is_none());
}

// ============================================================================
// Update
// ============================================================================

async fn created(api: &Arc<InMemoryClusterApi>) -> (ClusterReconciler, String) {
    let reconciler = reconciler(api, ClusterKind::Storm);
    let (id, _) = reconciler
        .create(&storm_spec(), &ctx())
        .await
        .expect("create should succeed");
    api.clear_calls();
    (reconciler, id)
}

#[tokio::test(start_paused = true)]
async fn tags_change_patches_tags_only() {
    let api = Arc::new(InMemoryClusterApi::new("sub"));
    let (reconciler, id) = created(&api).await;

    let mut spec = storm_spec();
    spec.tags.insert("owner".to_string(), "data-team".to_string());
    let changes: ChangeSet = "tags".parse().expect("valid change set");

    let observed = reconciler
        .update(&id, &spec, &changes, &ctx())
        .await
        .expect("update should succeed");
    assert_eq!(observed.tags, spec.tags);
    assert_eq!(count_calls(&api, |c| matches!(c, ApiCall::UpdateTags { .. })), 1);
    assert_eq!(count_calls(&api, |c| matches!(c, ApiCall::Resize { .. })), 0);
}

#[tokio::test(start_paused = true)]
async fn roles_change_resizes_workers_only() {
    let api = Arc::new(InMemoryClusterApi::new("sub").with_in_progress_checks(3));
    let (reconciler, id) = created(&api).await;

    let mut spec = storm_spec();
    if let Some(worker) = spec.roles.worker_node.as_mut() {
        worker.target_instance_count = Some(5);
    }
    let changes: ChangeSet = [ClusterField::Roles].into_iter().collect();

    let observed = reconciler
        .update(&id, &spec, &changes, &ctx())
        .await
        .expect("resize should succeed");
    assert_eq!(
        observed.roles.worker_node.and_then(|w| w.target_instance_count),
        Some(5)
    );
    assert_eq!(count_calls(&api, |c| matches!(c, ApiCall::UpdateTags { .. })), 0);
    let resizes: Vec<_> = api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, ApiCall::Resize { .. }))
        .collect();
    assert_eq!(
        resizes,
        vec![ApiCall::Resize {
            resource_group: "rg-analytics".to_string(),
            name: "storm-1".to_string(),
            target_instance_count: 5,
        }]
    );
}

/// Story: A worker reported as "large" can be adopted and resized as read
#[tokio::test(start_paused = true)]
async fn observed_abbreviated_worker_size_resizes_cleanly() {
    let api = Arc::new(InMemoryClusterApi::new("sub").report_vm_size_as("Standard_A4_v2", "large"));
    let reconciler = reconciler(&api, ClusterKind::Storm);
    let mut spec = storm_spec();
    if let Some(worker) = spec.roles.worker_node.as_mut() {
        worker.vm_size = "Standard_A4_v2".to_string();
    }
    let (id, created) = reconciler
        .create(&spec, &ctx())
        .await
        .expect("create should succeed");
    assert_eq!(created.roles, spec.roles);

    let mut adopted = spec.clone();
    adopted.roles = created.roles.clone();
    if let Some(worker) = adopted.roles.worker_node.as_mut() {
        worker.target_instance_count = Some(4);
    }
    let changes: ChangeSet = [ClusterField::Roles].into_iter().collect();

    let observed = reconciler
        .update(&id, &adopted, &changes, &ctx())
        .await
        .expect("observed sizes should validate");
    let worker = observed.roles.worker_node.expect("worker present");
    assert_eq!(worker.vm_size, "Standard_A4_v2");
    assert_eq!(worker.target_instance_count, Some(4));
}

#[tokio::test(start_paused = true)]
async fn empty_change_set_only_reads() {
    let api = Arc::new(InMemoryClusterApi::new("sub"));
    let (reconciler, id) = created(&api).await;

    reconciler
        .update(&id, &storm_spec(), &ChangeSet::new(), &ctx())
        .await
        .expect("no-op update should succeed");
    assert_eq!(
        api.calls(),
        vec![
            ApiCall::Get {
                resource_group: "rg-analytics".to_string(),
                name: "storm-1".to_string(),
            },
            ApiCall::GetConfiguration {
                resource_group: "rg-analytics".to_string(),
                name: "storm-1".to_string(),
                configuration: "gateway".to_string(),
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn invalid_resize_is_rejected_before_any_call() {
    let api = Arc::new(InMemoryClusterApi::new("sub"));
    let (reconciler, id) = created(&api).await;

    let mut spec = storm_spec();
    if let Some(worker) = spec.roles.worker_node.as_mut() {
        worker.target_instance_count = Some(0);
    }
    let changes: ChangeSet = "tags,roles".parse().expect("valid change set");

    let err = reconciler
        .update(&id, &spec, &changes, &ctx())
        .await
        .expect_err("zero workers is invalid");
    assert!(matches!(err, Error::Validation { .. }));
    assert!(api.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn immutable_field_change_is_rejected() {
    let api = Arc::new(InMemoryClusterApi::new("sub"));
    let (reconciler, id) = created(&api).await;

    let changes: ChangeSet = [ClusterField::Location].into_iter().collect();
    let err = reconciler
        .update(&id, &storm_spec(), &changes, &ctx())
        .await
        .expect_err("location is fixed");
    match err {
        Error::Validation { field, cluster, .. } => {
            assert_eq!(field.as_deref(), Some("location"));
            assert_eq!(cluster, "storm-1");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(api.calls().is_empty());
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test(start_paused = true)]
async fn delete_removes_the_cluster_and_is_idempotent() {
    let api = Arc::new(InMemoryClusterApi::new("sub").with_in_progress_checks(2));
    let (reconciler, id) = created(&api).await;

    reconciler
        .delete(&id, &ctx())
        .await
        .expect("delete should succeed");
    assert!(api.cluster("rg-analytics", "storm-1").is_none());

    reconciler
        .delete(&id, &ctx())
        .await
        .expect("deleting a missing cluster succeeds");
    assert!(reconciler
        .read(&id, None, &ctx())
        .await
        .expect("read should succeed")
        .is_none());
}

#[tokio::test(start_paused = true)]
async fn deadline_bounds_a_slow_deletion() {
    let api = Arc::new(InMemoryClusterApi::new("sub").with_in_progress_checks(1000));
    let reconciler = ClusterReconciler::new(
        api.clone(),
        ClusterKind::Storm,
        ReconcilerConfig {
            timeout: Some(Duration::from_secs(60)),
            ..config(true)
        },
    );
    let id = ClusterId::new("rg-analytics", "storm-1").to_resource_id("sub");
    api.insert_cluster("rg-analytics", "storm-1", Default::default());

    let err = reconciler
        .delete(&id, &ctx())
        .await
        .expect_err("deletion outlives the deadline");
    assert!(matches!(err, Error::DeadlineExceeded { .. }), "{err:?}");
}

// ============================================================================
// Identifiers
// ============================================================================

#[test]
fn identifier_names_the_trailing_cluster_segment() {
    let id = ClusterId::parse(
        "/subscriptions/sub/resourceGroups/rg-analytics/providers/Microsoft.HDInsight/clusters/storm-1",
    )
    .expect("well formed id");
    assert_eq!(id.resource_group, "rg-analytics");
    assert_eq!(id.name, "storm-1");

    let err = ClusterId::parse("/subscriptions/sub/providers/Microsoft.HDInsight/clusters/storm-1")
        .expect_err("missing resource group");
    assert!(matches!(err, Error::Parse { .. }));
}
