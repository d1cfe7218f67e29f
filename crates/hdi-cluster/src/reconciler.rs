//! Cluster lifecycle reconciliation
//!
//! A [`ClusterReconciler`] is bound to one cluster kind and drives clusters of
//! that kind through their lifecycle:
//!
//! ```text
//! Absent -> Creating -> Present -> Updating -> Present
//!                               -> Deleting -> Absent
//! ```
//!
//! Each call is one sequential flow. Every provider call and every poll wait
//! runs under the caller's [`CallContext`], so cancellation and deadlines
//! bound the whole operation. The reconciler keeps no state between calls.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use hdi_common::metrics::{Operation, OperationTimer};
use hdi_common::{
    ChangeSet, ClusterField, ClusterId, ClusterKind, ClusterSpec, Error, KindDefinition,
    ObservedCluster, Result, RoleName, RolesSpec, GATEWAY_CONFIGURATION,
};
use hdi_provider::model::{ClusterPatchParameters, ClusterResizeParameters};
use hdi_provider::{await_completion, CallContext, ClusterApi, PollConfig};

use crate::payload::{build_create_parameters, observed_cluster};
use crate::policy::check_change_set;
use crate::roles::expand_roles;

/// Lifecycle phase of a cluster, as seen by the reconciler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterPhase {
    /// No cluster exists
    Absent,
    /// Creation submitted, waiting for the provider
    Creating,
    /// The cluster exists and is settled
    Present,
    /// Tag or worker changes are being applied
    Updating,
    /// Deletion submitted, waiting for the provider
    Deleting,
}

impl fmt::Display for ClusterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "Absent"),
            Self::Creating => write!(f, "Creating"),
            Self::Present => write!(f, "Present"),
            Self::Updating => write!(f, "Updating"),
            Self::Deleting => write!(f, "Deleting"),
        }
    }
}

/// Settings for a reconciler
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Refuse to create over a cluster that already exists
    pub require_import: bool,
    /// Pacing for long-running operations
    pub poll: PollConfig,
    /// Upper bound on a single reconciliation call, on top of the caller's deadline
    pub timeout: Option<Duration>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            require_import: true,
            poll: PollConfig::default(),
            timeout: None,
        }
    }
}

/// Create, read, update and delete clusters of one kind
pub struct ClusterReconciler {
    api: Arc<dyn ClusterApi>,
    definition: &'static KindDefinition,
    config: ReconcilerConfig,
}

impl ClusterReconciler {
    /// Reconciler for `kind` clusters talking to `api`
    pub fn new(api: Arc<dyn ClusterApi>, kind: ClusterKind, config: ReconcilerConfig) -> Self {
        Self {
            api,
            definition: kind.definition(),
            config,
        }
    }

    /// The kind this reconciler manages
    pub fn kind(&self) -> ClusterKind {
        self.definition.kind
    }

    /// Settings in use
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    fn resource_type(&self) -> String {
        format!("{} cluster", self.kind())
    }

    fn bounded(&self, ctx: &CallContext) -> CallContext {
        match self.config.timeout {
            Some(timeout) => ctx.clone().with_timeout(timeout),
            None => ctx.clone(),
        }
    }

    fn with_context(&self, err: Error, operation: Operation, id: &ClusterId) -> Error {
        err.with_provider_context(
            operation.verb(),
            self.kind().as_str(),
            &id.name,
            &id.resource_group,
        )
    }

    /// Create a cluster and wait until the provider reports it done
    ///
    /// Returns the provider's identifier and the cluster as read back after
    /// creation. With import protection on, an existing cluster of the same
    /// name fails with [`Error::AlreadyExists`] carrying its identifier.
    #[instrument(
        skip(self, spec, ctx),
        fields(kind = %self.kind(), cluster = %spec.name, resource_group = %spec.resource_group)
    )]
    pub async fn create(
        &self,
        spec: &ClusterSpec,
        ctx: &CallContext,
    ) -> Result<(String, ObservedCluster)> {
        let timer = OperationTimer::start(Operation::Create, self.kind().as_str());
        let id = ClusterId::new(&spec.resource_group, &spec.name);
        let result = self
            .create_cluster(spec, &id, &self.bounded(ctx))
            .await
            .map_err(|e| self.with_context(e, Operation::Create, &id));
        timer.finish(&result);
        result
    }

    async fn create_cluster(
        &self,
        spec: &ClusterSpec,
        id: &ClusterId,
        ctx: &CallContext,
    ) -> Result<(String, ObservedCluster)> {
        let params = build_create_parameters(spec, self.definition)?;

        if self.config.require_import {
            let existing = ctx
                .run(
                    "checking for an existing cluster",
                    self.api.get(&id.resource_group, &id.name),
                )
                .await?;
            if let Some(existing_id) = existing.and_then(|c| c.id).filter(|id| !id.is_empty()) {
                warn!(id = %existing_id, "cluster already exists and must be imported");
                return Err(Error::already_exists(self.resource_type(), existing_id));
            }
        }

        info!(phase = %ClusterPhase::Creating, "submitting cluster creation");
        let handle = ctx
            .run(
                "submitting cluster creation",
                self.api.create(&id.resource_group, &id.name, &params),
            )
            .await?;
        await_completion(self.api.as_ref(), &handle, &self.config.poll, ctx).await?;

        let observed = self
            .observe(id, Some(&spec.roles), ctx)
            .await?
            .ok_or_else(|| Error::not_found(self.resource_type(), id.to_string()))?;
        if observed.id.is_empty() {
            return Err(Error::provider("the provider returned no id for the new cluster"));
        }

        info!(phase = %ClusterPhase::Present, id = %observed.id, "cluster created");
        Ok((observed.id.clone(), observed))
    }

    /// Read a cluster by identifier
    ///
    /// `None` means the cluster no longer exists. `existing_roles` is the
    /// caller's last known roles document; it supplies credentials the
    /// provider never returns.
    #[instrument(skip(self, existing_roles, ctx), fields(kind = %self.kind()))]
    pub async fn read(
        &self,
        id: &str,
        existing_roles: Option<&RolesSpec>,
        ctx: &CallContext,
    ) -> Result<Option<ObservedCluster>> {
        let timer = OperationTimer::start(Operation::Read, self.kind().as_str());
        let result = match ClusterId::parse(id) {
            Ok(cluster_id) => self
                .observe(&cluster_id, existing_roles, &self.bounded(ctx))
                .await
                .map_err(|e| self.with_context(e, Operation::Read, &cluster_id)),
            Err(e) => Err(e),
        };
        timer.finish(&result);
        result
    }

    async fn observe(
        &self,
        id: &ClusterId,
        existing_roles: Option<&RolesSpec>,
        ctx: &CallContext,
    ) -> Result<Option<ObservedCluster>> {
        let Some(cluster) = ctx
            .run("reading cluster", self.api.get(&id.resource_group, &id.name))
            .await?
        else {
            debug!(cluster = %id.name, resource_group = %id.resource_group, "cluster not found");
            return Ok(None);
        };

        let gateway = ctx
            .run(
                "reading gateway configuration",
                self.api
                    .get_configuration(&id.resource_group, &id.name, GATEWAY_CONFIGURATION),
            )
            .await?;

        Ok(Some(observed_cluster(
            &id.resource_group,
            &id.name,
            &cluster,
            &gateway,
            existing_roles,
            self.definition,
        )))
    }

    /// Apply the changed fields of `spec` to an existing cluster
    ///
    /// Tags are patched, a roles change resizes the worker group and waits for
    /// it. Changes to any other field are rejected before anything is sent.
    /// The cluster is always read back afterwards.
    #[instrument(skip(self, spec, ctx), fields(kind = %self.kind(), changes = %changes))]
    pub async fn update(
        &self,
        id: &str,
        spec: &ClusterSpec,
        changes: &ChangeSet,
        ctx: &CallContext,
    ) -> Result<ObservedCluster> {
        let timer = OperationTimer::start(Operation::Update, self.kind().as_str());
        let result = match ClusterId::parse(id) {
            Ok(cluster_id) => self
                .update_cluster(&cluster_id, spec, changes, &self.bounded(ctx))
                .await
                .map_err(|e| self.with_context(e, Operation::Update, &cluster_id)),
            Err(e) => Err(e),
        };
        timer.finish(&result);
        result
    }

    async fn update_cluster(
        &self,
        id: &ClusterId,
        spec: &ClusterSpec,
        changes: &ChangeSet,
        ctx: &CallContext,
    ) -> Result<ObservedCluster> {
        check_change_set(changes)?;

        let worker_count = if changes.contains(ClusterField::Roles) {
            let roles = expand_roles(&spec.roles, self.definition)?;
            let count = roles
                .iter()
                .find(|role| role.name.as_deref() == Some(RoleName::Worker.provider_name()))
                .and_then(|role| role.target_instance_count)
                .ok_or_else(|| {
                    Error::validation_field("roles.workerNode", "worker node count is missing")
                })?;
            Some(count)
        } else {
            None
        };

        if changes.contains(ClusterField::Tags) {
            info!(phase = %ClusterPhase::Updating, tags = spec.tags.len(), "updating tags");
            let params = ClusterPatchParameters {
                tags: spec.tags.clone(),
            };
            ctx.run(
                "updating tags",
                self.api.update_tags(&id.resource_group, &id.name, &params),
            )
            .await?;
        }

        if let Some(target_instance_count) = worker_count {
            info!(
                phase = %ClusterPhase::Updating,
                target_instance_count,
                "resizing worker nodes"
            );
            let params = ClusterResizeParameters {
                target_instance_count,
            };
            let handle = ctx
                .run(
                    "resizing worker nodes",
                    self.api.resize(&id.resource_group, &id.name, &params),
                )
                .await?;
            await_completion(self.api.as_ref(), &handle, &self.config.poll, ctx).await?;
        }

        if changes.is_empty() {
            debug!("no changes to apply");
        }

        let observed = self
            .observe(id, Some(&spec.roles), ctx)
            .await?
            .ok_or_else(|| Error::not_found(self.resource_type(), id.to_string()))?;
        info!(phase = %ClusterPhase::Present, "cluster updated");
        Ok(observed)
    }

    /// Delete a cluster and wait until it is gone
    ///
    /// A cluster that is already gone counts as deleted.
    #[instrument(skip(self, ctx), fields(kind = %self.kind()))]
    pub async fn delete(&self, id: &str, ctx: &CallContext) -> Result<()> {
        let timer = OperationTimer::start(Operation::Delete, self.kind().as_str());
        let result = match ClusterId::parse(id) {
            Ok(cluster_id) => self
                .delete_cluster(&cluster_id, &self.bounded(ctx))
                .await
                .map_err(|e| self.with_context(e, Operation::Delete, &cluster_id)),
            Err(e) => Err(e),
        };
        timer.finish(&result);
        result
    }

    async fn delete_cluster(&self, id: &ClusterId, ctx: &CallContext) -> Result<()> {
        info!(phase = %ClusterPhase::Deleting, cluster = %id.name, "submitting cluster deletion");
        let handle = ctx
            .run(
                "submitting cluster deletion",
                self.api.delete(&id.resource_group, &id.name),
            )
            .await?;

        match handle {
            Some(handle) => {
                await_completion(self.api.as_ref(), &handle, &self.config.poll, ctx).await?;
                info!(phase = %ClusterPhase::Absent, cluster = %id.name, "cluster deleted");
            }
            None => debug!(cluster = %id.name, "cluster already gone"),
        }
        Ok(())
    }
}
