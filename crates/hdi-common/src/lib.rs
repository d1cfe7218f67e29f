//! Common types for the HDInsight cluster reconciler: documents, the kind
//! registry, resource identifiers, errors and telemetry

#![deny(missing_docs)]

pub mod error;
pub mod kind;
pub mod metrics;
pub mod resource_id;
pub mod telemetry;
pub mod types;

pub use error::{Error, Result};
pub use kind::{ClusterKind, KindDefinition, NodeGroupDefinition, RoleName};
pub use resource_id::{ClusterId, ResourceId};
pub use types::{
    ChangeSet, ClusterField, ClusterSpec, ClusterSummary, GatewaySpec, NodeGroupSpec,
    ObservedCluster, RolesSpec, StorageAccountSpec, Tier,
};

/// Name of the provider configuration holding gateway credentials
pub const GATEWAY_CONFIGURATION: &str = "gateway";
