//! Desired and observed cluster documents

mod changes;
mod cluster;
mod observed;
mod roles;

pub use changes::{ChangeSet, ClusterField};
pub use cluster::{ClusterSpec, GatewaySpec, StorageAccountSpec, Tier};
pub use observed::{ClusterSummary, ObservedCluster};
pub use roles::{NodeGroupSpec, RolesSpec};
