//! HDInsight cluster reconciliation
//!
//! Maps declarative cluster documents onto the provider's model and drives
//! clusters through create, read, update and delete.

#![deny(missing_docs)]

pub mod lookup;
pub mod payload;
pub mod policy;
pub mod reconciler;
pub mod roles;

pub use lookup::lookup_cluster;
pub use policy::{check_change_set, FieldPolicy};
pub use reconciler::{ClusterPhase, ClusterReconciler, ReconcilerConfig};
pub use roles::{expand_roles, flatten_roles};
