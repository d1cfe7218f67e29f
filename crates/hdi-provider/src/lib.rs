//! HDInsight management API access
//!
//! The [`ClusterApi`] trait is the seam between reconciliation logic and the
//! provider. [`HttpClusterApi`] talks to the management endpoint; the
//! in-memory provider behind the `test-util` feature backs lifecycle tests.

#![deny(missing_docs)]

pub mod client;
pub mod context;
pub mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod model;
pub mod poller;

pub use client::{ClusterApi, OperationHandle, OperationStatus};
pub use context::CallContext;
pub use http::{HttpClientConfig, HttpClusterApi};
pub use poller::{await_completion, PollConfig};

#[cfg(test)]
pub use client::MockClusterApi;

/// URL type used for storage container ids
pub use reqwest::Url;
