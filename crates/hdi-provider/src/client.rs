//! Provider client seam
//!
//! Provides a trait-based abstraction for HDInsight management calls, allowing
//! tests to substitute a mock or the in-memory provider while production code
//! talks HTTP.

use std::time::Duration;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::model::{
    Cluster, ClusterCreateParameters, ClusterPatchParameters, ClusterResizeParameters,
    ConfigurationValues,
};
use hdi_common::Error;

/// Handle to a mutating call, pollable to a terminal status
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationHandle {
    /// The provider finished the work before answering
    Completed,
    /// The provider accepted the work and reports progress at `status_url`
    Pending {
        /// URL to poll for the operation status
        status_url: String,
        /// Provider-suggested wait before the first poll
        retry_after: Option<Duration>,
    },
}

impl OperationHandle {
    /// Handle for an operation that still has to be polled
    pub fn pending(status_url: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::Pending {
            status_url: status_url.into(),
            retry_after,
        }
    }
}

/// Status of a long-running operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationStatus {
    /// Still running
    InProgress {
        /// Provider-suggested wait before the next poll
        retry_after: Option<Duration>,
    },
    /// Finished successfully
    Succeeded,
    /// Finished with a failure; the detail is the provider's, verbatim
    Failed(String),
}

/// Trait abstracting HDInsight cluster management calls
///
/// Every method maps a not-found answer to a benign value where the caller
/// treats absence as a state rather than a failure: `get` returns `None` and
/// `delete` returns `None` when there was nothing to delete.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Submit a cluster creation
    async fn create(
        &self,
        resource_group: &str,
        name: &str,
        params: &ClusterCreateParameters,
    ) -> Result<OperationHandle, Error>;

    /// Fetch a cluster, `None` if it does not exist
    async fn get(&self, resource_group: &str, name: &str) -> Result<Option<Cluster>, Error>;

    /// Replace the cluster's tags; completes synchronously
    async fn update_tags(
        &self,
        resource_group: &str,
        name: &str,
        params: &ClusterPatchParameters,
    ) -> Result<(), Error>;

    /// Change the worker node count
    async fn resize(
        &self,
        resource_group: &str,
        name: &str,
        params: &ClusterResizeParameters,
    ) -> Result<OperationHandle, Error>;

    /// Submit a deletion, `None` if the cluster was already gone
    async fn delete(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Option<OperationHandle>, Error>;

    /// Fetch a named configuration such as "gateway"
    async fn get_configuration(
        &self,
        resource_group: &str,
        name: &str,
        configuration: &str,
    ) -> Result<ConfigurationValues, Error>;

    /// Check the status of a pending operation
    async fn operation_status(&self, handle: &OperationHandle) -> Result<OperationStatus, Error>;
}
