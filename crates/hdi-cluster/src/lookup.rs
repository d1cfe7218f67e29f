//! Read-only lookup of an existing cluster by name

use tracing::{debug, instrument};

use hdi_common::metrics::{Operation, OperationTimer};
use hdi_common::{ClusterSummary, Result};
use hdi_provider::{CallContext, ClusterApi};

use crate::payload::cluster_summary;

/// Kind label used for lookups, which work across every kind
const ANY_KIND: &str = "hdinsight";

/// Look a cluster up by resource group and name
///
/// Returns `None` when no such cluster exists. No credentials are read.
#[instrument(skip(api, ctx))]
pub async fn lookup_cluster(
    api: &dyn ClusterApi,
    resource_group: &str,
    name: &str,
    ctx: &CallContext,
) -> Result<Option<ClusterSummary>> {
    let timer = OperationTimer::start(Operation::Lookup, ANY_KIND);
    let result = ctx
        .run("looking up cluster", api.get(resource_group, name))
        .await
        .map(|cluster| {
            cluster.map(|cluster| cluster_summary(resource_group, name, &cluster))
        })
        .map_err(|e| {
            e.with_provider_context(Operation::Lookup.verb(), ANY_KIND, name, resource_group)
        });
    if matches!(result, Ok(None)) {
        debug!("cluster not found");
    }
    timer.finish(&result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use hdi_common::Tier;
    use hdi_provider::memory::{ApiCall, InMemoryClusterApi};
    use hdi_provider::model::{Cluster, ClusterDefinition, ClusterProperties, ConnectivityEndpoint};

    fn spark_cluster() -> Cluster {
        Cluster {
            location: Some("East US 2".to_string()),
            tags: BTreeMap::from([("team".to_string(), "data".to_string())]),
            properties: Some(ClusterProperties {
                cluster_version: Some("3.6.1000.67".to_string()),
                tier: Some("standard".to_string()),
                cluster_definition: Some(ClusterDefinition {
                    kind: Some("Spark".to_string()),
                    component_version: BTreeMap::from([("Spark".to_string(), "2.3".to_string())]),
                    configurations: None,
                }),
                connectivity_endpoints: vec![
                    ConnectivityEndpoint {
                        name: Some("HTTPS".to_string()),
                        location: Some("spark-1.azurehdinsight.net".to_string()),
                        ..Default::default()
                    },
                    ConnectivityEndpoint {
                        name: Some("SSH".to_string()),
                        location: Some("spark-1-ssh.azurehdinsight.net".to_string()),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Story: Looking up a cluster created elsewhere reports its kind and endpoints
    #[tokio::test]
    async fn lookup_reports_summary() {
        let api = InMemoryClusterApi::default();
        api.insert_cluster("rg", "spark-1", spark_cluster());

        let summary = lookup_cluster(&api, "rg", "spark-1", &CallContext::background())
            .await
            .expect("lookup should succeed")
            .expect("cluster exists");
        assert_eq!(summary.kind.as_deref(), Some("Spark"));
        assert_eq!(summary.tier, Some(Tier::Standard));
        assert_eq!(summary.location.as_deref(), Some("eastus2"));
        assert_eq!(summary.component_version["Spark"], "2.3");
        assert_eq!(
            summary.https_endpoint.as_deref(),
            Some("spark-1.azurehdinsight.net")
        );
        assert_eq!(
            summary.ssh_endpoint.as_deref(),
            Some("spark-1-ssh.azurehdinsight.net")
        );
        assert!(summary.id.ends_with("/clusters/spark-1"));
    }

    #[tokio::test]
    async fn lookup_of_missing_cluster_is_none() {
        let api = InMemoryClusterApi::default();
        let summary = lookup_cluster(&api, "rg", "ghost", &CallContext::background())
            .await
            .expect("missing cluster is not an error");
        assert!(summary.is_none());
    }

    #[tokio::test]
    async fn lookup_reads_no_configuration() {
        let api = InMemoryClusterApi::default();
        api.insert_cluster("rg", "spark-1", spark_cluster());
        lookup_cluster(&api, "rg", "spark-1", &CallContext::background())
            .await
            .expect("lookup should succeed");
        assert_eq!(
            api.calls(),
            vec![ApiCall::Get {
                resource_group: "rg".to_string(),
                name: "spark-1".to_string(),
            }]
        );
    }
}
