//! Parsing of provider resource identifiers
//!
//! Identifiers are slash-separated key/value paths:
//!
//! ```text
//! /subscriptions/{sub}/resourceGroups/{group}/providers/Microsoft.HDInsight/clusters/{name}
//! ```
//!
//! Parsing is all-or-nothing. A malformed identifier is a [`Error::Parse`],
//! never a partially populated value.

use std::fmt;

use crate::error::{Error, Result};

/// Provider namespace for HDInsight clusters
pub const HDINSIGHT_NAMESPACE: &str = "Microsoft.HDInsight";

/// Path key under which clusters are addressed
pub const CLUSTERS_KEY: &str = "clusters";

/// A parsed resource identifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceId {
    /// Subscription the resource lives in
    pub subscription_id: String,
    /// Resource group segment
    pub resource_group: String,
    /// Provider namespace (the value after `providers`), if present
    pub provider: Option<String>,
    /// Remaining key/value segments in path order
    pub path: Vec<(String, String)>,
}

impl ResourceId {
    /// Parse an identifier into its components
    pub fn parse(id: &str) -> Result<Self> {
        let trimmed = id.trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::parse(id, "identifier is empty"));
        }

        let components: Vec<&str> = trimmed.split('/').collect();
        if components.len() % 2 != 0 {
            return Err(Error::parse(
                id,
                "the number of path segments is not divisible by 2",
            ));
        }

        let mut subscription_id = None;
        let mut resource_group = None;
        let mut provider = None;
        let mut path = Vec::with_capacity(components.len() / 2);

        for pair in components.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            if key.is_empty() || value.is_empty() {
                return Err(Error::parse(
                    id,
                    format!("key/value cannot be empty strings (key {key:?}, value {value:?})"),
                ));
            }

            match key {
                "subscriptions" if subscription_id.is_none() => {
                    subscription_id = Some(value.to_string())
                }
                // Some APIs hand back the group key lower-cased.
                "resourceGroups" | "resourcegroups" if resource_group.is_none() => {
                    resource_group = Some(value.to_string())
                }
                "providers" if provider.is_none() => provider = Some(value.to_string()),
                _ => path.push((key.to_string(), value.to_string())),
            }
        }

        let subscription_id =
            subscription_id.ok_or_else(|| Error::parse(id, "no subscription id found"))?;
        let resource_group =
            resource_group.ok_or_else(|| Error::parse(id, "no resource group name found"))?;

        Ok(Self {
            subscription_id,
            resource_group,
            provider,
            path,
        })
    }

    /// Look up the value for a path key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.path
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )?;
        if let Some(provider) = &self.provider {
            write!(f, "/providers/{provider}")?;
        }
        for (key, value) in &self.path {
            write!(f, "/{key}/{value}")?;
        }
        Ok(())
    }
}

/// The pair of values every cluster operation is addressed by
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClusterId {
    /// Resource group holding the cluster
    pub resource_group: String,
    /// Cluster name, the trailing `clusters` segment
    pub name: String,
}

impl ClusterId {
    /// Create a cluster id from its parts
    pub fn new(resource_group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_group: resource_group.into(),
            name: name.into(),
        }
    }

    /// Parse a cluster identifier
    ///
    /// The identifier must carry a resource group and a `clusters` segment.
    pub fn parse(id: &str) -> Result<Self> {
        let parsed = ResourceId::parse(id)?;
        let name = parsed
            .get(CLUSTERS_KEY)
            .ok_or_else(|| Error::parse(id, "no clusters segment found"))?
            .to_string();
        Ok(Self {
            resource_group: parsed.resource_group,
            name,
        })
    }

    /// Render the full identifier for this cluster in the given subscription
    pub fn to_resource_id(&self, subscription_id: &str) -> String {
        ResourceId {
            subscription_id: subscription_id.to_string(),
            resource_group: self.resource_group.clone(),
            provider: Some(HDINSIGHT_NAMESPACE.to_string()),
            path: vec![(CLUSTERS_KEY.to_string(), self.name.clone())],
        }
        .to_string()
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_group, self.name)
    }
}
