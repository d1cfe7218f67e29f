//! Caller-supplied set of changed fields
//!
//! The reconciler never diffs documents itself. The caller says which
//! top-level fields differ from the last known state.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Top-level fields of a cluster spec
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClusterField {
    /// `name`
    Name,
    /// `resourceGroup`
    ResourceGroup,
    /// `location`
    Location,
    /// `clusterVersion`
    ClusterVersion,
    /// `tier`
    Tier,
    /// `componentVersion`
    ComponentVersion,
    /// `gateway`
    Gateway,
    /// `storageAccounts`
    StorageAccounts,
    /// `roles`
    Roles,
    /// `tags`
    Tags,
}

impl ClusterField {
    /// Every field, in document order
    pub const ALL: [ClusterField; 10] = [
        ClusterField::Name,
        ClusterField::ResourceGroup,
        ClusterField::Location,
        ClusterField::ClusterVersion,
        ClusterField::Tier,
        ClusterField::ComponentVersion,
        ClusterField::Gateway,
        ClusterField::StorageAccounts,
        ClusterField::Roles,
        ClusterField::Tags,
    ];

    /// Field name as it appears in the document
    pub fn as_str(self) -> &'static str {
        match self {
            ClusterField::Name => "name",
            ClusterField::ResourceGroup => "resourceGroup",
            ClusterField::Location => "location",
            ClusterField::ClusterVersion => "clusterVersion",
            ClusterField::Tier => "tier",
            ClusterField::ComponentVersion => "componentVersion",
            ClusterField::Gateway => "gateway",
            ClusterField::StorageAccounts => "storageAccounts",
            ClusterField::Roles => "roles",
            ClusterField::Tags => "tags",
        }
    }
}

impl fmt::Display for ClusterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusterField {
    type Err = Error;

    /// Accepts the document name or its snake_case spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.trim().chars().filter(|c| *c != '_').collect();
        ClusterField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| Error::validation(format!("unknown cluster field {s:?}")))
    }
}

/// Set of fields that changed since the last known state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeSet<ClusterField>);

impl ChangeSet {
    /// Empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the field changed
    pub fn contains(&self, field: ClusterField) -> bool {
        self.0.contains(&field)
    }

    /// Mark a field as changed
    pub fn insert(&mut self, field: ClusterField) -> bool {
        self.0.insert(field)
    }

    /// Whether nothing changed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Changed fields in document order
    pub fn iter(&self) -> impl Iterator<Item = ClusterField> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<ClusterField> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = ClusterField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for ChangeSet {
    type Err = Error;

    /// Parse a comma separated list, e.g. "tags,roles"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ClusterField::from_str)
            .collect()
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(ClusterField::as_str).collect();
        f.write_str(&names.join(","))
    }
}
