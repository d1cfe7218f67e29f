//! Which top-level fields may change after creation, and how

use std::fmt;

use hdi_common::{ChangeSet, ClusterField, Error, Result};

/// How an update applies a change to a field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Replaced in place with a tag patch
    Patch,
    /// Applied by resizing the worker group
    ResizeWorkers,
    /// Fixed at creation
    Immutable,
}

impl FieldPolicy {
    /// Policy for a field
    pub fn of(field: ClusterField) -> Self {
        match field {
            ClusterField::Tags => FieldPolicy::Patch,
            ClusterField::Roles => FieldPolicy::ResizeWorkers,
            ClusterField::Name
            | ClusterField::ResourceGroup
            | ClusterField::Location
            | ClusterField::ClusterVersion
            | ClusterField::Tier
            | ClusterField::ComponentVersion
            | ClusterField::Gateway
            | ClusterField::StorageAccounts => FieldPolicy::Immutable,
        }
    }

    /// Label for logs and tables
    pub fn as_str(self) -> &'static str {
        match self {
            FieldPolicy::Patch => "patch",
            FieldPolicy::ResizeWorkers => "resize-workers",
            FieldPolicy::Immutable => "immutable",
        }
    }
}

impl fmt::Display for FieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject a change set that touches a field fixed at creation
pub fn check_change_set(changes: &ChangeSet) -> Result<()> {
    match changes
        .iter()
        .find(|field| FieldPolicy::of(*field) == FieldPolicy::Immutable)
    {
        Some(field) => Err(Error::validation_field(
            field.as_str(),
            format!("{field} cannot be changed after the cluster is created"),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_tags_and_roles_are_mutable() {
        let mutable: Vec<_> = ClusterField::ALL
            .into_iter()
            .filter(|f| FieldPolicy::of(*f) != FieldPolicy::Immutable)
            .collect();
        assert_eq!(mutable, [ClusterField::Roles, ClusterField::Tags]);
    }

    #[test]
    fn immutable_field_is_named_in_the_error() {
        let changes: ChangeSet = [ClusterField::Tags, ClusterField::Location]
            .into_iter()
            .collect();
        match check_change_set(&changes) {
            Err(Error::Validation { field, .. }) => {
                assert_eq!(field.as_deref(), Some("location"))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_and_mutable_change_sets_pass() {
        assert!(check_change_set(&ChangeSet::new()).is_ok());
        let changes: ChangeSet = [ClusterField::Tags, ClusterField::Roles]
            .into_iter()
            .collect();
        assert!(check_change_set(&changes).is_ok());
    }
}
