//! Error types for the HDInsight cluster reconciler
//!
//! Errors are structured with fields to aid debugging in production.
//! Each error variant carries the context needed to act on it: the offending
//! identifier, the cluster and resource group involved, the operation that was
//! running and the provider's own message.
//!
//! Nothing in this workspace retries. [`Error::is_retryable`] only classifies
//! failures so a caller can decide whether to try again.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for reconciler operations
#[derive(Debug, Error)]
pub enum Error {
    /// A resource identifier could not be parsed
    #[error("cannot parse resource id {id:?}: {message}")]
    Parse {
        /// The identifier as supplied by the caller
        id: String,
        /// What was wrong with it
        message: String,
    },

    /// A desired-state document violates a constraint
    #[error("validation error for {cluster}: {message}")]
    Validation {
        /// Name of the cluster with invalid configuration
        cluster: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "roles.workerNode.vmSize")
        field: Option<String>,
    },

    /// Create was asked for a cluster that already exists and must be imported
    #[error("a {resource_type} with id {id:?} already exists and must be imported to be managed")]
    AlreadyExists {
        /// Resource type label, e.g. "storm cluster"
        resource_type: String,
        /// Identifier of the existing resource
        id: String,
    },

    /// A resource the operation depends on disappeared part way through
    #[error("{resource_type} {id:?} was not found")]
    NotFound {
        /// Resource type label, e.g. "storm cluster"
        resource_type: String,
        /// Identifier or name of the missing resource
        id: String,
    },

    /// The cloud provider rejected a call or a long-running operation failed
    #[error(
        "error {operation} {kind} cluster {cluster:?} (resource group {resource_group:?}): {message}"
    )]
    Provider {
        /// Operation that was running (creating, reading, updating, deleting, ...)
        operation: String,
        /// Cluster kind (storm, spark, ...)
        kind: String,
        /// Name of the cluster
        cluster: String,
        /// Resource group holding the cluster
        resource_group: String,
        /// Provider detail, verbatim
        message: String,
        /// HTTP status reported by the provider, if any
        status: Option<u16>,
        /// The long-running operation itself reported failure
        operation_failed: bool,
    },

    /// The caller cancelled the operation
    #[error("{operation} was cancelled")]
    Cancelled {
        /// Operation that was interrupted
        operation: String,
    },

    /// The caller's deadline passed before the operation finished
    #[error("{operation} did not finish before the deadline")]
    DeadlineExceeded {
        /// Operation that was interrupted
        operation: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },

    /// Client configuration is unusable
    #[error("configuration error: {message}")]
    Config {
        /// Description of what's wrong
        message: String,
    },
}

impl Error {
    /// Create a parse error for the given identifier
    pub fn parse(id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Parse {
            id: id.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error with the given message
    ///
    /// For simple validation errors without cluster context.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            cluster: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error naming the offending field
    ///
    /// The cluster is filled in later by [`Error::with_cluster`].
    pub fn validation_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            cluster: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a validation error with cluster context and field path
    pub fn validation_for_field(
        cluster: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            cluster: cluster.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create an import-collision error
    pub fn already_exists(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create a provider error with the given message
    ///
    /// For errors raised below the reconciler, where the cluster is not known.
    /// The reconciler fills the context in with [`Error::with_provider_context`].
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider {
            operation: UNKNOWN_CONTEXT.to_string(),
            kind: UNKNOWN_CONTEXT.to_string(),
            cluster: UNKNOWN_CONTEXT.to_string(),
            resource_group: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            status: None,
            operation_failed: false,
        }
    }

    /// Create an error for a long-running operation that finished as failed
    ///
    /// The provider has already decided the outcome (quota, invalid document,
    /// conflict), so sending the same request again gives the same answer.
    pub fn operation_failed(detail: impl Into<String>) -> Self {
        Self::Provider {
            operation: UNKNOWN_CONTEXT.to_string(),
            kind: UNKNOWN_CONTEXT.to_string(),
            cluster: UNKNOWN_CONTEXT.to_string(),
            resource_group: UNKNOWN_CONTEXT.to_string(),
            message: detail.into(),
            status: None,
            operation_failed: true,
        }
    }

    /// Create a provider error carrying the HTTP status the provider answered with
    pub fn provider_status(status: u16, msg: impl Into<String>) -> Self {
        Self::Provider {
            operation: UNKNOWN_CONTEXT.to_string(),
            kind: UNKNOWN_CONTEXT.to_string(),
            cluster: UNKNOWN_CONTEXT.to_string(),
            resource_group: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            status: Some(status),
            operation_failed: false,
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a deadline error
    pub fn deadline_exceeded(operation: impl Into<String>) -> Self {
        Self::DeadlineExceeded {
            operation: operation.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Fill in the cluster name on errors that were raised without one
    pub fn with_cluster(self, name: &str) -> Self {
        match self {
            Self::Validation {
                cluster,
                message,
                field,
            } if cluster == UNKNOWN_CONTEXT => Self::Validation {
                cluster: name.to_string(),
                message,
                field,
            },
            other => other,
        }
    }

    /// Fill in operation, kind, cluster and resource group where they are unknown
    ///
    /// Fields that already carry a value are left alone so the innermost
    /// context wins.
    pub fn with_provider_context(
        self,
        operation: &str,
        kind: &str,
        name: &str,
        group: &str,
    ) -> Self {
        fn fill(current: String, value: &str) -> String {
            if current == UNKNOWN_CONTEXT {
                value.to_string()
            } else {
                current
            }
        }

        match self {
            Self::Provider {
                operation: op,
                kind: k,
                cluster,
                resource_group,
                message,
                status,
                operation_failed,
            } => Self::Provider {
                operation: fill(op, operation),
                kind: fill(k, kind),
                cluster: fill(cluster, name),
                resource_group: fill(resource_group, group),
                message,
                status,
                operation_failed,
            },
            other => other.with_cluster(name),
        }
    }

    /// Whether a caller could reasonably try the same request again
    ///
    /// Throttling and server-side provider failures are retryable, as are
    /// deadline expiries. Failed long-running operations and everything
    /// caused by the request itself are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider {
                operation_failed: true,
                ..
            } => false,
            Self::Provider { status, .. } => match status {
                Some(code) => *code == 408 || *code == 429 || *code >= 500,
                None => true,
            },
            Self::DeadlineExceeded { .. } => true,
            Self::Parse { .. }
            | Self::Validation { .. }
            | Self::AlreadyExists { .. }
            | Self::NotFound { .. }
            | Self::Cancelled { .. }
            | Self::Serialization { .. }
            | Self::Config { .. } => false,
        }
    }

    /// Get the cluster name associated with this error, if any
    pub fn cluster(&self) -> Option<&str> {
        match self {
            Self::Validation { cluster, .. } | Self::Provider { cluster, .. }
                if cluster != UNKNOWN_CONTEXT =>
            {
                Some(cluster.as_str())
            }
            _ => None,
        }
    }

    /// Short label for metrics and logs
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::Validation { .. } => "validation",
            Self::AlreadyExists { .. } => "already_exists",
            Self::NotFound { .. } => "not_found",
            Self::Provider { .. } => "provider",
            Self::Cancelled { .. } => "cancelled",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::Serialization { .. } => "serialization",
            Self::Config { .. } => "config",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Construction and display
    // ==========================================================================

    #[test]
    fn parse_error_names_the_identifier() {
        let err = Error::parse("/bogus", "expected key/value pairs");
        let msg = err.to_string();
        assert!(msg.contains("/bogus"));
        assert!(msg.contains("expected key/value pairs"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn provider_error_display_carries_full_context() {
        let err = Error::provider("InternalServerError").with_provider_context(
            "creating",
            "storm",
            "analytics",
            "rg-data",
        );
        assert_eq!(
            err.to_string(),
            "error creating storm cluster \"analytics\" (resource group \"rg-data\"): InternalServerError"
        );
        assert_eq!(err.cluster(), Some("analytics"));
    }

    #[test]
    fn already_exists_mentions_import() {
        let err = Error::already_exists("storm cluster", "/subscriptions/s/x");
        assert!(err.to_string().contains("must be imported"));
        assert_eq!(err.error_type(), "already_exists");
    }

    // ==========================================================================
    // Context filling
    // ==========================================================================

    #[test]
    fn innermost_provider_context_wins() {
        let err = Error::Provider {
            operation: "polling".to_string(),
            kind: UNKNOWN_CONTEXT.to_string(),
            cluster: UNKNOWN_CONTEXT.to_string(),
            resource_group: UNKNOWN_CONTEXT.to_string(),
            message: "boom".to_string(),
            status: None,
            operation_failed: false,
        }
        .with_provider_context("creating", "spark", "c1", "rg1");

        match err {
            Error::Provider {
                operation,
                kind,
                cluster,
                resource_group,
                ..
            } => {
                assert_eq!(operation, "polling");
                assert_eq!(kind, "spark");
                assert_eq!(cluster, "c1");
                assert_eq!(resource_group, "rg1");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn validation_errors_pick_up_cluster_name() {
        let err = Error::validation_field("roles.head_node", "head_node is required")
            .with_provider_context("creating", "storm", "c1", "rg1");
        assert_eq!(err.cluster(), Some("c1"));
        match err {
            Error::Validation { field, .. } => assert_eq!(field.as_deref(), Some("roles.head_node")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn explicit_cluster_is_not_overwritten() {
        let err = Error::validation_for_field("mine", "tags", "bad").with_cluster("other");
        assert_eq!(err.cluster(), Some("mine"));
    }

    // ==========================================================================
    // Retry classification
    // ==========================================================================

    #[test]
    fn provider_status_drives_retry_classification() {
        assert!(Error::provider_status(429, "throttled").is_retryable());
        assert!(Error::provider_status(503, "unavailable").is_retryable());
        assert!(!Error::provider_status(400, "bad request").is_retryable());
        assert!(!Error::provider_status(409, "conflict").is_retryable());
        assert!(Error::provider("connection reset").is_retryable());
    }

    #[test]
    fn failed_operations_are_not_retryable() {
        let err = Error::operation_failed("QuotaExceeded: not enough cores in westeurope")
            .with_provider_context("creating", "storm", "c1", "rg1");
        assert!(!err.is_retryable());
        assert_eq!(err.error_type(), "provider");
        assert!(err.to_string().contains("QuotaExceeded"));
    }

    #[test]
    fn caller_driven_failures_are_not_retryable() {
        assert!(!Error::cancelled("creating").is_retryable());
        assert!(Error::deadline_exceeded("creating").is_retryable());
        assert!(!Error::validation("nope").is_retryable());
        assert!(!Error::config("no token").is_retryable());
    }

    #[test]
    fn unknown_cluster_is_reported_as_none() {
        assert_eq!(Error::provider("x").cluster(), None);
        assert_eq!(Error::cancelled("x").cluster(), None);
    }

    #[test]
    fn json_errors_convert_to_serialization() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.error_type(), "serialization");
    }
}
