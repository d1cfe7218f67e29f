//! Metrics registry for reconciler observability
//!
//! Provides OpenTelemetry metrics for:
//! - Reconciler operations (create, read, update, delete, lookup)
//! - Long-running operation polling
//! - Provider API requests (counts, latency)

use once_cell::sync::Lazy;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;

/// Global meter for reconciler metrics
static METER: Lazy<Meter> = Lazy::new(|| global::meter("hdi"));

// ============================================================================
// Reconciler Operation Metrics
// ============================================================================

/// Histogram of reconciler operation duration
///
/// Labels:
/// - `operation`: create, read, update, delete, lookup
/// - `kind`: cluster kind
/// - `result`: success, error
pub static OPERATION_DURATION: Lazy<Histogram<f64>> = Lazy::new(|| {
    METER
        .f64_histogram("hdi_operation_duration_seconds")
        .with_description("Duration of reconciler operations in seconds")
        .with_unit("s")
        .build()
});

/// Counter of reconciler operation errors
///
/// Labels:
/// - `operation`: create, read, update, delete, lookup
/// - `kind`: cluster kind
/// - `error_type`: see `Error::error_type`
pub static OPERATION_ERRORS: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("hdi_operation_errors_total")
        .with_description("Total number of failed reconciler operations")
        .with_unit("{errors}")
        .build()
});

// ============================================================================
// Polling Metrics
// ============================================================================

/// Counter of status checks against long-running operations
///
/// Labels:
/// - `status`: in_progress, succeeded, failed
pub static POLL_CHECKS: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("hdi_poll_checks_total")
        .with_description("Total number of long-running operation status checks")
        .with_unit("{checks}")
        .build()
});

// ============================================================================
// Provider API Metrics
// ============================================================================

/// Counter of provider API requests
///
/// Labels:
/// - `method`: GET, PUT, PATCH, POST, DELETE
/// - `status`: 2xx, 4xx, 5xx, transport
pub static PROVIDER_REQUESTS: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("hdi_provider_requests_total")
        .with_description("Total number of provider API requests")
        .with_unit("{requests}")
        .build()
});

/// Histogram of provider API request duration
///
/// Labels:
/// - `method`: GET, PUT, PATCH, POST, DELETE
pub static PROVIDER_REQUEST_DURATION: Lazy<Histogram<f64>> = Lazy::new(|| {
    METER
        .f64_histogram("hdi_provider_request_duration_seconds")
        .with_description("Duration of provider API requests in seconds")
        .with_unit("s")
        .build()
});

// ============================================================================
// Helper Types
// ============================================================================

/// Labels for reconciler operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create a cluster
    Create,
    /// Read a cluster back
    Read,
    /// Apply tag or worker count changes
    Update,
    /// Delete a cluster
    Delete,
    /// Read-only lookup by name
    Lookup,
}

impl Operation {
    /// Convert to label value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Lookup => "lookup",
        }
    }

    /// Progressive verb used in error messages ("creating", "reading", ...)
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create => "creating",
            Self::Read => "reading",
            Self::Update => "updating",
            Self::Delete => "deleting",
            Self::Lookup => "looking up",
        }
    }
}

/// Labels for long-running operation status checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// Operation still running
    InProgress,
    /// Operation finished successfully
    Succeeded,
    /// Operation finished with a failure
    Failed,
}

impl PollStatus {
    /// Convert to label value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Labels for provider request status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// 2xx success
    Success,
    /// 4xx client error
    ClientError,
    /// 5xx server error
    ServerError,
    /// No response was received
    Transport,
}

impl RequestStatus {
    /// Convert to label value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "2xx",
            Self::ClientError => "4xx",
            Self::ServerError => "5xx",
            Self::Transport => "transport",
        }
    }

    /// Create from HTTP status code
    pub fn from_status_code(code: u16) -> Self {
        match code {
            200..=399 => Self::Success,
            400..=499 => Self::ClientError,
            _ => Self::ServerError,
        }
    }
}

// ============================================================================
// Metric Recording Helpers
// ============================================================================

/// Record a reconciler operation with timing
pub struct OperationTimer {
    operation: Operation,
    kind: String,
    start: std::time::Instant,
}

impl OperationTimer {
    /// Start timing an operation
    pub fn start(operation: Operation, kind: impl Into<String>) -> Self {
        Self {
            operation,
            kind: kind.into(),
            start: std::time::Instant::now(),
        }
    }

    /// Record successful completion
    pub fn success(self) {
        let duration = self.start.elapsed().as_secs_f64();
        OPERATION_DURATION.record(
            duration,
            &[
                KeyValue::new("operation", self.operation.as_str()),
                KeyValue::new("kind", self.kind),
                KeyValue::new("result", "success"),
            ],
        );
    }

    /// Record error completion
    pub fn error(self, error_type: &str) {
        let duration = self.start.elapsed().as_secs_f64();
        OPERATION_DURATION.record(
            duration,
            &[
                KeyValue::new("operation", self.operation.as_str()),
                KeyValue::new("kind", self.kind.clone()),
                KeyValue::new("result", "error"),
            ],
        );
        OPERATION_ERRORS.add(
            1,
            &[
                KeyValue::new("operation", self.operation.as_str()),
                KeyValue::new("kind", self.kind),
                KeyValue::new("error_type", error_type.to_string()),
            ],
        );
    }

    /// Record the outcome of a result
    pub fn finish<T>(self, result: &crate::Result<T>) {
        match result {
            Ok(_) => self.success(),
            Err(e) => self.error(e.error_type()),
        }
    }
}

/// Record a status check against a long-running operation
pub fn record_poll(status: PollStatus) {
    POLL_CHECKS.add(1, &[KeyValue::new("status", status.as_str())]);
}

/// Record a provider request with timing
pub struct RequestTimer {
    method: String,
    start: std::time::Instant,
}

impl RequestTimer {
    /// Start timing a provider request
    pub fn start(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            start: std::time::Instant::now(),
        }
    }

    /// Complete with status
    pub fn complete(self, status: RequestStatus) {
        let duration = self.start.elapsed().as_secs_f64();

        PROVIDER_REQUESTS.add(
            1,
            &[
                KeyValue::new("method", self.method.clone()),
                KeyValue::new("status", status.as_str()),
            ],
        );
        PROVIDER_REQUEST_DURATION.record(duration, &[KeyValue::new("method", self.method)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_status_from_code() {
        assert_eq!(RequestStatus::from_status_code(200), RequestStatus::Success);
        assert_eq!(RequestStatus::from_status_code(202), RequestStatus::Success);
        assert_eq!(RequestStatus::from_status_code(404), RequestStatus::ClientError);
        assert_eq!(RequestStatus::from_status_code(503), RequestStatus::ServerError);
    }

    #[test]
    fn operation_labels() {
        assert_eq!(Operation::Create.as_str(), "create");
        assert_eq!(Operation::Delete.verb(), "deleting");
        assert_eq!(PollStatus::InProgress.as_str(), "in_progress");
    }

    #[test]
    fn timers_record_without_a_provider() {
        // The global no-op meter accepts records before telemetry is initialized.
        OperationTimer::start(Operation::Read, "storm").success();
        OperationTimer::start(Operation::Create, "storm").error("validation");
        RequestTimer::start("GET").complete(RequestStatus::Transport);
        record_poll(PollStatus::Succeeded);
    }
}
