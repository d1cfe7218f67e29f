//! Waiting for long-running provider operations
//!
//! The poller blocks the calling flow until an operation reaches a terminal
//! status. It never retries: a failed operation, or a failed status check,
//! ends the wait with that error.

use std::time::Duration;

use tracing::{debug, warn};

use crate::client::{ClusterApi, OperationHandle, OperationStatus};
use crate::context::CallContext;
use hdi_common::metrics::{record_poll, PollStatus};
use hdi_common::{Error, Result};

/// Pacing between status checks
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait between checks when the provider does not suggest one
    pub interval: Duration,
    /// Upper bound on any single wait, including provider suggestions
    pub max_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            max_interval: Duration::from_secs(60),
        }
    }
}

impl PollConfig {
    /// Fixed pacing, useful for tests
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
        }
    }

    fn next_wait(&self, suggested: Option<Duration>) -> Duration {
        suggested.unwrap_or(self.interval).min(self.max_interval)
    }
}

/// Block until the operation behind `handle` finishes
///
/// Returns the provider's failure detail verbatim as a provider error when
/// the operation fails. Cancellation and the deadline in `ctx` interrupt
/// both the waits and the status checks.
pub async fn await_completion(
    api: &dyn ClusterApi,
    handle: &OperationHandle,
    config: &PollConfig,
    ctx: &CallContext,
) -> Result<()> {
    let mut wait = match handle {
        OperationHandle::Completed => return Ok(()),
        OperationHandle::Pending { retry_after, .. } => config.next_wait(*retry_after),
    };

    let mut checks: u32 = 0;
    loop {
        ctx.sleep("waiting for operation", wait).await?;
        checks += 1;

        let status = ctx
            .run("checking operation status", api.operation_status(handle))
            .await?;

        match status {
            OperationStatus::InProgress { retry_after } => {
                record_poll(PollStatus::InProgress);
                wait = config.next_wait(retry_after);
                debug!(checks, wait_secs = wait.as_secs(), "Operation still in progress");
            }
            OperationStatus::Succeeded => {
                record_poll(PollStatus::Succeeded);
                debug!(checks, "Operation succeeded");
                return Ok(());
            }
            OperationStatus::Failed(detail) => {
                record_poll(PollStatus::Failed);
                warn!(checks, detail = %detail, "Operation failed");
                return Err(Error::operation_failed(detail));
            }
        }
    }
}
