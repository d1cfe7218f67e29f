//! Cancellation and deadline carried through every provider call

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use hdi_common::{Error, Result};

/// Bounds a reconciliation call: a cancellation token plus an optional deadline
///
/// Every network call and every poll sleep runs through [`CallContext::run`],
/// so the caller can bound the worst-case latency of a whole operation.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Context driven by the given token, without a deadline
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Context that is never cancelled and never expires
    pub fn background() -> Self {
        Self::default()
    }

    /// Add a deadline `timeout` from now, keeping an earlier one if set
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
            ..self
        }
    }

    /// The token that cancels this context
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the context has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time left before the deadline, `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Run a future, giving up when the context is cancelled or expires
    ///
    /// Cancellation is checked first, so an already-cancelled context never
    /// starts the future.
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::cancelled(operation)),
            _ = deadline => Err(Error::deadline_exceeded(operation)),
            result = fut => result,
        }
    }

    /// Sleep for `duration` unless the context ends first
    pub async fn sleep(&self, operation: &str, duration: Duration) -> Result<()> {
        self.run(operation, async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_context_runs_to_completion() {
        let ctx = CallContext::background();
        let value = ctx
            .run("noop", async { Ok::<_, Error>(7) })
            .await
            .expect("background context should not interrupt");
        assert_eq!(value, 7);
        assert!(ctx.remaining().is_none());
    }

    #[tokio::test]
    async fn cancelled_context_never_starts_work() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = CallContext::new(token);

        let err = ctx
            .run("creating", async { Ok::<_, Error>(()) })
            .await
            .expect_err("cancelled context must fail");
        assert!(matches!(err, Error::Cancelled { ref operation } if operation == "creating"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_long_sleep() {
        let ctx = CallContext::background().with_timeout(Duration::from_secs(5));
        let err = ctx
            .sleep("polling", Duration::from_secs(60))
            .await
            .expect_err("deadline should fire first");
        assert!(matches!(err, Error::DeadlineExceeded { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_deadline_is_kept() {
        let ctx = CallContext::background()
            .with_timeout(Duration::from_secs(5))
            .with_timeout(Duration::from_secs(60));
        let remaining = ctx.remaining().expect("deadline set");
        assert!(remaining <= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn cancelling_mid_flight_interrupts() {
        let token = CancellationToken::new();
        let ctx = CallContext::new(token.clone());
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let err = ctx
            .sleep("deleting", Duration::from_secs(3600))
            .await
            .expect_err("cancel should interrupt the sleep");
        assert!(matches!(err, Error::Cancelled { .. }));
        canceller.await.expect("canceller task should finish");
    }
}
