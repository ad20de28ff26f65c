use crate::error::{TransferError, TransferErrorKind};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Bounded-retry policy for a single file transfer.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 2 means up to 3 total attempts.
    pub max_retries: u32,
    /// Fixed pause before each re-attempt. No backoff.
    pub pause_between_attempts: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, pause_between_attempts: Duration) -> Self {
        Self {
            max_retries,
            pause_between_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Terminal state of one file's transfer.
#[derive(Debug)]
pub enum TransferOutcome {
    Succeeded { attempts: u32 },
    /// The destination already holds this id; treated as already-migrated.
    Skipped { attempts: u32 },
    /// Retry budget spent, or a non-retryable destination rejection.
    Exhausted { attempts: u32, error: TransferError },
}

impl TransferOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            TransferOutcome::Succeeded { attempts }
            | TransferOutcome::Skipped { attempts }
            | TransferOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Drive one transfer through the retry state machine.
///
/// Each attempt runs `attempt(n)` with the 1-based attempt number. Duplicate
/// identity short-circuits to `Skipped` without consuming retry budget;
/// application-level rejections are terminal immediately since retrying
/// cannot change the destination's answer.
pub async fn run_with_retry<F, Fut>(policy: &RetryPolicy, mut attempt: F) -> TransferOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(), TransferError>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match attempt(attempts).await {
            Ok(()) => return TransferOutcome::Succeeded { attempts },
            Err(error) => match error.kind {
                TransferErrorKind::DuplicateIdentity => {
                    info!("⏭️  Already at destination: {}", error);
                    return TransferOutcome::Skipped { attempts };
                }
                TransferErrorKind::Application => {
                    return TransferOutcome::Exhausted { attempts, error };
                }
                TransferErrorKind::Transient => {
                    if attempts >= policy.max_attempts() {
                        return TransferOutcome::Exhausted { attempts, error };
                    }
                    warn!(
                        "Attempt {} failed ({}). {} retries left.",
                        attempts,
                        error,
                        policy.max_attempts() - attempts
                    );
                    if !policy.pause_between_attempts.is_zero() {
                        tokio::time::sleep(policy.pause_between_attempts).await;
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let outcome = run_with_retry(&policy(2), |_| async { Ok(()) }).await;
        assert!(matches!(outcome, TransferOutcome::Succeeded { attempts: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_identity_skips_without_consuming_budget() {
        let calls = Cell::new(0u32);
        let outcome = run_with_retry(&policy(5), |_| {
            calls.set(calls.get() + 1);
            async { Err(TransferError::duplicate("already exists")) }
        })
        .await;

        assert!(matches!(outcome, TransferOutcome::Skipped { attempts: 1 }));
        assert_eq!(outcome.attempts(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_exhaust_budget() {
        let calls = Cell::new(0u32);
        let outcome = run_with_retry(&policy(2), |_| {
            calls.set(calls.get() + 1);
            async { Err(TransferError::transient("connection reset")) }
        })
        .await;

        // max_retries = 2 means 3 total attempts
        assert_eq!(calls.get(), 3);
        match outcome {
            TransferOutcome::Exhausted { attempts, error } => {
                assert_eq!(attempts, 3);
                assert_eq!(error.kind, TransferErrorKind::Transient);
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let outcome = run_with_retry(&policy(3), |attempt| async move {
            if attempt < 3 {
                Err(TransferError::transient("flaky network"))
            } else {
                Ok(())
            }
        })
        .await;

        assert!(matches!(outcome, TransferOutcome::Succeeded { attempts: 3 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_application_error_is_terminal_immediately() {
        let calls = Cell::new(0u32);
        let outcome = run_with_retry(&policy(5), |_| {
            calls.set(calls.get() + 1);
            async { Err(TransferError::application("file too large")) }
        })
        .await;

        assert_eq!(calls.get(), 1);
        match outcome {
            TransferOutcome::Exhausted { attempts, error } => {
                assert_eq!(attempts, 1);
                assert_eq!(error.kind, TransferErrorKind::Application);
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }
}
