// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::error::OrchestratorError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Bounded retry budget with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of additional attempts made after the initial one fails.
    pub retries: u32,

    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        RetryPolicy { retries, delay }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug)]
pub enum AttemptError {
    /// The resource might not be ready yet, another attempt is worth making.
    Transient(OrchestratorError),

    /// Retrying can't change the result, e.g. a transaction that explicitly failed.
    Fatal(OrchestratorError),
}

async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    resource: &str,
    fut: F,
) -> Result<F::Output, OrchestratorError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OrchestratorError::Cancelled {
            resource: resource.to_string(),
        }),
        res = fut => Ok(res),
    }
}

/// Repeatedly invokes `operation` (with the 1-based attempt number) until it succeeds,
/// fails fatally, the policy budget runs out or `cancel` fires.
pub async fn retry<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    resource: &str,
    mut operation: F,
) -> Result<T, OrchestratorError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        if cancel.is_cancelled() {
            return Err(OrchestratorError::Cancelled {
                resource: resource.to_string(),
            });
        }

        match cancellable(cancel, resource, operation(attempt)).await? {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(err)) => return Err(err),
            Err(AttemptError::Transient(err)) if err.is_cancellation() => return Err(err),
            Err(AttemptError::Transient(err)) => {
                if attempt >= max_attempts {
                    warn!("giving up on {resource} after {attempt} attempts: {err}");
                    return Err(OrchestratorError::RetriesExhausted {
                        resource: resource.to_string(),
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                debug!("attempt {attempt}/{max_attempts} against {resource} failed: {err}");
            }
        }

        cancellable(cancel, resource, tokio::time::sleep(policy.delay)).await?;
    }
}
