use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{BackendError, ResultBackend};
use crate::session::battle::BattleOutcome;
use crate::session::result::{BattleMetrics, ResultSubmission};

/// One-shot flag owned by a single battle instance.
#[derive(Debug, Default)]
pub struct SubmissionGuard {
    claimed: AtomicBool,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the first caller.
    pub fn try_claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeReport {
    pub xp_earned: u32,
    pub accuracy: f64,
}

pub struct ResultReporter<B> {
    backend: B,
}

impl<B: ResultBackend> ResultReporter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Report a terminal outcome at most once per guard.
    ///
    /// The guard is claimed when this is called, before the returned future is
    /// first polled. Later calls with the same guard resolve to `Ok(None)`
    /// without touching the backend, whether the first submission is still in
    /// flight, succeeded or failed. A failed submission is not retried.
    pub fn report_outcome<'r>(
        &'r self,
        guard: &SubmissionGuard,
        outcome: BattleOutcome,
        metrics: &BattleMetrics,
    ) -> impl Future<Output = Result<Option<OutcomeReport>, BackendError>> + use<'r, B> {
        let submission = guard
            .try_claim()
            .then(|| ResultSubmission::new(outcome, metrics));
        let accuracy = metrics.accuracy;

        async move {
            let Some(submission) = submission else {
                debug!(outcome = outcome.as_str(), "outcome already reported");
                return Ok(None);
            };

            match self.backend.submit(&submission).await {
                Ok(receipt) => {
                    info!(xp = receipt.xp_earned, outcome = outcome.as_str(), "battle result submitted");
                    Ok(Some(OutcomeReport {
                        xp_earned: receipt.xp_earned,
                        accuracy,
                    }))
                }
                Err(err) => {
                    warn!(error = %err, outcome = outcome.as_str(), "battle result submission failed");
                    Err(err)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_claims_once() {
        let guard = SubmissionGuard::new();
        assert!(!guard.is_claimed());
        assert!(guard.try_claim());
        assert!(!guard.try_claim());
        assert!(guard.is_claimed());
    }
}
