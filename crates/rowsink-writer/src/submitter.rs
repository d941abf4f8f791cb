//! Batch submission with bounded, constant-backoff retry.
//!
//! Each attempt sends the whole accumulator. A whole-batch failure resends the
//! same objects; per-object failures resend only the objects that were not
//! acknowledged. Ids the store returned no outcome for count as failed too.
//! Either kind of failure spends one unit of the retry budget. Exhausted
//! budgets are reported in [`SubmitReport`], never raised.

use std::time::Duration;

use tracing::{debug, error, warn};

use rowsink_core::traits::StoreClient;
use rowsink_core::types::{BatchFailure, ObjectError, ObjectId, ObjectOutcome};

use crate::accumulator::BatchAccumulator;

/// Remaining resubmissions. Spending returns a new budget instead of
/// mutating a shared counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
}

impl RetryBudget {
    pub fn new(max_retries: u32) -> Self { Self { remaining: max_retries } }

    pub fn remaining(self) -> u32 { self.remaining }

    /// `None` once no retries are left.
    pub fn spend(self) -> Option<Self> {
        self.remaining.checked_sub(1).map(|remaining| Self { remaining })
    }
}

/// An object whose validation error outlived the retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedObject {
    pub id: ObjectId,
    pub error: ObjectError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    /// Calls made to the store.
    pub attempts: u32,
    /// Objects the store acknowledged.
    pub written: usize,
    /// Dropped from the batch after the last attempt still failed them.
    pub rejected: Vec<RejectedObject>,
    /// Dropped from the batch after the last attempt returned no outcome for them.
    pub unsubmitted: Vec<ObjectId>,
    /// Set when whole-batch failures exhausted the budget. The objects stay
    /// in the accumulator.
    pub batch_error: Option<BatchFailure>,
}

impl SubmitReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.unsubmitted.is_empty() && self.batch_error.is_none()
    }
}

pub struct BatchSubmitter<S> {
    client: S,
}

impl<S: StoreClient> BatchSubmitter<S> {
    pub fn new(client: S) -> Self { Self { client } }

    /// Submit everything in `batch`, retrying failures while `budget` lasts.
    ///
    /// Blocks for `backoff` between attempts. On return the batch is empty
    /// unless the report carries a `batch_error`.
    pub fn submit(&self, batch: &mut BatchAccumulator, budget: RetryBudget, backoff: Duration) -> SubmitReport {
        let mut report = SubmitReport::default();
        let mut budget = budget;
        loop {
            if batch.is_empty() {
                return report;
            }
            let objects = batch.snapshot();
            report.attempts += 1;
            debug!(objects = objects.len(), attempt = report.attempts, "submitting batch");

            let outcomes = match self.client.submit_batch(&objects) {
                Ok(outcomes) => outcomes,
                Err(failure) => {
                    warn!(error = %failure, retries_left = budget.remaining(), "batch submission failed");
                    match budget.spend() {
                        Some(next) => {
                            budget = next;
                            pause(backoff);
                            continue;
                        }
                        None => {
                            error!(error = %failure, pending = batch.len(), "retries exhausted; batch kept unsubmitted");
                            report.batch_error = Some(failure);
                            return report;
                        }
                    }
                }
            };

            let (succeeded, failed): (Vec<ObjectOutcome>, Vec<ObjectOutcome>) =
                outcomes.into_iter().partition(ObjectOutcome::is_ok);
            report.written += succeeded.len();
            for outcome in &succeeded {
                batch.remove(&outcome.id);
            }
            if batch.is_empty() {
                return report;
            }

            for outcome in &failed {
                if let Some(err) = &outcome.error {
                    warn!(id = %outcome.id, error = %err, "object rejected by store");
                }
            }
            let missing: Vec<ObjectId> =
                batch.ids().filter(|id| !failed.iter().any(|o| &o.id == *id)).cloned().collect();
            if !missing.is_empty() {
                warn!(missing = missing.len(), "store returned no outcome for some objects");
            }
            match budget.spend() {
                Some(next) => {
                    debug!(pending = batch.len(), retries_left = next.remaining(), "resubmitting failed objects");
                    budget = next;
                    pause(backoff);
                }
                None => {
                    error!(failed = failed.len(), missing = missing.len(), "retries exhausted; dropping failed objects");
                    report.rejected.extend(failed.into_iter().map(|outcome| RejectedObject {
                        id: outcome.id,
                        error: outcome.error.unwrap_or_default(),
                    }));
                    report.unsubmitted = missing;
                    batch.clear();
                    return report;
                }
            }
        }
    }
}

fn pause(backoff: Duration) {
    if !backoff.is_zero() {
        std::thread::sleep(backoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_counts_down_to_none() {
        let b = RetryBudget::new(2);
        let b = b.spend().unwrap();
        assert_eq!(b.remaining(), 1);
        let b = b.spend().unwrap();
        assert_eq!(b.remaining(), 0);
        assert!(b.spend().is_none());
        assert!(RetryBudget::new(0).spend().is_none());
    }
}
