//! Checkout Driver
//!
//! Runs the `payment` phase to completion: owns the poll task, feeds its
//! responses to the workflow, issues the license once the payment lands and
//! closes the checkout when the caller cancels.

use std::future::Future;
use std::time::Duration;

use crate::error::{CheckoutError, Result};
use crate::poller::{POLL_INTERVAL, PollTask};
use crate::workflow::{CheckoutWorkflow, Phase, PollOutcome};

/// How waiting for payment ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// The workflow left `payment` on its own (success or expired)
    Settled(Phase),

    /// The caller cancelled; the checkout was closed
    Cancelled,

    /// The poll cap was reached; the session is left open
    GaveUp { polls: u64 },
}

/// Drives a workflow through the `payment` phase
#[derive(Clone, Debug)]
pub struct CheckoutDriver {
    interval: Duration,
    max_polls: Option<u64>,
}

impl Default for CheckoutDriver {
    fn default() -> Self {
        Self::new(POLL_INTERVAL)
    }
}

impl CheckoutDriver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_polls: None,
        }
    }

    /// Stop waiting after `polls` status checks (unbounded by default)
    pub fn with_max_polls(mut self, polls: u64) -> Self {
        self.max_polls = Some(polls);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until the payment settles, the cap is hit or `cancel` resolves.
    ///
    /// A license failure after payment is returned as an error; the workflow
    /// keeps the "contact support" message for display.
    pub async fn await_settlement<F>(&self, workflow: &mut CheckoutWorkflow, cancel: F) -> Result<Settlement>
    where
        F: Future<Output = ()>,
    {
        let Some(ticket) = workflow.poll_ticket() else {
            return Ok(Settlement::Settled(workflow.phase()));
        };

        tracing::info!(
            session_id = %ticket.session_id(),
            interval_secs = self.interval.as_secs(),
            "Waiting for payment"
        );

        let mut task = PollTask::spawn(workflow.api(), ticket, self.interval);
        let mut polls: u64 = 0;
        tokio::pin!(cancel);

        loop {
            tokio::select! {
                () = &mut cancel => {
                    task.cancel();
                    workflow.close().await;
                    return Ok(Settlement::Cancelled);
                }
                response = task.next() => {
                    let response = response.ok_or(CheckoutError::PollerStopped)?;
                    polls += 1;

                    match workflow.apply_poll(&response.ticket, response.result) {
                        PollOutcome::Paid => {
                            task.cancel();
                            workflow.issue_license().await?;
                            return Ok(Settlement::Settled(workflow.phase()));
                        }
                        PollOutcome::Expired(_) => {
                            return Ok(Settlement::Settled(Phase::Expired));
                        }
                        PollOutcome::Pending(status) => {
                            tracing::debug!(%status, polls, "Payment still pending");
                        }
                        PollOutcome::Ignored | PollOutcome::Stale => {}
                    }

                    if self.max_polls.is_some_and(|max| polls >= max) {
                        tracing::warn!(polls, "Giving up waiting for payment");
                        return Ok(Settlement::GaveUp { polls });
                    }
                }
            }
        }
    }
}
