//! Status Poller
//!
//! Background task that checks a payment session on a fixed interval and
//! hands each response back to the workflow owner over a channel.
//!
//! ```text
//!   ┌──────────────┐  tick  ┌──────────────┐  PollResponse  ┌──────────────┐
//!   │ tokio        │───────▶│ GET session  │───────────────▶│ workflow     │
//!   │ interval     │        │ (PaymentApi) │    (mpsc)      │ apply_poll() │
//!   └──────────────┘        └──────────────┘                └──────────────┘
//! ```
//!
//! The task lives exactly as long as its [`PollTask`] handle: dropping the
//! handle aborts it, so leaving the payment phase by any path stops polling.
//! Responses already in the channel carry the [`PollTicket`] they were
//! issued for, letting the workflow discard them once the checkout moved on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::api::PaymentApi;
use crate::error::Result;
use crate::session::{PaymentSession, SessionId};

/// Default time between status checks
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Identifies which checkout attempt a poll belongs to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollTicket {
    epoch: u64,
    session_id: SessionId,
}

impl PollTicket {
    pub(crate) fn new(epoch: u64, session_id: SessionId) -> Self {
        Self { epoch, session_id }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

/// One status check result
#[derive(Debug)]
pub struct PollResponse {
    pub ticket: PollTicket,
    pub result: Result<PaymentSession>,
}

/// Handle to a running poll loop
pub struct PollTask {
    handle: JoinHandle<()>,
    responses: mpsc::Receiver<PollResponse>,
}

impl PollTask {
    /// Start polling `ticket`'s session; the first check happens one
    /// `period` from now.
    pub fn spawn(api: Arc<dyn PaymentApi>, ticket: PollTicket, period: Duration) -> Self {
        let (tx, responses) = mpsc::channel(4);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let result = api.get_session(ticket.session_id()).await;
                let response = PollResponse {
                    ticket: ticket.clone(),
                    result,
                };
                if tx.send(response).await.is_err() {
                    break;
                }
            }
            tracing::debug!(session_id = %ticket.session_id(), "Poll task finished");
        });

        Self { handle, responses }
    }

    /// Wait for the next status check
    pub async fn next(&mut self) -> Option<PollResponse> {
        self.responses.recv().await
    }

    /// Stop polling now
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
