//! Checkout Workflow
//!
//! Lifecycle of one purchase attempt:
//!
//! ```text
//!   select_plan ──▶ ┌──────┐  session created  ┌─────────┐  paid + license  ┌─────────┐
//!                   │ init │──────────────────▶│ payment │─────────────────▶│ success │
//!                   └──────┘                   └─────────┘                  └─────────┘
//!                      ▲                            │ failed / expired
//!                      │ retry (new session)        ▼
//!                      │                       ┌─────────┐
//!                      └───────────────────────│ expired │
//!                                              └─────────┘
//!   close: any phase ──▶ best-effort remote close, then back to no checkout
//! ```
//!
//! All state lives in [`CheckoutWorkflow`] and only changes through its
//! operations, so the whole flow can be driven step by step in tests.
//! Poll results are applied through [`CheckoutWorkflow::apply_poll`], which
//! ignores results whose [`PollTicket`] no longer matches the live checkout.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::PaymentApi;
use crate::clipboard::Clipboard;
use crate::error::{CheckoutError, Result};
use crate::license::LicenseKey;
use crate::plan::Plan;
use crate::poller::PollTicket;
use crate::session::{PaymentSession, SessionStatus};
use crate::toast::{Severity, ToastCenter};

/// Shown when the license call fails after the payment went through
pub const LICENSE_FAILURE_MESSAGE: &str =
    "Payment confirmed, but failed to generate license. Contact support.";

/// The workflow's own view of checkout progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Init,
    Payment,
    Success,
    Expired,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Payment => "payment",
            Phase::Success => "success",
            Phase::Expired => "expired",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for the poll path, including the results it chose to ignore
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PollStats {
    /// Poll results applied to the live checkout
    pub ticks: u64,

    /// Transient fetch errors swallowed
    pub ignored_errors: u64,

    /// Results dropped because the checkout had moved on
    pub stale_discarded: u64,
}

/// What a single poll result did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Still waiting for payment
    Pending(SessionStatus),

    /// Payment confirmed; the license must be issued next
    Paid,

    /// Payment failed or timed out
    Expired(SessionStatus),

    /// Fetch failed; try again next tick
    Ignored,

    /// Result belongs to a checkout that is no longer live
    Stale,
}

/// Serializable view of the workflow
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSnapshot {
    pub phase: Phase,
    pub plan: Option<String>,
    pub session: Option<PaymentSession>,
    pub license_key: Option<String>,
    pub error_message: Option<String>,
    pub poll_stats: PollStats,
}

/// Controller for one checkout at a time
pub struct CheckoutWorkflow {
    api: Arc<dyn PaymentApi>,
    plan: Option<Plan>,
    phase: Phase,
    session: Option<PaymentSession>,
    license_key: Option<LicenseKey>,
    error_message: Option<String>,

    /// Set when the license call failed; polling does not resume
    license_failed: bool,

    /// Bumped whenever outstanding poll tickets must stop counting
    epoch: u64,

    stats: PollStats,
    toasts: ToastCenter,
}

impl CheckoutWorkflow {
    pub fn new(api: Arc<dyn PaymentApi>) -> Self {
        Self {
            api,
            plan: None,
            phase: Phase::Init,
            session: None,
            license_key: None,
            error_message: None,
            license_failed: false,
            epoch: 0,
            stats: PollStats::default(),
            toasts: ToastCenter::new(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn api(&self) -> Arc<dyn PaymentApi> {
        Arc::clone(&self.api)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn session(&self) -> Option<&PaymentSession> {
        self.session.as_ref()
    }

    pub fn license_key(&self) -> Option<&LicenseKey> {
        self.license_key.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn poll_stats(&self) -> PollStats {
        self.stats
    }

    pub fn toasts(&self) -> &ToastCenter {
        &self.toasts
    }

    /// A plan is selected and the checkout has not been closed
    pub fn is_active(&self) -> bool {
        self.plan.is_some()
    }

    /// Payment confirmed but no license could be issued
    pub fn license_failed(&self) -> bool {
        self.license_failed
    }

    pub fn snapshot(&self) -> CheckoutSnapshot {
        CheckoutSnapshot {
            phase: self.phase,
            plan: self.plan.as_ref().map(|p| p.name.clone()),
            session: self.session.clone(),
            license_key: self.license_key.as_ref().map(|k| k.as_str().to_string()),
            error_message: self.error_message.clone(),
            poll_stats: self.stats,
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Pick a plan and immediately open a payment session for it
    pub async fn select_plan(&mut self, plan: Plan) -> Result<()> {
        if self.is_active() {
            return Err(CheckoutError::InvalidTransition {
                phase: self.phase,
                operation: "select a plan",
            });
        }
        tracing::info!(plan = %plan.name, price = %plan.price, "Plan selected");
        self.plan = Some(plan);
        self.create_session().await
    }

    /// Enter `init` and request a fresh session for the selected plan.
    ///
    /// On failure the workflow stays in `init` with an error message; there
    /// is no automatic retry.
    pub async fn create_session(&mut self) -> Result<()> {
        let plan = self.plan.as_ref().ok_or(CheckoutError::NoPlanSelected)?;
        let plan_name = plan.name.clone();
        let amount = plan.amount();

        self.reset_attempt();
        self.phase = Phase::Init;

        let amount = match amount {
            Ok(amount) => amount,
            Err(e) => {
                self.error_message = Some(e.user_message());
                return Err(e);
            }
        };

        match self.api.create_session(amount).await {
            Ok(session) => {
                tracing::info!(
                    session_id = %session.session_id,
                    order_id = %session.order_id,
                    status = %session.status,
                    plan = %plan_name,
                    "Payment session created"
                );
                self.session = Some(session);
                self.phase = Phase::Payment;
                self.toasts.show("Payment session created.", Severity::Info);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, plan = %plan_name, "Could not create payment session");
                self.error_message = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Ticket for polling the live session, if one should be polled
    pub fn poll_ticket(&self) -> Option<PollTicket> {
        if self.phase != Phase::Payment || self.license_failed {
            return None;
        }
        self.session
            .as_ref()
            .filter(|s| s.status.is_open())
            .map(|s| PollTicket::new(self.epoch, s.session_id.clone()))
    }

    fn is_live(&self, ticket: &PollTicket) -> bool {
        ticket.epoch() == self.epoch
            && self.phase == Phase::Payment
            && !self.license_failed
            && self
                .session
                .as_ref()
                .is_some_and(|s| &s.session_id == ticket.session_id())
    }

    /// Apply one poll result to the live checkout.
    ///
    /// Fetch errors are swallowed and counted. Results for a ticket that is
    /// no longer live change nothing but the stale counter.
    pub fn apply_poll(&mut self, ticket: &PollTicket, result: Result<PaymentSession>) -> PollOutcome {
        if !self.is_live(ticket) {
            self.stats.stale_discarded += 1;
            tracing::debug!(session_id = %ticket.session_id(), "Discarding stale poll result");
            return PollOutcome::Stale;
        }

        let session = match result {
            Ok(session) if &session.session_id == ticket.session_id() => session,
            Ok(session) => {
                self.stats.stale_discarded += 1;
                tracing::warn!(
                    expected = %ticket.session_id(),
                    received = %session.session_id,
                    "Poll returned a different session"
                );
                return PollOutcome::Stale;
            }
            Err(e) => {
                self.stats.ticks += 1;
                self.stats.ignored_errors += 1;
                tracing::warn!(error = %e, session_id = %ticket.session_id(), "Polling error");
                return PollOutcome::Ignored;
            }
        };

        self.stats.ticks += 1;
        let status = session.status;
        self.session = Some(session);

        match status {
            SessionStatus::Paid => {
                // Retire the ticket so queued duplicates cannot trigger a second license call.
                self.epoch += 1;
                tracing::info!(session_id = %ticket.session_id(), "Payment confirmed");
                PollOutcome::Paid
            }
            SessionStatus::Failed | SessionStatus::Expired => {
                self.phase = Phase::Expired;
                tracing::info!(session_id = %ticket.session_id(), %status, "Payment session ended");
                self.toasts.show("Payment session expired or failed.", Severity::Error);
                PollOutcome::Expired(status)
            }
            SessionStatus::Created | SessionStatus::Pending => PollOutcome::Pending(status),
        }
    }

    /// One status check of the live session, issuing the license if it is paid
    pub async fn poll_once(&mut self) -> Result<PollOutcome> {
        let ticket = self.poll_ticket().ok_or(CheckoutError::InvalidTransition {
            phase: self.phase,
            operation: "poll",
        })?;

        let result = self.api.get_session(ticket.session_id()).await;
        let outcome = self.apply_poll(&ticket, result);

        if outcome == PollOutcome::Paid {
            self.issue_license().await?;
        }
        Ok(outcome)
    }

    /// Exchange the paid session for a license key (one call, no retry)
    pub async fn issue_license(&mut self) -> Result<()> {
        let session_id = match &self.session {
            Some(s) if self.phase == Phase::Payment && s.status == SessionStatus::Paid && !self.license_failed => {
                s.session_id.clone()
            }
            _ => {
                return Err(CheckoutError::InvalidTransition {
                    phase: self.phase,
                    operation: "issue a license",
                });
            }
        };

        match self.api.generate_license(&session_id).await {
            Ok(key) => {
                tracing::info!(session_id = %session_id, license = %key.masked(), "License issued");
                self.license_key = Some(key);
                self.phase = Phase::Success;
                self.toasts.show("License generated.", Severity::Success);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, session_id = %session_id, "License generation failed after payment");
                self.license_failed = true;
                self.error_message = Some(LICENSE_FAILURE_MESSAGE.into());
                Err(CheckoutError::LicenseIssuance(e.to_string()))
            }
        }
    }

    /// Start over from `expired` with a brand-new session
    pub async fn retry(&mut self) -> Result<()> {
        if self.phase != Phase::Expired {
            return Err(CheckoutError::InvalidTransition {
                phase: self.phase,
                operation: "retry",
            });
        }
        if let Some(old) = &self.session {
            tracing::info!(previous_session = %old.session_id, "Retrying checkout with a new session");
        }
        self.create_session().await
    }

    /// Leave the checkout. Any held session is closed remotely, whatever the
    /// phase; that call is best-effort and never fails the close. Local
    /// state is always cleared.
    pub async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = self.api.close_session(&session.session_id).await {
                tracing::warn!(error = %e, session_id = %session.session_id, "Failed to close session");
            }
        }

        self.reset_attempt();
        self.plan = None;
        self.phase = Phase::Init;
        tracing::debug!("Checkout closed");
    }

    /// Clear per-attempt state and invalidate outstanding poll tickets
    fn reset_attempt(&mut self) {
        self.session = None;
        self.license_key = None;
        self.error_message = None;
        self.license_failed = false;
        self.epoch += 1;
    }

    // ------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------

    pub fn copy_license(&mut self, clipboard: &mut dyn Clipboard) -> Result<()> {
        let key = self
            .license_key
            .as_ref()
            .map(|k| k.as_str().to_string())
            .ok_or(CheckoutError::InvalidTransition {
                phase: self.phase,
                operation: "copy the license key",
            })?;
        self.copy_text(clipboard, &key)
    }

    pub fn copy_order_id(&mut self, clipboard: &mut dyn Clipboard) -> Result<()> {
        let order_id = self
            .session
            .as_ref()
            .map(|s| s.order_id.clone())
            .ok_or(CheckoutError::InvalidTransition {
                phase: self.phase,
                operation: "copy the order id",
            })?;
        self.copy_text(clipboard, &order_id)
    }

    fn copy_text(&mut self, clipboard: &mut dyn Clipboard, text: &str) -> Result<()> {
        match clipboard.set_text(text) {
            Ok(()) => {
                self.toasts.show("Copied to clipboard!", Severity::Success);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unable to copy");
                self.toasts.show("Failed to copy.", Severity::Error);
                Err(e)
            }
        }
    }
}
