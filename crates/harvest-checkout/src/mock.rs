//! Mock Payment Service
//!
//! In-process stand-in for the payment API, used for demos (`--mock`) and
//! tests. Sessions start `pending` and turn `paid` after a few polls unless
//! a status script says otherwise.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::api::PaymentApi;
use crate::error::{CheckoutError, Result};
use crate::license::LicenseKey;
use crate::session::{PaymentSession, SessionId, SessionStatus};

/// How many calls each endpoint has received
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create: usize,
    pub get: usize,
    pub close: usize,
    pub license: usize,
}

#[derive(Debug)]
struct MockSession {
    session: PaymentSession,
    amount: Decimal,
    polls: usize,
}

#[derive(Debug, Default)]
struct MockState {
    sessions: HashMap<SessionId, MockSession>,
    /// Sessions handed out by `create_session` before falling back to generated ones
    queued: VecDeque<PaymentSession>,
    /// Statuses returned by successive polls; the last one repeats
    script: VecDeque<SessionStatus>,
    failing_polls: usize,
    calls: CallCounts,
}

/// Simulated payment service
pub struct MockPaymentApi {
    state: Mutex<MockState>,
    paid_after: usize,
    latency: Option<Duration>,
    fail_creation: bool,
    fail_close: bool,
    fail_license: bool,
    license_key: Option<LicenseKey>,
}

impl Default for MockPaymentApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPaymentApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            paid_after: 3,
            latency: None,
            fail_creation: false,
            fail_close: false,
            fail_license: false,
            license_key: None,
        }
    }

    /// Session turns `paid` on the `polls`-th status check
    pub fn paid_after(mut self, polls: usize) -> Self {
        self.paid_after = polls.max(1);
        self
    }

    /// Delay every call, like a slow network
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Hand out these sessions (in order) from `create_session`
    pub fn with_sessions(mut self, sessions: impl IntoIterator<Item = PaymentSession>) -> Self {
        self.state.get_mut().queued.extend(sessions);
        self
    }

    /// Successive polls report these statuses; the last one repeats
    pub fn with_status_script(mut self, statuses: impl IntoIterator<Item = SessionStatus>) -> Self {
        self.state.get_mut().script.extend(statuses);
        self
    }

    /// The first `polls` status checks fail with a network error
    pub fn failing_polls(mut self, polls: usize) -> Self {
        self.state.get_mut().failing_polls = polls;
        self
    }

    pub fn with_license_key(mut self, key: impl Into<String>) -> Self {
        self.license_key = Some(LicenseKey::from_string(key));
        self
    }

    pub fn fail_creation(mut self) -> Self {
        self.fail_creation = true;
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn fail_license(mut self) -> Self {
        self.fail_license = true;
        self
    }

    pub async fn calls(&self) -> CallCounts {
        self.state.lock().await.calls
    }

    /// Amount requested when `session_id` was created
    pub async fn amount_for(&self, session_id: &SessionId) -> Option<Decimal> {
        self.state.lock().await.sessions.get(session_id).map(|s| s.amount)
    }

    /// Flip a session's status from outside, as the payment network would
    pub async fn set_status(&self, session_id: &SessionId, status: SessionStatus) -> Result<()> {
        let mut state = self.state.lock().await;
        let entry = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| not_found(session_id))?;
        entry.session.status = status;
        Ok(())
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn not_found(session_id: &SessionId) -> CheckoutError {
    CheckoutError::Http {
        endpoint: format!("/api/v1/payments/sessions/{session_id}"),
        status: 404,
    }
}

fn generate_session() -> PaymentSession {
    let sid = uuid::Uuid::new_v4().simple().to_string();
    let oid = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    PaymentSession::new(
        format!("sess_{}", &sid[..9]),
        format!("ORD-{}", &oid[..6]),
        SessionStatus::Pending,
    )
}

#[async_trait]
impl PaymentApi for MockPaymentApi {
    async fn create_session(&self, amount: Decimal) -> Result<PaymentSession> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.calls.create += 1;

        if self.fail_creation {
            return Err(CheckoutError::Http {
                endpoint: "/api/v1/payments/sessions".into(),
                status: 500,
            });
        }

        let session = state.queued.pop_front().unwrap_or_else(generate_session);
        state.sessions.insert(
            session.session_id.clone(),
            MockSession { session: session.clone(), amount, polls: 0 },
        );

        tracing::debug!(session_id = %session.session_id, %amount, "Mock session created");
        Ok(session)
    }

    async fn get_session(&self, session_id: &SessionId) -> Result<PaymentSession> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.calls.get += 1;

        if state.failing_polls > 0 {
            state.failing_polls -= 1;
            return Err(CheckoutError::Network("simulated connection reset".into()));
        }

        let scripted = if state.script.len() > 1 {
            state.script.pop_front()
        } else {
            state.script.front().copied()
        };

        let paid_after = self.paid_after;
        let entry = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| not_found(session_id))?;
        entry.polls += 1;

        if let Some(status) = scripted {
            entry.session.status = status;
        } else if entry.session.status.is_open() && entry.polls >= paid_after {
            entry.session.status = SessionStatus::Paid;
        }

        Ok(entry.session.clone())
    }

    async fn close_session(&self, session_id: &SessionId) -> Result<()> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.calls.close += 1;

        if self.fail_close {
            return Err(CheckoutError::Network("simulated close failure".into()));
        }

        if let Some(entry) = state.sessions.get_mut(session_id) {
            if entry.session.status.is_open() {
                entry.session.status = SessionStatus::Expired;
            }
        }
        Ok(())
    }

    async fn generate_license(&self, session_id: &SessionId) -> Result<LicenseKey> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.calls.license += 1;

        if self.fail_license {
            return Err(CheckoutError::Http {
                endpoint: "/api/v1/licenses/generate".into(),
                status: 502,
            });
        }

        let entry = state
            .sessions
            .get(session_id)
            .ok_or_else(|| not_found(session_id))?;
        if entry.session.status != SessionStatus::Paid {
            return Err(CheckoutError::Http {
                endpoint: "/api/v1/licenses/generate".into(),
                status: 409,
            });
        }

        Ok(self.license_key.clone().unwrap_or_else(LicenseKey::generate))
    }

    fn name(&self) -> &str {
        "MockPayments"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_generated_ids() {
        let api = MockPaymentApi::new();
        let session = api.create_session(dec!(8)).await.unwrap();
        assert!(session.session_id.as_str().starts_with("sess_"));
        assert_eq!(session.session_id.as_str().len(), 14);
        assert!(session.order_id.starts_with("ORD-"));
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(api.amount_for(&session.session_id).await, Some(dec!(8)));
    }

    #[tokio::test]
    async fn test_paid_after_polls() {
        let api = MockPaymentApi::new().paid_after(2);
        let session = api.create_session(dec!(2)).await.unwrap();

        let first = api.get_session(&session.session_id).await.unwrap();
        assert_eq!(first.status, SessionStatus::Pending);
        let second = api.get_session(&session.session_id).await.unwrap();
        assert_eq!(second.status, SessionStatus::Paid);

        let key = api.generate_license(&session.session_id).await.unwrap();
        assert_eq!(key.as_str().len(), 19);
    }

    #[tokio::test]
    async fn test_status_script_repeats_last() {
        let api = MockPaymentApi::new()
            .with_status_script([SessionStatus::Pending, SessionStatus::Failed]);
        let session = api.create_session(dec!(5)).await.unwrap();

        let statuses = [
            api.get_session(&session.session_id).await.unwrap().status,
            api.get_session(&session.session_id).await.unwrap().status,
            api.get_session(&session.session_id).await.unwrap().status,
        ];
        assert_eq!(
            statuses,
            [SessionStatus::Pending, SessionStatus::Failed, SessionStatus::Failed]
        );
    }

    #[tokio::test]
    async fn test_license_requires_payment() {
        let api = MockPaymentApi::new();
        let session = api.create_session(dec!(8)).await.unwrap();
        let err = api.generate_license(&session.session_id).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Http { status: 409, .. }));
    }
}
