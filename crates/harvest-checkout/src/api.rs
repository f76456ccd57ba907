//! Payment API
//!
//! Abstraction over the remote payment and license service.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::license::LicenseKey;
use crate::session::{PaymentSession, SessionId};

/// Payment service client trait (Strategy pattern)
///
/// `HttpPaymentClient` talks to the real service; `MockPaymentApi`
/// simulates it in-process.
#[async_trait]
pub trait PaymentApi: Send + Sync {
    /// Open a new payment session for `amount`
    async fn create_session(&self, amount: Decimal) -> Result<PaymentSession>;

    /// Fetch the current state of a session
    async fn get_session(&self, session_id: &SessionId) -> Result<PaymentSession>;

    /// Ask the service to close a session the customer abandoned
    async fn close_session(&self, session_id: &SessionId) -> Result<()>;

    /// Exchange a paid session for a license key
    async fn generate_license(&self, session_id: &SessionId) -> Result<LicenseKey>;

    /// Client name for logs
    fn name(&self) -> &str;
}
