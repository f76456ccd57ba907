//! Payment Sessions
//!
//! Wire types for the payment-session endpoints. The workflow keeps a
//! read-mostly copy of the session and refreshes it by polling.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer, ser::Error as _};

use crate::license::LicenseKey;

/// Server-issued session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status reported by the payment service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Created,
    Pending,
    Paid,
    Failed,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Created => "created",
            SessionStatus::Pending => "pending",
            SessionStatus::Paid => "paid",
            SessionStatus::Failed => "failed",
            SessionStatus::Expired => "expired",
        }
    }

    /// Still waiting for the customer to pay
    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Created | SessionStatus::Pending)
    }

    /// No further status changes are expected
    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    /// Payment did not go through
    pub fn is_unsuccessful(&self) -> bool {
        matches!(self, SessionStatus::Failed | SessionStatus::Expired)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One in-progress payment attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    pub session_id: SessionId,

    /// Reference the customer quotes to support
    pub order_id: String,

    pub status: SessionStatus,
}

impl PaymentSession {
    pub fn new(
        session_id: impl Into<String>,
        order_id: impl Into<String>,
        status: SessionStatus,
    ) -> Self {
        Self {
            session_id: SessionId::from_string(session_id),
            order_id: order_id.into(),
            status,
        }
    }
}

/// Body of `POST /api/v1/payments/sessions`
#[derive(Clone, Debug, Serialize)]
pub struct CreateSessionRequest {
    #[serde(serialize_with = "amount_as_number")]
    pub amount: Decimal,
}

/// Body of `POST /api/v1/licenses/generate`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRequest {
    pub session_id: SessionId,
}

/// Response of `POST /api/v1/licenses/generate`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseResponse {
    pub license_key: LicenseKey,
}

/// The service expects a plain JSON number; whole amounts go out without a fraction.
fn amount_as_number<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let amount = amount.normalize();
    if amount.scale() == 0 {
        if let Some(whole) = amount.to_i64() {
            return serializer.serialize_i64(whole);
        }
    }
    match amount.to_f64() {
        Some(value) => serializer.serialize_f64(value),
        None => Err(S::Error::custom(format!("amount {amount} is out of range"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_session_wire_format() {
        let json = r#"{"sessionId":"s1","orderId":"o1","status":"created"}"#;
        let session: PaymentSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.session_id.as_str(), "s1");
        assert_eq!(session.order_id, "o1");
        assert_eq!(session.status, SessionStatus::Created);
    }

    #[test]
    fn test_amount_serializes_as_number() {
        let whole = serde_json::to_string(&CreateSessionRequest { amount: dec!(8) }).unwrap();
        assert_eq!(whole, r#"{"amount":8}"#);

        let trailing_zeros = serde_json::to_string(&CreateSessionRequest { amount: dec!(5.00) }).unwrap();
        assert_eq!(trailing_zeros, r#"{"amount":5}"#);

        let fractional = serde_json::to_string(&CreateSessionRequest { amount: dec!(2.5) }).unwrap();
        assert_eq!(fractional, r#"{"amount":2.5}"#);
    }

    #[test]
    fn test_status_classification() {
        assert!(SessionStatus::Pending.is_open());
        assert!(SessionStatus::Paid.is_terminal());
        assert!(SessionStatus::Expired.is_unsuccessful());
        assert!(!SessionStatus::Paid.is_unsuccessful());
    }

    #[test]
    fn test_license_request_uses_camel_case() {
        let body = LicenseRequest { session_id: SessionId::from_string("s1") };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"sessionId":"s1"}"#);
    }
}
