//! # harvest-checkout
//!
//! Client-side checkout for Harvest Bot plans: open a payment session,
//! poll it until the customer pays, and fetch the license key.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐  POST sessions  ┌────────────┐  GET session/10s  ┌────────────┐
//! │  Plan    │────────────────▶│  Payment   │──────────────────▶│  Payment   │
//! │ selected │                 │  session   │◀──────────────────│  service   │
//! └──────────┘                 └────────────┘   status          └────────────┘
//!                                    │ paid
//!                                    ▼
//!                              ┌────────────┐  POST licenses/generate
//!                              │  License   │──────────────────────────────▶
//!                              │    key     │
//!                              └────────────┘
//! ```
//!
//! The payment service sits behind the [`PaymentApi`] trait:
//! [`HttpPaymentClient`] talks to the real API and [`MockPaymentApi`]
//! simulates it in-process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use harvest_checkout::{ApiConfig, CheckoutDriver, CheckoutWorkflow, HttpPaymentClient, find_plan};
//!
//! let api = Arc::new(HttpPaymentClient::new(ApiConfig::default())?);
//! let mut workflow = CheckoutWorkflow::new(api);
//!
//! workflow.select_plan(find_plan("monthly")?).await?;
//! let settlement = CheckoutDriver::default()
//!     .await_settlement(&mut workflow, tokio::signal::ctrl_c().map(|_| ()))
//!     .await?;
//!
//! if let Some(key) = workflow.license_key() {
//!     println!("License: {key}");
//! }
//! ```

mod api;
mod clipboard;
mod driver;
mod error;
mod http;
mod license;
mod mock;
mod plan;
mod poller;
mod session;
mod toast;
mod workflow;

pub use api::PaymentApi;
pub use clipboard::{Clipboard, MemoryClipboard};
pub use driver::{CheckoutDriver, Settlement};
pub use error::{CheckoutError, Result};
pub use http::{ApiConfig, DEFAULT_API_URL, HttpPaymentClient};
pub use license::LicenseKey;
pub use mock::{CallCounts, MockPaymentApi};
pub use plan::{Plan, catalogue, find_plan};
pub use poller::{POLL_INTERVAL, PollResponse, PollTask, PollTicket};
pub use session::{PaymentSession, SessionId, SessionStatus};
pub use toast::{Severity, TOAST_TTL, Toast, ToastCenter};
pub use workflow::{
    CheckoutSnapshot, CheckoutWorkflow, LICENSE_FAILURE_MESSAGE, Phase, PollOutcome, PollStats,
};
