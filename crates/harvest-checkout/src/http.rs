//! HTTP Payment Client
//!
//! `reqwest` implementation of [`PaymentApi`] against the Harvest Bot API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::api::PaymentApi;
use crate::error::{CheckoutError, Result};
use crate::license::LicenseKey;
use crate::session::{CreateSessionRequest, LicenseRequest, LicenseResponse, PaymentSession, SessionId};

pub const DEFAULT_API_URL: &str = "https://api.harvestbot.app";

/// Payment API configuration
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Base URL, without a trailing `/api/v1`
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.into(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Payment service client over HTTP
pub struct HttpPaymentClient {
    client: Client,
    config: ApiConfig,
}

impl HttpPaymentClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckoutError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Reject non-2xx responses, keeping the endpoint for the error
    fn check_status(response: Response, endpoint: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(CheckoutError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
        let response = Self::check_status(response, endpoint)?;
        response
            .json::<T>()
            .await
            .map_err(|e| CheckoutError::Decode(format!("{endpoint}: {e}")))
    }
}

#[async_trait]
impl PaymentApi for HttpPaymentClient {
    async fn create_session(&self, amount: Decimal) -> Result<PaymentSession> {
        let endpoint = "/api/v1/payments/sessions";
        let response = self
            .client
            .post(self.url(endpoint))
            .json(&CreateSessionRequest { amount })
            .send()
            .await?;

        Self::read_json(response, endpoint).await
    }

    async fn get_session(&self, session_id: &SessionId) -> Result<PaymentSession> {
        let endpoint = format!("/api/v1/payments/sessions/{session_id}");
        let response = self.client.get(self.url(&endpoint)).send().await?;

        Self::read_json(response, &endpoint).await
    }

    async fn close_session(&self, session_id: &SessionId) -> Result<()> {
        let endpoint = format!("/api/v1/payments/sessions/{session_id}/close");
        let response = self.client.post(self.url(&endpoint)).send().await?;

        Self::check_status(response, &endpoint).map(|_| ())
    }

    async fn generate_license(&self, session_id: &SessionId) -> Result<LicenseKey> {
        let endpoint = "/api/v1/licenses/generate";
        let response = self
            .client
            .post(self.url(endpoint))
            .json(&LicenseRequest { session_id: session_id.clone() })
            .send()
            .await?;

        let body: LicenseResponse = Self::read_json(response, endpoint).await?;
        Ok(body.license_key)
    }

    fn name(&self) -> &str {
        "HarvestApi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "https://api.harvestbot.app");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_url_joining() {
        let client = HttpPaymentClient::new(ApiConfig::new("http://localhost:8080/")).unwrap();
        assert_eq!(
            client.url("/api/v1/stats"),
            "http://localhost:8080/api/v1/stats"
        );
    }
}
