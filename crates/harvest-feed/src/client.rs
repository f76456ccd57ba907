//! Feed Clients
//!
//! [`FeedApi`] abstracts the two read-only sources behind the storefront:
//! the vouch worker and the public stats endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use crate::error::{FeedError, Result};
use crate::stats::GlobalStats;
use crate::vouch::{DEFAULT_CAPACITY, Vouch};

pub const DEFAULT_STATS_URL: &str = "https://api.harvestbot.app";
pub const DEFAULT_VOUCH_URL: &str = "https://late-bread-b04a.white-devil-dev-141.workers.dev/vouches";

/// Read-only storefront feeds
#[async_trait]
pub trait FeedApi: Send + Sync {
    /// Latest vouches, newest first
    async fn fetch_vouches(&self, limit: usize) -> Result<Vec<Vouch>>;

    /// Global totals across all users
    async fn fetch_stats(&self) -> Result<GlobalStats>;
}

/// Feed endpoints
#[derive(Clone, Debug)]
pub struct FeedConfig {
    /// API base URL serving `/api/v1/stats`
    pub api_url: String,

    /// Vouch worker URL, queried with `?limit=N`
    pub vouch_url: String,

    /// Vouches requested per refresh
    pub limit: usize,

    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STATS_URL.into(),
            vouch_url: DEFAULT_VOUCH_URL.into(),
            limit: DEFAULT_CAPACITY,
            timeout: Duration::from_secs(15),
        }
    }
}

/// `reqwest` implementation of [`FeedApi`]
pub struct HttpFeedClient {
    client: Client,
    config: FeedConfig,
}

impl HttpFeedClient {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    async fn read_value(response: Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Http {
                url: response.url().to_string(),
                status: status.as_u16(),
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))
    }
}

/// Pull the `vouches` array out of a worker response.
///
/// A missing or non-array field is an empty feed; malformed entries are
/// skipped.
pub(crate) fn parse_vouches(body: Value) -> Vec<Vouch> {
    let Value::Object(mut fields) = body else {
        return Vec::new();
    };
    let Some(Value::Array(items)) = fields.remove("vouches") else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Vouch>(item) {
            Ok(vouch) => Some(vouch),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed vouch");
                None
            }
        })
        .collect()
}

#[async_trait]
impl FeedApi for HttpFeedClient {
    async fn fetch_vouches(&self, limit: usize) -> Result<Vec<Vouch>> {
        let response = self
            .client
            .get(&self.config.vouch_url)
            .query(&[("limit", limit)])
            .send()
            .await?;

        let body = Self::read_value(response).await?;
        Ok(parse_vouches(body))
    }

    async fn fetch_stats(&self) -> Result<GlobalStats> {
        let url = format!("{}/api/v1/stats", self.config.api_url.trim_end_matches('/'));
        let response = self.client.get(url).send().await?;

        let body = Self::read_value(response).await?;
        Ok(GlobalStats::from_payload(&body))
    }
}

/// Stats for display; any failure shows the zeroed defaults
pub async fn stats_or_default(api: &dyn FeedApi) -> GlobalStats {
    match api.fetch_stats().await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load global stats");
            GlobalStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_vouches() {
        let body = json!({
            "vouches": [
                { "id": "2", "username": "a", "text": "x", "createdAt": "2025-01-02T00:00:00Z" },
                { "id": "1", "username": "b" },
            ]
        });
        let vouches = parse_vouches(body);
        assert_eq!(vouches.len(), 1);
        assert_eq!(vouches[0].id, "2");
    }

    #[test]
    fn test_loose_timestamps_are_kept() {
        let body = json!({
            "vouches": [
                { "id": "3", "username": "a", "text": "x", "createdAt": "2025-01-02 10:00:00" },
                { "id": "2", "username": "b", "text": "y", "createdAt": "2025-01-02T10:00:00.000Z" },
                { "id": "1", "username": "c", "text": "z", "createdAt": "2025-01-02T10:00:00" },
                { "id": "0", "username": "d", "text": "w" },
            ]
        });
        let vouches = parse_vouches(body);
        let ids: Vec<&str> = vouches.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1", "0"]);
        assert!(vouches[..3].iter().all(|v| v.created_at().is_some()));
        assert!(vouches[3].created_at().is_none());
    }

    #[test]
    fn test_non_array_is_empty() {
        assert!(parse_vouches(json!({ "vouches": "nope" })).is_empty());
        assert!(parse_vouches(json!({})).is_empty());
        assert!(parse_vouches(json!(null)).is_empty());
    }
}
