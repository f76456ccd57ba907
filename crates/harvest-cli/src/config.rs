//! Environment configuration for the `harvest` binary.

use std::time::Duration;

use harvest_checkout::{ApiConfig, DEFAULT_API_URL, POLL_INTERVAL};
use harvest_feed::{DEFAULT_CAPACITY, DEFAULT_VOUCH_URL, FeedConfig};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be true or false, got {value:?}")]
    InvalidFlag { key: &'static str, value: String },
}

/// Runtime settings, read from `HARVEST_*` variables
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub vouch_url: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub vouch_limit: usize,
    pub mock: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            vouch_url: DEFAULT_VOUCH_URL.into(),
            poll_interval: POLL_INTERVAL,
            http_timeout: Duration::from_secs(15),
            vouch_limit: DEFAULT_CAPACITY,
            mock: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let lookup = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            api_url: lookup("HARVEST_API_URL").unwrap_or(defaults.api_url),
            vouch_url: lookup("HARVEST_VOUCH_URL").unwrap_or(defaults.vouch_url),
            poll_interval: match lookup("HARVEST_POLL_SECS") {
                Some(v) => Duration::from_secs(positive("HARVEST_POLL_SECS", &v)?),
                None => defaults.poll_interval,
            },
            http_timeout: match lookup("HARVEST_HTTP_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(positive("HARVEST_HTTP_TIMEOUT_SECS", &v)?),
                None => defaults.http_timeout,
            },
            vouch_limit: match lookup("HARVEST_VOUCH_LIMIT") {
                Some(v) => usize::try_from(positive("HARVEST_VOUCH_LIMIT", &v)?).map_err(|_| {
                    ConfigError::InvalidNumber {
                        key: "HARVEST_VOUCH_LIMIT",
                        value: v.clone(),
                    }
                })?,
                None => defaults.vouch_limit,
            },
            mock: match lookup("HARVEST_MOCK") {
                Some(v) => flag("HARVEST_MOCK", &v)?,
                None => defaults.mock,
            },
        })
    }

    pub fn payment_config(&self) -> ApiConfig {
        ApiConfig::new(self.api_url.clone()).with_timeout(self.http_timeout)
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            api_url: self.api_url.clone(),
            vouch_url: self.vouch_url.clone(),
            limit: self.vouch_limit,
            timeout: self.http_timeout,
        }
    }
}

fn positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

fn flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.poll_interval, Duration::from_secs(10));
        assert_eq!(s.vouch_limit, 20);
        assert!(!s.mock);
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            ("HARVEST_API_URL", "http://localhost:8080"),
            ("HARVEST_POLL_SECS", "2"),
            ("HARVEST_HTTP_TIMEOUT_SECS", "5"),
            ("HARVEST_VOUCH_LIMIT", "5"),
            ("HARVEST_MOCK", "TRUE"),
        ])
        .unwrap();

        assert_eq!(s.api_url, "http://localhost:8080");
        assert_eq!(s.poll_interval, Duration::from_secs(2));
        assert_eq!(s.payment_config().timeout, Duration::from_secs(5));
        assert_eq!(s.feed_config().limit, 5);
        assert!(s.mock);
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let s = settings(&[("HARVEST_API_URL", "  "), ("HARVEST_POLL_SECS", "")]).unwrap();
        assert_eq!(s.api_url, DEFAULT_API_URL);
        assert_eq!(s.poll_interval, POLL_INTERVAL);
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(
            settings(&[("HARVEST_POLL_SECS", "0")]).unwrap_err(),
            ConfigError::InvalidNumber {
                key: "HARVEST_POLL_SECS",
                value: "0".into()
            }
        );
        assert!(settings(&[("HARVEST_VOUCH_LIMIT", "-3")]).is_err());
        assert!(settings(&[("HARVEST_HTTP_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_invalid_flag() {
        assert!(matches!(
            settings(&[("HARVEST_MOCK", "maybe")]),
            Err(ConfigError::InvalidFlag { .. })
        ));
    }
}
