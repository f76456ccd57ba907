//! Global farming statistics shown on the storefront.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Aggregated totals across all bot users, already formatted for display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub gold: String,
    pub elixir: String,
    pub walls: String,
    pub runtime: String,
    pub users: String,
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self {
            gold: "0".into(),
            elixir: "0".into(),
            walls: "0".into(),
            runtime: "0h-0m".into(),
            users: "0".into(),
        }
    }
}

impl GlobalStats {
    /// Build from the raw `/api/v1/stats` body.
    ///
    /// Each `total_*` field may be a string or a number. Missing, null or
    /// empty fields fall back to the defaults.
    pub fn from_payload(payload: &Value) -> Self {
        let defaults = Self::default();
        Self {
            gold: field(payload, "total_gold").unwrap_or(defaults.gold),
            elixir: field(payload, "total_elixir").unwrap_or(defaults.elixir),
            walls: field(payload, "total_walls").unwrap_or(defaults.walls),
            runtime: field(payload, "total_runtime").unwrap_or(defaults.runtime),
            users: field(payload, "total_users").unwrap_or(defaults.users),
        }
    }
}

fn field(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_payload() {
        let stats = GlobalStats::from_payload(&json!({
            "total_gold": "1.2B",
            "total_elixir": "900M",
            "total_walls": 4521,
            "total_runtime": "120h-5m",
            "total_users": "342",
        }));

        assert_eq!(stats.gold, "1.2B");
        assert_eq!(stats.walls, "4521");
        assert_eq!(stats.runtime, "120h-5m");
        assert_eq!(stats.users, "342");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let stats = GlobalStats::from_payload(&json!({ "total_gold": "", "total_users": null }));
        assert_eq!(stats, GlobalStats::default());
        assert_eq!(stats.runtime, "0h-0m");
    }

    #[test]
    fn test_non_object_payload() {
        assert_eq!(GlobalStats::from_payload(&json!([1, 2])), GlobalStats::default());
    }
}
