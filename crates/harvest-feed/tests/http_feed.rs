//! `HttpFeedClient` against a local stub of the vouch worker and stats API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
use harvest_feed::{FeedApi, FeedConfig, FeedError, GlobalStats, HttpFeedClient, VouchFeed, stats_or_default};
use serde_json::{Value, json};

async fn vouches(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(0);
    let all: Vec<Value> = (1..=5)
        .rev()
        .map(|i| {
            json!({
                "id": i.to_string(),
                "username": format!("user{i}"),
                "discriminator": "0",
                "avatar": "https://cdn.example/avatar.png",
                "text": "farmed all night",
                "createdAt": "2025-01-01T12:00:00Z",
            })
        })
        .take(limit)
        .collect();
    Json(json!({ "vouches": all }))
}

async fn stats() -> Json<Value> {
    Json(json!({ "total_gold": "3.4B", "total_elixir": "2.9B", "total_walls": 812, "total_users": "77" }))
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client_for(app: Router) -> HttpFeedClient {
    let base = serve(app).await;
    HttpFeedClient::new(FeedConfig {
        api_url: base.clone(),
        vouch_url: format!("{base}/vouches"),
        ..FeedConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_vouches_sends_limit() {
    let client = client_for(Router::new().route("/vouches", get(vouches))).await;

    let fetched = client.fetch_vouches(3).await.unwrap();
    let ids: Vec<&str> = fetched.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["5", "4", "3"]);
}

#[tokio::test]
async fn test_feed_refresh_over_http() {
    let client = client_for(Router::new().route("/vouches", get(vouches))).await;
    let mut feed = VouchFeed::new(Arc::new(client)).with_limit(2);

    let inserted = feed.refresh().await.unwrap();
    assert_eq!(inserted, vec!["5", "4"]);
    assert!(!feed.board().is_loading());
}

#[tokio::test]
async fn test_non_array_vouches_is_empty() {
    let app = Router::new().route("/vouches", get(|| async { Json(json!({ "vouches": { "oops": 1 } })) }));
    let client = client_for(app).await;

    assert!(client.fetch_vouches(20).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_stats_fills_defaults() {
    let client = client_for(Router::new().route("/api/v1/stats", get(stats))).await;

    let stats = client.fetch_stats().await.unwrap();
    assert_eq!(stats.gold, "3.4B");
    assert_eq!(stats.walls, "812");
    assert_eq!(stats.runtime, "0h-0m");
    assert_eq!(stats.users, "77");
}

#[tokio::test]
async fn test_stats_failure_falls_back() {
    let app = Router::new().route("/api/v1/stats", get(|| async { StatusCode::BAD_GATEWAY }));
    let client = client_for(app).await;

    let err = client.fetch_stats().await.unwrap_err();
    assert!(matches!(err, FeedError::Http { status: 502, .. }));
    assert!(err.is_retryable());

    assert_eq!(stats_or_default(&client).await, GlobalStats::default());
}
