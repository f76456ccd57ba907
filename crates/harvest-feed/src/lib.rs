//! # harvest-feed
//!
//! Community side of the Harvest Bot storefront: the live vouch feed from
//! the Discord worker and the global farming totals.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use harvest_feed::{FeedConfig, HttpFeedClient, VouchFeed, stats_or_default};
//!
//! let client = Arc::new(HttpFeedClient::new(FeedConfig::default())?);
//! let stats = stats_or_default(client.as_ref()).await;
//!
//! let mut feed = VouchFeed::new(client);
//! feed.refresh().await?;
//! ```

mod client;
mod error;
mod feed;
mod stats;
mod vouch;

pub use client::{DEFAULT_STATS_URL, DEFAULT_VOUCH_URL, FeedApi, FeedConfig, HttpFeedClient, stats_or_default};
pub use error::{FeedError, Result};
pub use feed::{REFRESH_INTERVAL, VouchFeed};
pub use stats::GlobalStats;
pub use vouch::{DEFAULT_CAPACITY, Vouch, VouchBoard, parse_timestamp, time_ago};
