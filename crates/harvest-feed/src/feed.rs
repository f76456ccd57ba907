//! Vouch Feed
//!
//! Keeps a [`VouchBoard`] up to date from a [`FeedApi`], once or on a timer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::client::FeedApi;
use crate::error::Result;
use crate::vouch::{DEFAULT_CAPACITY, Vouch, VouchBoard};

/// Default time between refreshes while watching
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

pub struct VouchFeed {
    api: Arc<dyn FeedApi>,
    board: VouchBoard,
    limit: usize,
}

impl VouchFeed {
    pub fn new(api: Arc<dyn FeedApi>) -> Self {
        Self {
            api,
            board: VouchBoard::default(),
            limit: DEFAULT_CAPACITY,
        }
    }

    /// Request `limit` vouches per refresh and keep as many on the board
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self.board = VouchBoard::new(limit);
        self
    }

    pub fn board(&self) -> &VouchBoard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut VouchBoard {
        &mut self.board
    }

    /// Fetch once and merge. Returns the inserted ids.
    ///
    /// On failure the board keeps what it had; loading still ends.
    pub async fn refresh(&mut self) -> Result<Vec<String>> {
        match self.api.fetch_vouches(self.limit).await {
            Ok(batch) => {
                let inserted = self.board.merge(batch);
                tracing::debug!(inserted = inserted.len(), total = self.board.len(), "Vouches refreshed");
                Ok(inserted)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load vouches");
                self.board.finish_loading();
                Err(e)
            }
        }
    }

    /// Refresh every `period` until `cancel` resolves.
    ///
    /// The first refresh happens one `period` from now, so callers usually
    /// [`refresh`](Self::refresh) once before watching. `on_arrivals`
    /// receives the vouches that arrived since the previous call.
    pub async fn watch<C, F>(&mut self, period: Duration, cancel: C, mut on_arrivals: F)
    where
        C: Future<Output = ()>,
        F: FnMut(&[Vouch]),
    {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(cancel);

        loop {
            tokio::select! {
                () = &mut cancel => {
                    tracing::debug!("Vouch watch stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if self.refresh().await.is_ok() {
                        let arrivals = self.board.take_new();
                        if !arrivals.is_empty() {
                            on_arrivals(&arrivals);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::error::FeedError;
    use crate::stats::GlobalStats;

    /// Serves one scripted batch per call; `None` fails the call
    struct ScriptedFeed {
        batches: Mutex<VecDeque<Option<Vec<Vouch>>>>,
    }

    impl ScriptedFeed {
        fn new(batches: Vec<Option<Vec<&str>>>) -> Arc<Self> {
            let batches = batches
                .into_iter()
                .map(|b| b.map(|ids| ids.into_iter().map(vouch).collect()))
                .collect();
            Arc::new(Self {
                batches: Mutex::new(batches),
            })
        }
    }

    #[async_trait]
    impl FeedApi for ScriptedFeed {
        async fn fetch_vouches(&self, _limit: usize) -> Result<Vec<Vouch>> {
            match self.batches.lock().await.pop_front() {
                Some(Some(batch)) => Ok(batch),
                Some(None) => Err(FeedError::Network("connection reset".into())),
                None => Ok(Vec::new()),
            }
        }

        async fn fetch_stats(&self) -> Result<GlobalStats> {
            Ok(GlobalStats::default())
        }
    }

    fn vouch(id: &str) -> Vouch {
        Vouch {
            id: id.into(),
            name: String::new(),
            username: "farmer".into(),
            discriminator: String::new(),
            avatar: String::new(),
            text: "legit".into(),
            created_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_board() {
        let api = ScriptedFeed::new(vec![Some(vec!["1"]), None]);
        let mut feed = VouchFeed::new(api);

        feed.refresh().await.unwrap();
        assert!(feed.refresh().await.is_err());
        assert_eq!(feed.board().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_first_load_ends_loading() {
        let api = ScriptedFeed::new(vec![None]);
        let mut feed = VouchFeed::new(api);

        assert!(feed.board().is_loading());
        assert!(feed.refresh().await.is_err());
        assert!(!feed.board().is_loading());
        assert!(feed.board().is_empty());
    }

    #[tokio::test]
    async fn test_first_success_after_failure_reports_no_arrivals() {
        let api = ScriptedFeed::new(vec![None, Some(vec!["2", "1"]), Some(vec!["3", "2", "1"])]);
        let mut feed = VouchFeed::new(api);

        assert!(feed.refresh().await.is_err());
        feed.refresh().await.unwrap();
        assert!(feed.board_mut().take_new().is_empty());

        feed.refresh().await.unwrap();
        let arrivals: Vec<String> = feed.board_mut().take_new().into_iter().map(|v| v.id).collect();
        assert_eq!(arrivals, vec!["3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_reports_arrivals() {
        let api = ScriptedFeed::new(vec![
            Some(vec!["1"]),
            Some(vec!["2", "1"]),
            None,
            Some(vec!["3", "2", "1"]),
        ]);
        let mut feed = VouchFeed::new(api);
        let mut seen: Vec<String> = Vec::new();
        feed.refresh().await.unwrap();

        let period = Duration::from_secs(30);
        feed.watch(period, tokio::time::sleep(period * 3 + Duration::from_secs(1)), |arrivals| {
            seen.extend(arrivals.iter().map(|v| v.id.clone()));
        })
        .await;

        assert_eq!(seen, vec!["2", "3"]);
        assert_eq!(feed.board().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_waits_a_period_before_refreshing() {
        let api = ScriptedFeed::new(vec![Some(vec!["1"]), Some(vec!["2", "1"])]);
        let mut feed = VouchFeed::new(api.clone());
        feed.refresh().await.unwrap();

        let period = Duration::from_secs(30);
        feed.watch(period, tokio::time::sleep(period - Duration::from_secs(1)), |_| {})
            .await;

        assert_eq!(api.batches.lock().await.len(), 1);
        assert_eq!(feed.board().len(), 1);
    }
}
