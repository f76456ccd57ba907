//! Vouches
//!
//! Community testimonials pulled from the Discord worker, and the board that
//! keeps the most recent ones for display.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many vouches the board keeps by default
pub const DEFAULT_CAPACITY: usize = 20;

/// A single vouch record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vouch {
    pub id: String,

    /// Server display name; may be empty
    #[serde(default)]
    pub name: String,

    pub username: String,

    #[serde(default)]
    pub discriminator: String,

    /// Avatar image URL
    #[serde(default)]
    pub avatar: String,

    pub text: String,

    /// Timestamp as sent by the worker, see [`parse_timestamp`]
    #[serde(default)]
    pub created_at: String,
}

impl Vouch {
    /// Display name if set, else `username#1234` (or the bare username
    /// for accounts without a discriminator)
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            self.name.clone()
        } else if self.discriminator.is_empty() || self.discriminator == "0" {
            self.username.clone()
        } else {
            format!("{}#{}", self.username, self.discriminator)
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    /// Relative age at `now`; `None` when the timestamp is unreadable
    pub fn age(&self, now: DateTime<Utc>) -> Option<String> {
        self.created_at().map(|at| time_ago(at, now))
    }
}

/// Read a worker timestamp.
///
/// Accepts RFC 3339, offset-less `T` or space separated date-times (taken as
/// UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    const OFFSET_FORMATS: [&str; 1] = ["%Y-%m-%d %H:%M:%S%.f%#z"];
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Some(at) = OFFSET_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(raw, f).ok())
    {
        return Some(at.with_timezone(&Utc));
    }
    if let Some(at) = NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
    {
        return Some(at.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

/// Most recent vouches, newest first, without duplicate ids
#[derive(Debug)]
pub struct VouchBoard {
    items: VecDeque<Vouch>,
    capacity: usize,
    /// Ids that arrived after the first load and have not been shown yet
    fresh: HashSet<String>,
    /// Display flag: no refresh has finished yet
    loading: bool,
    /// A batch has been merged at least once
    loaded: bool,
}

impl Default for VouchBoard {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl VouchBoard {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            fresh: HashSet::new(),
            loading: true,
            loaded: false,
        }
    }

    /// True until the first refresh finished, successfully or not.
    ///
    /// Ending the loading state does not count as a first load: arrivals
    /// are only marked once a batch has been merged.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn finish_loading(&mut self) {
        self.loading = false;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vouch> {
        self.items.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|v| v.id == id)
    }

    /// Merge a batch from the feed (newest first).
    ///
    /// Unseen ids go to the front in batch order, ids already on the board
    /// are skipped and the board is trimmed to capacity. Returns the ids
    /// that were inserted. After the first merged batch, inserted ids are
    /// also remembered as new arrivals until [`take_new`](Self::take_new).
    pub fn merge(&mut self, batch: Vec<Vouch>) -> Vec<String> {
        let mut seen: HashSet<String> = self.items.iter().map(|v| v.id.clone()).collect();
        let incoming: Vec<Vouch> = batch
            .into_iter()
            .filter(|v| seen.insert(v.id.clone()))
            .collect();

        let inserted: Vec<String> = incoming.iter().map(|v| v.id.clone()).collect();
        for vouch in incoming.into_iter().rev() {
            self.items.push_front(vouch);
        }
        self.items.truncate(self.capacity);

        if self.loaded {
            for id in &inserted {
                if self.contains(id) {
                    self.fresh.insert(id.clone());
                }
            }
        }
        self.fresh.retain(|id| self.items.iter().any(|v| &v.id == id));
        self.loading = false;
        self.loaded = true;

        inserted
    }

    /// Whether `id` arrived since the last [`take_new`](Self::take_new)
    pub fn is_new(&self, id: &str) -> bool {
        self.fresh.contains(id)
    }

    /// New arrivals in board order; each id is reported once
    pub fn take_new(&mut self) -> Vec<Vouch> {
        let arrivals = self
            .items
            .iter()
            .filter(|v| self.fresh.contains(&v.id))
            .cloned()
            .collect();
        self.fresh.clear();
        arrivals
    }
}

/// Short relative age: `42s`, `5m`, `3h`, `2d`
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds().max(0);
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h");
    }
    format!("{}d", hours / 24)
}
