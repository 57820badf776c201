//! Stores — single sources of truth for the feed and for station data.
//!
//! Both follow the same pattern: plain data behind an `Arc<RwLock>`, cloned
//! handles everywhere, async accessors that return owned snapshots.  The feed
//! store persists to a JSON file in the data dir so comments survive daemon
//! restarts.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use dock_proto::model::{Comment, Reply};
use dock_proto::station::{
    Granularity, RestComment, Snapshot, Station, StationDetail, StationSummary, TrendPoint,
    TrendResponse,
};

// ── Feed store ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredComment {
    pub id: i64,
    pub station_id: i64,
    pub user: String,
    pub content: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReply {
    pub id: i64,
    pub comment_id: i64,
    pub user: String,
    pub content: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FeedData {
    next_id: i64,
    comments: Vec<StoredComment>,
    replies: Vec<StoredReply>,
}

/// What a `delete` command actually removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Comment,
    Reply,
    NotFound,
}

#[derive(Clone)]
pub struct FeedStore {
    data: Arc<RwLock<FeedData>>,
    state_file: PathBuf,
}

impl FeedStore {
    pub fn new(state_file: PathBuf) -> Self {
        let data = Self::load_from(&state_file);
        Self {
            data: Arc::new(RwLock::new(data)),
            state_file,
        }
    }

    fn load_from(path: &PathBuf) -> FeedData {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<FeedData>(&content) {
                Ok(mut data) => {
                    if data.next_id == 0 {
                        data.next_id = 1;
                    }
                    data
                }
                Err(e) => {
                    warn!("Failed to parse feed state {}: {}", path.display(), e);
                    FeedData {
                        next_id: 1,
                        ..Default::default()
                    }
                }
            },
            Err(_) => FeedData {
                next_id: 1,
                ..Default::default()
            },
        }
    }

    async fn save(&self) {
        let data = self.data.read().await.clone();
        if let Some(parent) = self.state_file.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_vec_pretty(&data) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&self.state_file, bytes) {
                    warn!("Failed to write feed state: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize feed state: {}", e),
        }
    }

    pub async fn add_comment(&self, station_id: i64, user: &str, text: &str) -> i64 {
        let id = {
            let mut data = self.data.write().await;
            let id = data.next_id;
            data.next_id += 1;
            data.comments.push(StoredComment {
                id,
                station_id,
                user: user.to_string(),
                content: text.to_string(),
                created: Utc::now(),
            });
            id
        };
        self.save().await;
        id
    }

    /// Append a reply.  Returns `None` when the parent comment does not exist.
    pub async fn add_reply(&self, comment_id: i64, user: &str, text: &str) -> Option<i64> {
        let id = {
            let mut data = self.data.write().await;
            if !data.comments.iter().any(|c| c.id == comment_id) {
                return None;
            }
            let id = data.next_id;
            data.next_id += 1;
            data.replies.push(StoredReply {
                id,
                comment_id,
                user: user.to_string(),
                content: text.to_string(),
                created: Utc::now(),
            });
            id
        };
        self.save().await;
        Some(id)
    }

    /// Remove a comment (and its replies) or a reply by id.  No ownership
    /// check — any connected client may delete anything.
    pub async fn delete(&self, id: i64) -> DeleteOutcome {
        let outcome = {
            let mut data = self.data.write().await;
            if data.comments.iter().any(|c| c.id == id) {
                data.comments.retain(|c| c.id != id);
                data.replies.retain(|r| r.comment_id != id);
                DeleteOutcome::Comment
            } else if data.replies.iter().any(|r| r.id == id) {
                data.replies.retain(|r| r.id != id);
                DeleteOutcome::Reply
            } else {
                DeleteOutcome::NotFound
            }
        };
        if outcome != DeleteOutcome::NotFound {
            self.save().await;
        }
        outcome
    }

    /// Full comment list in broadcast shape.  Broadcast globally; clients
    /// filter by station.
    pub async fn comment_list(&self) -> Vec<Comment> {
        let data = self.data.read().await;
        data.comments
            .iter()
            .map(|c| Comment {
                id: c.id,
                content: c.content.clone(),
                commentor: c.user.clone(),
                commented_to_id: c.station_id,
                name: c.user.clone(),
                creation_time: c.created.format("%Y-%m-%d %H:%M:%S").to_string(),
            })
            .collect()
    }

    /// Full reply list in broadcast shape.
    pub async fn reply_list(&self) -> Vec<Reply> {
        let data = self.data.read().await;
        data.replies
            .iter()
            .map(|r| Reply {
                id: r.id,
                content: r.content.clone(),
                replier: r.user.clone(),
                replied_to_id: r.comment_id,
                name: r.user.clone(),
                creation_time: r.created.format("%Y-%m-%d %H:%M:%S").to_string(),
            })
            .collect()
    }

    /// Most recent `limit` comments for one station, REST shape, newest first.
    pub async fn recent_comments(&self, station_id: i64, limit: usize) -> Vec<RestComment> {
        let data = self.data.read().await;
        let mut comments: Vec<&StoredComment> = data
            .comments
            .iter()
            .filter(|c| c.station_id == station_id)
            .collect();
        comments.sort_by(|a, b| b.created.cmp(&a.created));
        comments
            .into_iter()
            .take(limit)
            .map(|c| RestComment {
                id: c.id,
                author: c.user.clone(),
                content: c.content.clone(),
                time: c.created.format("%H:%M").to_string(),
            })
            .collect()
    }
}

// ── Station store ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct StationData {
    stations: Vec<Station>,
    snapshots: Vec<Snapshot>,
    next_station_id: i64,
}

#[derive(Clone)]
pub struct StationStore {
    data: Arc<RwLock<StationData>>,
}

impl StationStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(StationData {
                next_station_id: 1,
                ..Default::default()
            })),
        }
    }

    /// Insert or update a station, keyed by name (the upstream API has no
    /// stable ids).  Returns the station id.
    pub async fn upsert_station(&self, name: &str, latitude: f64, longitude: f64, slots: i64) -> i64 {
        let mut data = self.data.write().await;
        if let Some(existing) = data.stations.iter_mut().find(|s| s.name == name) {
            existing.latitude = latitude;
            existing.longitude = longitude;
            existing.slots = slots;
            existing.id
        } else {
            let id = data.next_station_id;
            data.next_station_id += 1;
            data.stations.push(Station {
                id,
                name: name.to_string(),
                latitude,
                longitude,
                slots,
            });
            id
        }
    }

    pub async fn add_snapshot(&self, snapshot: Snapshot) {
        let mut data = self.data.write().await;
        // One row per station per timestamp.
        if data
            .snapshots
            .iter()
            .any(|s| s.station_id == snapshot.station_id && s.timestamp == snapshot.timestamp)
        {
            return;
        }
        data.snapshots.push(snapshot);
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.stations.is_empty()
    }

    pub async fn stations(&self) -> Vec<Station> {
        self.data.read().await.stations.clone()
    }

    /// Latest (free_bikes, empty_slots) for a station, from the newest
    /// snapshot.  `None` when the station has never been scraped.
    async fn latest_counts(&self, station_id: i64) -> Option<(i64, i64)> {
        let data = self.data.read().await;
        data.snapshots
            .iter()
            .filter(|s| s.station_id == station_id)
            .max_by_key(|s| s.timestamp)
            .map(|s| (s.free_bikes, s.empty_slots))
    }

    pub async fn summaries(&self) -> Vec<StationSummary> {
        let stations = {
            let mut stations = self.data.read().await.stations.clone();
            stations.sort_by(|a, b| a.name.cmp(&b.name));
            stations
        };
        let mut out = Vec::with_capacity(stations.len());
        for station in &stations {
            let (free, empty) = match self.latest_counts(station.id).await {
                Some(counts) => counts,
                // No logs yet: zero bikes, assume all slots empty.
                None => (0, station.slots.max(0)),
            };
            out.push(StationSummary::from_counts(station, free, empty));
        }
        out
    }

    pub async fn detail(&self, station_id: i64) -> Option<StationDetail> {
        let station = {
            let data = self.data.read().await;
            data.stations.iter().find(|s| s.id == station_id).cloned()?
        };
        let (free, empty) = self
            .latest_counts(station_id)
            .await
            .unwrap_or((0, station.slots.max(0)));
        let summary = StationSummary::from_counts(&station, free, empty);
        Some(StationDetail {
            id: summary.id,
            name: summary.name,
            slots: summary.slots,
            free_bikes: summary.free_bikes,
            empty_slots: summary.empty_slots,
            pct_full: summary.pct_full,
        })
    }

    pub async fn station_exists(&self, station_id: i64) -> bool {
        let data = self.data.read().await;
        data.stations.iter().any(|s| s.id == station_id)
    }

    pub async fn trend(&self, station_id: i64, now: DateTime<Utc>) -> TrendResponse {
        let snapshots = {
            let data = self.data.read().await;
            data.snapshots
                .iter()
                .filter(|s| s.station_id == station_id)
                .cloned()
                .collect::<Vec<_>>()
        };
        compute_trend(&snapshots, now)
    }
}

impl Default for StationStore {
    fn default() -> Self {
        Self::new()
    }
}

// ── Trend bucketing ───────────────────────────────────────────────────────────

fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(ts.year(), ts.month(), ts.day(), ts.hour(), 0, 0)
        .single()
        .unwrap_or(ts)
}

fn truncate_to_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(ts.year(), ts.month(), ts.day(), 0, 0, 0)
        .single()
        .unwrap_or(ts)
}

/// Hourly averages of free bikes over the last 24 hours; when that window is
/// empty, fall back to one averaged point per day over the whole history.
pub fn compute_trend(snapshots: &[Snapshot], now: DateTime<Utc>) -> TrendResponse {
    let window_start = now - Duration::hours(24);

    let hourly = bucket_average(
        snapshots
            .iter()
            .filter(|s| s.timestamp >= window_start && s.timestamp < now),
        truncate_to_hour,
    );
    if !hourly.is_empty() {
        return TrendResponse {
            granularity: Granularity::Hour,
            series: hourly,
        };
    }

    TrendResponse {
        granularity: Granularity::Day,
        series: bucket_average(snapshots.iter(), truncate_to_day),
    }
}

fn bucket_average<'a>(
    snapshots: impl Iterator<Item = &'a Snapshot>,
    bucket: fn(DateTime<Utc>) -> DateTime<Utc>,
) -> Vec<TrendPoint> {
    use std::collections::BTreeMap;
    let mut sums: BTreeMap<DateTime<Utc>, (f64, u32)> = BTreeMap::new();
    for s in snapshots {
        let entry = sums.entry(bucket(s.timestamp)).or_insert((0.0, 0));
        entry.0 += s.free_bikes as f64;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(ts, (sum, count))| TrendPoint {
            ts,
            free: sum / count as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(station_id: i64, ts: DateTime<Utc>, free: i64) -> Snapshot {
        Snapshot {
            station_id,
            timestamp: ts,
            free_bikes: free,
            empty_slots: 10 - free,
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 22, h, m, 0).unwrap()
    }

    #[test]
    fn test_trend_hourly_averages() {
        let now = at(12, 0);
        let snapshots = vec![
            snap(1, at(9, 0), 4),
            snap(1, at(9, 30), 6),
            snap(1, at(10, 15), 2),
        ];
        let trend = compute_trend(&snapshots, now);
        assert_eq!(trend.granularity, Granularity::Hour);
        assert_eq!(trend.series.len(), 2);
        assert_eq!(trend.series[0].ts, at(9, 0));
        assert!((trend.series[0].free - 5.0).abs() < f64::EPSILON);
        assert!((trend.series[1].free - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trend_daily_fallback() {
        let now = at(12, 0);
        // Everything older than the 24h window.
        let old = Utc.with_ymd_and_hms(2026, 8, 19, 8, 0, 0).unwrap();
        let older = Utc.with_ymd_and_hms(2026, 8, 19, 20, 0, 0).unwrap();
        let trend = compute_trend(&[snap(1, old, 2), snap(1, older, 6)], now);
        assert_eq!(trend.granularity, Granularity::Day);
        assert_eq!(trend.series.len(), 1);
        assert!((trend.series[0].free - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trend_empty() {
        let trend = compute_trend(&[], at(12, 0));
        assert_eq!(trend.granularity, Granularity::Day);
        assert!(trend.series.is_empty());
    }

    #[tokio::test]
    async fn test_feed_store_roundtrip() {
        let state_file = std::env::temp_dir().join(format!(
            "velodock-test-feed-{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&state_file);
        let store = FeedStore::new(state_file.clone());

        let comment_id = store.add_comment(42, "alice", "needs bikes").await;
        let reply_id = store.add_reply(comment_id, "bob", "agreed").await.unwrap();
        assert_ne!(comment_id, reply_id);

        // Reply to a missing parent is refused.
        assert!(store.add_reply(9999, "bob", "orphan").await.is_none());

        let comments = store.comment_list().await;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].commentor, "alice");
        assert_eq!(comments[0].commented_to_id, 42);

        // Deleting the comment takes its replies with it.
        assert_eq!(store.delete(comment_id).await, DeleteOutcome::Comment);
        assert!(store.comment_list().await.is_empty());
        assert!(store.reply_list().await.is_empty());
        assert_eq!(store.delete(comment_id).await, DeleteOutcome::NotFound);

        let _ = std::fs::remove_file(&state_file);
    }

    #[tokio::test]
    async fn test_station_store_summaries() {
        let store = StationStore::new();
        let id = store.upsert_station("Forbes & Murray", 40.4, -79.9, 16).await;
        // Upsert by name does not duplicate.
        let same = store.upsert_station("Forbes & Murray", 40.5, -79.9, 16).await;
        assert_eq!(id, same);

        // No snapshots yet: zero bikes, all slots assumed empty.
        let summaries = store.summaries().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].free_bikes, 0);
        assert_eq!(summaries[0].pct_full, 0);

        store
            .add_snapshot(snap(id, Utc::now(), 8))
            .await;
        let summaries = store.summaries().await;
        assert_eq!(summaries[0].free_bikes, 8);
    }
}
