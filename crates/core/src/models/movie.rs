//! The movie record and its nested value types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::RequestStatus;
use super::torrent::TorrentCandidate;
use super::watch::UserWatch;

/// The file backing a movie, once imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieFile {
    pub id: i64,
    pub path: String,
    pub size: u64,
    pub imported_at: DateTime<Utc>,
    pub custom_format_score: i32,
    pub custom_format_ids: Vec<i64>,
}

/// One movie in the catalog, enriched in place by the pipeline (spec §3).
///
/// `file_imported_at.is_none()` excludes the record from filter evaluation
/// and from delete pipelines — see [`Record::is_eligible`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    // identity
    pub id: i64,
    pub imdb_id: String,
    pub tmdb_id: String,
    pub title: String,
    pub year: i32,

    // filesystem
    pub path: String,
    pub file: Option<MovieFile>,
    pub has_file: bool,

    // tags
    pub tag_ids: Vec<i64>,
    pub tags: Vec<String>,

    // timestamps
    pub added_at: DateTime<Utc>,
    pub file_imported_at: Option<DateTime<Utc>>,

    // ratings
    pub ratings: HashMap<String, f64>,
    pub popularity: f64,

    // availability facts (spec §4.3.3 upgrade search)
    pub monitored: bool,
    pub available: bool,
    pub digital_release: Option<DateTime<Utc>>,
    pub physical_release: Option<DateTime<Utc>>,
    pub in_cinemas: Option<DateTime<Utc>>,

    // aggregate watch facts
    pub watched: bool,
    pub watch_count: u64,
    pub last_watched_at: Option<DateTime<Utc>>,
    pub watch_progress: f64,
    pub user_watch: HashMap<String, UserWatch>,

    // request facts
    pub is_requested: bool,
    pub requested_by: String,
    pub requested_by_email: String,
    pub requested_at: Option<DateTime<Utc>>,
    pub request_status: RequestStatus,
    pub approved_by: Option<String>,
    pub is_auto_request: bool,

    // hardlink facts
    pub hardlink_count: u32,
    pub is_hardlinked: bool,

    // torrent facts
    pub torrent_hash: Option<String>,
    pub is_seeding: bool,
    pub alternate_torrents: Vec<TorrentCandidate>,
}

impl Record {
    /// A bare record from catalog + tag data, before any enricher has run.
    pub fn new(id: i64, imdb_id: String, tmdb_id: String, title: String, year: i32) -> Self {
        Self {
            id,
            imdb_id,
            tmdb_id,
            title,
            year,
            path: String::new(),
            file: None,
            has_file: false,
            tag_ids: Vec::new(),
            tags: Vec::new(),
            added_at: Utc::now(),
            file_imported_at: None,
            ratings: HashMap::new(),
            popularity: 0.0,
            monitored: false,
            available: false,
            digital_release: None,
            physical_release: None,
            in_cinemas: None,
            watched: false,
            watch_count: 0,
            last_watched_at: None,
            watch_progress: 0.0,
            user_watch: HashMap::new(),
            is_requested: false,
            requested_by: String::new(),
            requested_by_email: String::new(),
            requested_at: None,
            request_status: RequestStatus::Unknown,
            approved_by: None,
            is_auto_request: false,
            hardlink_count: 0,
            is_hardlinked: false,
            torrent_hash: None,
            is_seeding: false,
            alternate_torrents: Vec::new(),
        }
    }

    /// Records without an imported file are never subjects of filter
    /// evaluation or delete (spec §3 invariant).
    pub fn is_eligible(&self) -> bool {
        self.file_imported_at.is_some()
    }

    /// Recomputes the three watch aggregates from `user_watch` (spec §3
    /// invariants 2). Enrichers call this after populating per-user facts
    /// rather than maintaining the aggregates by hand.
    pub fn recompute_watch_aggregates(&mut self) {
        self.watched = self.user_watch.values().any(|u| u.watched);
        self.watch_count = self.user_watch.values().map(|u| u.watch_count).sum();
        self.watch_progress = self
            .user_watch
            .values()
            .map(|u| u.max_progress)
            .fold(0.0, f64::max);
        self.last_watched_at = self.user_watch.values().filter_map(|u| u.last_watched_at).max();
    }

    /// Recomputes `is_hardlinked` from `hardlink_count` (spec §3 invariant 1).
    pub fn recompute_hardlink_flag(&mut self) {
        self.is_hardlinked = self.hardlink_count > 1;
    }

    pub fn has_tag(&self, label: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(label))
    }
}
