//! Per-user watch facts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user's watch history for a single movie.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserWatch {
    pub watched: bool,
    pub watch_count: u64,
    pub last_watched_at: Option<DateTime<Utc>>,
    pub max_progress: f64,
}

impl UserWatch {
    /// A user crosses the "watched" threshold when `percent_complete` meets
    /// the library's configured minimum, OR the tracker's own
    /// `watched_status` flag is at least 0.9 (spec §4.2, WatchEnricher).
    pub fn crosses_threshold(percent_complete: f64, watched_status: f64, min_percent: f64) -> bool {
        percent_complete >= min_percent || watched_status >= 0.9
    }
}
