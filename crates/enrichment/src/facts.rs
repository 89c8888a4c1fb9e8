//! Per-enricher output shapes, merged into `Record`s by `Operations::load`
//! after all four enrichers have run concurrently (spec §4.2: each
//! enricher owns a disjoint set of `Record` fields).

use chrono::{DateTime, Utc};
use librarian_core::models::UserWatch;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct WatchFacts {
    pub user_watch: HashMap<String, UserWatch>,
}

#[derive(Debug, Clone)]
pub struct RequestFacts {
    pub requested_by: String,
    pub requested_by_email: String,
    pub requested_at: Option<DateTime<Utc>>,
    pub request_status: librarian_core::models::RequestStatus,
    pub approved_by: Option<String>,
    pub is_auto_request: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct HardlinkFacts {
    pub hardlink_count: u32,
}

#[derive(Debug, Clone)]
pub struct TorrentFacts {
    pub torrent_hash: String,
    pub is_seeding: bool,
}
