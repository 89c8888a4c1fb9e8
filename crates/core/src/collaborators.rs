//! Narrow contracts the enrichers and executors depend on (spec §6).
//!
//! These are the *only* surface this crate exposes for the four external
//! collaborators and the one host capability; concrete HTTP clients are out
//! of scope (spec §1) and are supplied by callers. The shape follows
//! `radarr_core::domain::repositories` — small `#[async_trait]` traits with
//! `Send + Sync` bounds so they can be shared across enricher tasks as
//! `Arc<dyn Trait>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{CatalogMovie, CustomFormat, Tag, TorrentListing};

/// The movie-management service.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn list_movies(&self) -> Result<Vec<CatalogMovie>>;
    async fn list_tags(&self) -> Result<Vec<Tag>>;
    async fn delete_movie(&self, id: i64, delete_files: bool) -> Result<()>;
    async fn delete_files(&self, file_ids: &[i64]) -> Result<()>;
    async fn get_custom_formats(&self) -> Result<Vec<CustomFormat>>;
    async fn update_movie(&self, id: i64, movie: &CatalogMovie, move_files: bool) -> Result<()>;
    async fn send_search_command(&self, movie_ids: &[i64]) -> Result<CommandStatus>;
    async fn manual_import_scan(
        &self,
        folder: &str,
        movie_id: Option<i64>,
        filter_existing: bool,
    ) -> Result<Vec<ImportCandidate>>;
    async fn manual_import_apply(&self, command: ImportCommand) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct CommandStatus {
    pub id: i64,
    pub status: String,
}

/// One item discovered by a manual-import folder scan (spec §4.3.2).
#[derive(Debug, Clone)]
pub struct ImportCandidate {
    pub path: String,
    pub movie_id: Option<i64>,
    pub quality: String,
    pub languages: Vec<String>,
    pub release_group: Option<String>,
    pub download_id: Option<String>,
    pub custom_format_ids: Vec<i64>,
    pub custom_format_score: i32,
    /// Empty means admissible; non-empty are human-readable rejection
    /// reasons surfaced via the formatter.
    pub rejections: Vec<String>,
}

impl ImportCandidate {
    pub fn is_admissible(&self) -> bool {
        self.rejections.is_empty() && self.movie_id.is_some()
    }
}

/// The command built from an admissible [`ImportCandidate`] (spec §4.3.2).
#[derive(Debug, Clone)]
pub struct ImportCommand {
    pub movie_id: i64,
    pub path: String,
    pub mode: ImportMode,
    pub quality: String,
    pub languages: Vec<String>,
    pub release_group: Option<String>,
    pub download_id: Option<String>,
    pub custom_format_ids: Vec<i64>,
    pub custom_format_score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Move,
    Copy,
}

/// A single watch-history record as the tracker reports it (spec §6).
#[derive(Debug, Clone)]
pub struct WatchHistoryEntry {
    pub user: String,
    pub imdb_id: Option<String>,
    pub title: String,
    pub date: DateTime<Utc>,
    pub percent_complete: f64,
    pub watched_status: f64,
}

#[async_trait]
pub trait WatchTrackerClient: Send + Sync {
    async fn get_history(&self, length: usize) -> Result<Vec<WatchHistoryEntry>>;
}

/// One request as the request tracker reports it (spec §6).
#[derive(Debug, Clone)]
pub struct RequestEntry {
    pub id: i64,
    pub status_code: i32,
    pub created_at: DateTime<Utc>,
    pub is_auto_request: bool,
    pub requested_by: String,
    pub requested_by_email: String,
    pub modified_by: Option<String>,
    pub tmdb_id: String,
}

#[async_trait]
pub trait RequestTrackerClient: Send + Sync {
    async fn list_requests(&self, skip: usize, take: usize) -> Result<Vec<RequestEntry>>;
}

#[async_trait]
pub trait TorrentClient: Send + Sync {
    async fn list_torrents(&self) -> Result<Vec<TorrentListing>>;
    async fn list_files(&self, hash: &str) -> Result<Vec<String>>;
}

/// Host capability: the Unix `st_nlink` of a `stat`, abstracted so
/// non-Unix platforms can report "unsupported" instead of failing (spec §9).
#[async_trait]
pub trait HardlinkStat: Send + Sync {
    async fn hardlink_count(&self, path: &str) -> Result<u32>;
}
