//! Plain value types for the movie record and its nested facts (spec §3).

pub mod movie;
pub mod request;
pub mod torrent;
pub mod watch;

pub use movie::{MovieFile, Record};
pub use request::RequestStatus;
pub use torrent::{TorrentCandidate, TorrentListing, TorrentState};
pub use watch::UserWatch;

use serde::{Deserialize, Serialize};

/// A catalog tag: an id plus its denormalized label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

/// A catalog custom format: an id plus its name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFormat {
    pub id: i64,
    pub name: String,
}

/// The raw movie row as the catalog reports it, before enrichment builds a
/// [`Record`] from it (spec §6, `Catalog::list_movies`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogMovie {
    pub id: i64,
    pub imdb_id: String,
    pub tmdb_id: String,
    pub title: String,
    pub year: i32,
    pub path: String,
    pub tag_ids: Vec<i64>,
    pub added_at: chrono::DateTime<chrono::Utc>,
    pub file: Option<MovieFile>,
    pub ratings: std::collections::HashMap<String, f64>,
    pub popularity: f64,
    pub monitored: bool,
    pub available: bool,
    pub digital_release: Option<chrono::DateTime<chrono::Utc>>,
    pub physical_release: Option<chrono::DateTime<chrono::Utc>>,
    pub in_cinemas: Option<chrono::DateTime<chrono::Utc>>,
}
