//! Placeholder collaborator clients.
//!
//! Concrete HTTP clients for the catalog, watch tracker, request tracker,
//! and torrent client are explicitly out of scope for this engine (spec
//! §1) — only their trait contracts live in `librarian_core::collaborators`.
//! This stub satisfies those contracts so the binary wires together and
//! fails loudly, rather than leaving the CLI unable to construct an
//! `Operations`/executor at all. Swap it for a real client per
//! collaborator when one is available.

use async_trait::async_trait;
use librarian_core::collaborators::{
    CatalogClient, CommandStatus, HardlinkStat, ImportCandidate, ImportCommand, RequestEntry,
    RequestTrackerClient, WatchHistoryEntry, WatchTrackerClient,
};
use librarian_core::error::{CollaboratorErrorKind, LibraryError};
use librarian_core::models::{CatalogMovie, CustomFormat, Tag, TorrentListing};
use librarian_core::Result;

pub struct Unconfigured {
    pub service: &'static str,
}

impl Unconfigured {
    fn err<T>(&self) -> Result<T> {
        Err(LibraryError::collaborator(
            self.service,
            "no HTTP client configured for this collaborator",
            CollaboratorErrorKind::Authentication,
        ))
    }
}

#[async_trait]
impl CatalogClient for Unconfigured {
    async fn list_movies(&self) -> Result<Vec<CatalogMovie>> {
        self.err()
    }
    async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.err()
    }
    async fn delete_movie(&self, _id: i64, _delete_files: bool) -> Result<()> {
        self.err()
    }
    async fn delete_files(&self, _file_ids: &[i64]) -> Result<()> {
        self.err()
    }
    async fn get_custom_formats(&self) -> Result<Vec<CustomFormat>> {
        self.err()
    }
    async fn update_movie(&self, _id: i64, _movie: &CatalogMovie, _move_files: bool) -> Result<()> {
        self.err()
    }
    async fn send_search_command(&self, _movie_ids: &[i64]) -> Result<CommandStatus> {
        self.err()
    }
    async fn manual_import_scan(
        &self,
        _folder: &str,
        _movie_id: Option<i64>,
        _filter_existing: bool,
    ) -> Result<Vec<ImportCandidate>> {
        self.err()
    }
    async fn manual_import_apply(&self, _command: ImportCommand) -> Result<()> {
        self.err()
    }
}

#[async_trait]
impl WatchTrackerClient for Unconfigured {
    async fn get_history(&self, _length: usize) -> Result<Vec<WatchHistoryEntry>> {
        self.err()
    }
}

#[async_trait]
impl RequestTrackerClient for Unconfigured {
    async fn list_requests(&self, _skip: usize, _take: usize) -> Result<Vec<RequestEntry>> {
        self.err()
    }
}

#[async_trait]
impl TorrentClient for Unconfigured {
    async fn list_torrents(&self) -> Result<Vec<TorrentListing>> {
        self.err()
    }
    async fn list_files(&self, _hash: &str) -> Result<Vec<String>> {
        self.err()
    }
}

/// Real implementation of the one host capability that *is* in scope: the
/// Unix hardlink count of a file, via `std::fs::Metadata::nlink` (spec §9
/// "filesystem stat in the HardlinkEnricher"). Grounded on
/// `import/src/hardlink_manager.rs`'s stat-based hardlink detection.
pub struct UnixHardlinkStat;

#[async_trait]
impl HardlinkStat for UnixHardlinkStat {
    #[cfg(unix)]
    async fn hardlink_count(&self, path: &str) -> Result<u32> {
        use std::os::unix::fs::MetadataExt;
        let path = path.to_string();
        tokio::task::spawn_blocking(move || std::fs::metadata(&path).map(|m| m.nlink() as u32))
            .await
            .map_err(|e| LibraryError::FileSystem {
                path: "<join>".to_string(),
                message: e.to_string(),
            })?
            .map_err(|e| LibraryError::FileSystem {
                path: "<stat>".to_string(),
                message: e.to_string(),
            })
    }

    #[cfg(not(unix))]
    async fn hardlink_count(&self, _path: &str) -> Result<u32> {
        Ok(0)
    }
}
