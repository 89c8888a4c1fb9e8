//! `Operations::load`: the enrichment pipeline entry point (spec §4.2).
//!
//! Fetches the catalog and tags, builds the eligible record set, then fans
//! the four enrichers out concurrently and merges whichever of them
//! succeeded. Grounded on `core/src/jobs/list_sync.rs`'s fan-out sync job,
//! which tolerates a failing source rather than aborting the whole sync.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use librarian_core::collaborators::{CatalogClient, HardlinkStat, RequestTrackerClient, TorrentClient, WatchTrackerClient};
use librarian_core::models::{CatalogMovie, Record, Tag};
use librarian_core::ttl_cache::TtlCache;
use librarian_core::{CollaboratorErrorKind, LibraryError, Result};
use tracing::warn;

use crate::hardlink::HardlinkEnricher;
use crate::request::RequestEnricher;
use crate::torrent::TorrentEnricher;
use crate::watch::WatchEnricher;

const TAG_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

pub struct Operations {
    catalog: Arc<dyn CatalogClient>,
    watch: WatchEnricher,
    request: RequestEnricher,
    hardlink: HardlinkEnricher,
    torrent: TorrentEnricher,
    tag_cache: TtlCache<Vec<Tag>>,
}

impl Operations {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        watch_tracker: Arc<dyn WatchTrackerClient>,
        request_tracker: Arc<dyn RequestTrackerClient>,
        torrent_client: Arc<dyn TorrentClient>,
        hardlink_stat: Arc<dyn HardlinkStat>,
        min_watch_percent: f64,
    ) -> Self {
        Self {
            catalog,
            watch: WatchEnricher::new(watch_tracker, min_watch_percent),
            request: RequestEnricher::new(request_tracker),
            hardlink: HardlinkEnricher::new(hardlink_stat),
            torrent: TorrentEnricher::new(torrent_client),
            tag_cache: TtlCache::new(TAG_CACHE_TTL),
        }
    }

    /// Builds the full enriched record set: catalog fetch, tag resolution,
    /// eligibility filter, then the four enrichers concurrently.
    pub async fn load(&self) -> Result<Vec<Record>> {
        let movies = self.catalog.list_movies().await?;
        let tags = {
            let catalog = self.catalog.clone();
            self.tag_cache
                .get_or_refresh(|| async move { catalog.list_tags().await })
                .await?
        };
        let tag_lookup: HashMap<i64, String> =
            tags.into_iter().map(|t| (t.id, t.label)).collect();

        let mut records: Vec<Record> = movies
            .into_iter()
            .map(|movie| build_record(movie, &tag_lookup))
            .filter(Record::is_eligible)
            .collect();

        let (watch_facts, request_facts, hardlink_facts, torrent_facts) = tokio::join!(
            self.watch.compute(&records),
            self.request.compute(&records),
            self.hardlink.compute(&records),
            self.torrent.compute(&records),
        );

        if watch_facts.is_err() && request_facts.is_err() && hardlink_facts.is_err() && torrent_facts.is_err() {
            return Err(LibraryError::collaborator(
                "enrichment",
                "every enricher failed; no partial data available",
                CollaboratorErrorKind::Transient,
            ));
        }

        let watch_facts = log_and_default(watch_facts, "watch");
        let request_facts = log_and_default(request_facts, "request");
        let hardlink_facts = log_and_default(hardlink_facts, "hardlink");
        let torrent_facts = log_and_default(torrent_facts, "torrent");

        for record in &mut records {
            if let Some(facts) = watch_facts.get(&record.id) {
                record.user_watch = facts.user_watch.clone();
                record.recompute_watch_aggregates();
            }
            if let Some(facts) = request_facts.get(&record.id) {
                record.is_requested = true;
                record.requested_by = facts.requested_by.clone();
                record.requested_by_email = facts.requested_by_email.clone();
                record.requested_at = facts.requested_at;
                record.request_status = facts.request_status;
                record.approved_by = facts.approved_by.clone();
                record.is_auto_request = facts.is_auto_request;
            }
            if let Some(facts) = hardlink_facts.get(&record.id) {
                record.hardlink_count = facts.hardlink_count;
                record.recompute_hardlink_flag();
            }
            if let Some(facts) = torrent_facts.get(&record.id) {
                record.torrent_hash = Some(facts.torrent_hash.clone());
                record.is_seeding = facts.is_seeding;
            }
        }

        Ok(records)
    }
}

fn log_and_default<T: Default>(result: Result<T>, enricher: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(enricher, error = %err, "enricher failed, leaving its fields unchanged");
            T::default()
        }
    }
}

fn build_record(movie: CatalogMovie, tag_lookup: &HashMap<i64, String>) -> Record {
    let mut record = Record::new(
        movie.id,
        movie.imdb_id,
        movie.tmdb_id,
        movie.title,
        movie.year,
    );
    record.path = movie.path;
    record.tag_ids = movie.tag_ids.clone();
    record.tags = movie
        .tag_ids
        .iter()
        .filter_map(|id| tag_lookup.get(id).cloned())
        .collect();
    record.added_at = movie.added_at;
    record.ratings = movie.ratings.into_iter().filter(|(_, value)| *value > 0.0).collect();
    record.popularity = movie.popularity;
    record.monitored = movie.monitored;
    record.available = movie.available;
    record.digital_release = movie.digital_release;
    record.physical_release = movie.physical_release;
    record.in_cinemas = movie.in_cinemas;
    record.has_file = movie.file.is_some();
    record.file_imported_at = movie.file.as_ref().map(|f| f.imported_at);
    record.file = movie.file;
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use librarian_core::collaborators::{
        CommandStatus, ImportCandidate, ImportCommand, RequestEntry, WatchHistoryEntry,
    };
    use librarian_core::models::{CustomFormat, MovieFile, TorrentListing};

    struct FakeCatalog {
        movies: Vec<CatalogMovie>,
        tags: Vec<Tag>,
    }

    #[async_trait]
    impl CatalogClient for FakeCatalog {
        async fn list_movies(&self) -> Result<Vec<CatalogMovie>> {
            Ok(self.movies.clone())
        }
        async fn list_tags(&self) -> Result<Vec<Tag>> {
            Ok(self.tags.clone())
        }
        async fn delete_movie(&self, _id: i64, _delete_files: bool) -> Result<()> {
            Ok(())
        }
        async fn delete_files(&self, _file_ids: &[i64]) -> Result<()> {
            Ok(())
        }
        async fn get_custom_formats(&self) -> Result<Vec<CustomFormat>> {
            Ok(vec![])
        }
        async fn update_movie(&self, _id: i64, _movie: &CatalogMovie, _move_files: bool) -> Result<()> {
            Ok(())
        }
        async fn send_search_command(&self, _movie_ids: &[i64]) -> Result<CommandStatus> {
            Ok(CommandStatus { id: 1, status: "queued".into() })
        }
        async fn manual_import_scan(
            &self,
            _folder: &str,
            _movie_id: Option<i64>,
            _filter_existing: bool,
        ) -> Result<Vec<ImportCandidate>> {
            Ok(vec![])
        }
        async fn manual_import_apply(&self, _command: ImportCommand) -> Result<()> {
            Ok(())
        }
    }

    struct EmptyWatch;
    #[async_trait]
    impl WatchTrackerClient for EmptyWatch {
        async fn get_history(&self, _length: usize) -> Result<Vec<WatchHistoryEntry>> {
            Ok(vec![])
        }
    }

    struct EmptyRequests;
    #[async_trait]
    impl RequestTrackerClient for EmptyRequests {
        async fn list_requests(&self, _skip: usize, _take: usize) -> Result<Vec<RequestEntry>> {
            Ok(vec![])
        }
    }

    struct EmptyTorrents;
    #[async_trait]
    impl TorrentClient for EmptyTorrents {
        async fn list_torrents(&self) -> Result<Vec<TorrentListing>> {
            Ok(vec![])
        }
        async fn list_files(&self, _hash: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
    }

    struct EmptyHardlink;
    #[async_trait]
    impl HardlinkStat for EmptyHardlink {
        async fn hardlink_count(&self, _path: &str) -> Result<u32> {
            Ok(1)
        }
    }

    #[tokio::test]
    async fn load_drops_records_without_imported_file() {
        let imported = CatalogMovie {
            id: 1,
            imdb_id: "tt1".into(),
            tmdb_id: "1".into(),
            title: "Imported".into(),
            year: 2020,
            path: "/movies/imported".into(),
            tag_ids: vec![],
            added_at: Utc::now(),
            file: Some(MovieFile {
                id: 1,
                path: "/movies/imported/file.mkv".into(),
                size: 100,
                imported_at: Utc::now(),
                custom_format_score: 0,
                custom_format_ids: vec![],
            }),
            ratings: Default::default(),
            popularity: 0.0,
            monitored: true,
            available: true,
            digital_release: None,
            physical_release: None,
            in_cinemas: None,
        };
        let mut unimported = imported.clone();
        unimported.id = 2;
        unimported.file = None;

        let catalog = FakeCatalog {
            movies: vec![imported, unimported],
            tags: vec![],
        };
        let ops = Operations::new(
            Arc::new(catalog),
            Arc::new(EmptyWatch),
            Arc::new(EmptyRequests),
            Arc::new(EmptyTorrents),
            Arc::new(EmptyHardlink),
            0.9,
        );
        let records = ops.load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
    }
}
