//! TorrentEnricher (paired with HardlinkEnricher, spec §4.2): for each
//! record whose file isn't already hardlinked, locates the torrent whose
//! content contains the record's file path. Exact equality or path-prefix
//! containment on the torrent's primary path is the fast path; otherwise
//! the torrent's files are enumerated and joined against `save_path` to
//! look for a match. Records the matching torrent's hash and seeding
//! state — the hash is what `HardlinkRepairExecutor` later uses to check
//! whether the record's primary torrent is still seeding.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use librarian_core::collaborators::TorrentClient;
use librarian_core::models::{Record, TorrentListing};
use librarian_core::Result;

use crate::facts::TorrentFacts;

pub struct TorrentEnricher {
    client: Arc<dyn TorrentClient>,
}

impl TorrentEnricher {
    pub fn new(client: Arc<dyn TorrentClient>) -> Self {
        Self { client }
    }

    pub async fn compute(&self, records: &[Record]) -> Result<HashMap<i64, TorrentFacts>> {
        let listings = self.client.list_torrents().await?;

        let mut out = HashMap::with_capacity(records.len());
        for record in records {
            if record.is_hardlinked {
                continue;
            }
            let Some(file) = &record.file else {
                continue;
            };
            if let Some(listing) = self.match_listing(&listings, &file.path).await {
                out.insert(
                    record.id,
                    TorrentFacts {
                        torrent_hash: listing.hash.clone(),
                        is_seeding: listing.state.is_seeding(),
                    },
                );
            }
        }
        Ok(out)
    }

    async fn match_listing<'a>(
        &self,
        listings: &'a [TorrentListing],
        file_path: &str,
    ) -> Option<&'a TorrentListing> {
        if let Some(listing) = listings
            .iter()
            .find(|l| l.content_path == file_path || file_path.starts_with(&l.content_path))
        {
            return Some(listing);
        }

        for listing in listings {
            let Ok(files) = self.client.list_files(&listing.hash).await else {
                continue;
            };
            let matched = files
                .iter()
                .any(|relative| Path::new(&listing.save_path).join(relative) == Path::new(file_path));
            if matched {
                return Some(listing);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use librarian_core::models::{MovieFile, TorrentState};

    struct FakeClient {
        listings: Vec<TorrentListing>,
        files: HashMap<String, Vec<String>>,
    }

    #[async_trait]
    impl TorrentClient for FakeClient {
        async fn list_torrents(&self) -> Result<Vec<TorrentListing>> {
            Ok(self.listings.clone())
        }
        async fn list_files(&self, hash: &str) -> Result<Vec<String>> {
            Ok(self.files.get(hash).cloned().unwrap_or_default())
        }
    }

    fn record_with_file(path: &str) -> Record {
        let mut r = Record::new(1, "tt1".into(), "1".into(), "Sample".into(), 2020);
        r.has_file = true;
        r.file = Some(MovieFile {
            id: 1,
            path: path.into(),
            size: 1000,
            imported_at: chrono::Utc::now(),
            custom_format_score: 0,
            custom_format_ids: vec![],
        });
        r
    }

    fn listing(hash: &str, content_path: &str, save_path: &str) -> TorrentListing {
        TorrentListing {
            hash: hash.into(),
            name: "Sample.2020".into(),
            save_path: save_path.into(),
            content_path: content_path.into(),
            state: TorrentState::Uploading,
            size: 1000,
            progress: 1.0,
        }
    }

    #[tokio::test]
    async fn matches_exact_content_path() {
        let client = FakeClient {
            listings: vec![listing("abc", "/downloads/Sample.2020/movie.mkv", "/downloads/Sample.2020")],
            files: HashMap::new(),
        };
        let enricher = TorrentEnricher::new(Arc::new(client));
        let record = record_with_file("/downloads/Sample.2020/movie.mkv");
        let facts = enricher.compute(&[record]).await.unwrap();
        assert_eq!(facts[&1].torrent_hash, "abc");
        assert!(facts[&1].is_seeding);
    }

    #[tokio::test]
    async fn matches_via_enumerated_files() {
        let mut files = HashMap::new();
        files.insert("abc".to_string(), vec!["movie.mkv".to_string()]);
        let client = FakeClient {
            listings: vec![listing("abc", "/downloads/other-name", "/downloads/Sample.2020")],
            files,
        };
        let enricher = TorrentEnricher::new(Arc::new(client));
        let record = record_with_file("/downloads/Sample.2020/movie.mkv");
        let facts = enricher.compute(&[record]).await.unwrap();
        assert_eq!(facts[&1].torrent_hash, "abc");
    }

    #[tokio::test]
    async fn already_hardlinked_records_are_skipped() {
        let client = FakeClient { listings: vec![], files: HashMap::new() };
        let enricher = TorrentEnricher::new(Arc::new(client));
        let mut record = record_with_file("/downloads/Sample.2020/movie.mkv");
        record.is_hardlinked = true;
        let facts = enricher.compute(&[record]).await.unwrap();
        assert!(facts.is_empty());
    }

    #[tokio::test]
    async fn no_match_when_nothing_lines_up() {
        let client = FakeClient {
            listings: vec![listing("abc", "/downloads/Other", "/downloads/Other")],
            files: HashMap::new(),
        };
        let enricher = TorrentEnricher::new(Arc::new(client));
        let record = record_with_file("/downloads/Sample.2020/movie.mkv");
        let facts = enricher.compute(&[record]).await.unwrap();
        assert!(facts.is_empty());
    }
}
