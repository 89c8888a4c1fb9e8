//! WatchEnricher: aggregates per-user watch history onto each record's
//! `user_watch` map (spec §4.2). Grounded on `sanitarr`'s
//! `watched_movies`/`safe_to_delete` join-by-imdb-id shape.

use std::collections::HashMap;
use std::sync::Arc;

use librarian_core::collaborators::WatchTrackerClient;
use librarian_core::models::{Record, UserWatch};
use librarian_core::Result;

use crate::facts::WatchFacts;

/// How many history entries to request per `load` (spec doesn't bound
/// this; the tracker contract takes a `length` so we ask for a generous
/// window rather than paging).
const HISTORY_WINDOW: usize = 5000;

pub struct WatchEnricher {
    tracker: Arc<dyn WatchTrackerClient>,
    min_watch_percent: f64,
}

impl WatchEnricher {
    pub fn new(tracker: Arc<dyn WatchTrackerClient>, min_watch_percent: f64) -> Self {
        Self {
            tracker,
            min_watch_percent,
        }
    }

    pub async fn compute(&self, records: &[Record]) -> Result<HashMap<i64, WatchFacts>> {
        let history = self.tracker.get_history(HISTORY_WINDOW).await?;

        let mut by_imdb: HashMap<&str, Vec<&librarian_core::collaborators::WatchHistoryEntry>> =
            HashMap::new();
        for entry in &history {
            if let Some(imdb_id) = entry.imdb_id.as_deref() {
                by_imdb.entry(imdb_id).or_default().push(entry);
            }
        }

        let mut out = HashMap::with_capacity(records.len());
        for record in records {
            let Some(entries) = by_imdb.get(record.imdb_id.as_str()) else {
                continue;
            };
            let mut by_user: HashMap<String, UserWatch> = HashMap::new();
            for entry in entries {
                let watch = by_user.entry(entry.user.clone()).or_default();
                watch.watch_count += 1;
                watch.max_progress = watch.max_progress.max(entry.percent_complete);
                if watch.last_watched_at.map(|d| d < entry.date).unwrap_or(true) {
                    watch.last_watched_at = Some(entry.date);
                }
                if UserWatch::crosses_threshold(
                    entry.percent_complete,
                    entry.watched_status,
                    self.min_watch_percent,
                ) {
                    watch.watched = true;
                }
            }
            out.insert(record.id, WatchFacts { user_watch: by_user });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use librarian_core::collaborators::WatchHistoryEntry;

    struct FakeTracker(Vec<WatchHistoryEntry>);

    #[async_trait]
    impl WatchTrackerClient for FakeTracker {
        async fn get_history(&self, _length: usize) -> Result<Vec<WatchHistoryEntry>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn aggregates_multiple_entries_per_user() {
        let tracker = FakeTracker(vec![
            WatchHistoryEntry {
                user: "alice".into(),
                imdb_id: Some("tt1".into()),
                title: "Sample".into(),
                date: Utc::now(),
                percent_complete: 0.5,
                watched_status: 0.0,
            },
            WatchHistoryEntry {
                user: "alice".into(),
                imdb_id: Some("tt1".into()),
                title: "Sample".into(),
                date: Utc::now(),
                percent_complete: 0.95,
                watched_status: 1.0,
            },
        ]);
        let enricher = WatchEnricher::new(Arc::new(tracker), 0.9);
        let record = Record::new(1, "tt1".into(), "1".into(), "Sample".into(), 2020);
        let facts = enricher.compute(&[record]).await.unwrap();
        let alice = &facts[&1].user_watch["alice"];
        assert_eq!(alice.watch_count, 2);
        assert!(alice.watched);
        assert_eq!(alice.max_progress, 0.95);
    }

    #[tokio::test]
    async fn records_with_no_history_are_absent() {
        let enricher = WatchEnricher::new(Arc::new(FakeTracker(vec![])), 0.9);
        let record = Record::new(1, "tt1".into(), "1".into(), "Sample".into(), 2020);
        let facts = enricher.compute(&[record]).await.unwrap();
        assert!(!facts.contains_key(&1));
    }
}
