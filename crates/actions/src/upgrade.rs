//! Upgrade search executor (spec §4.3.3): selects records missing a
//! target custom format or below the configured score floor, optionally
//! restricted to movies the catalog reports as available, enables
//! monitoring on candidates that need it, then issues batched search
//! commands with pacing between batches so the collaborator isn't hit
//! with one command per movie. Grounded on `decision/src/custom_formats.rs`
//! (custom-format id resolution) and `decision/src/engine.rs`'s
//! constraint-then-score staged evaluation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use librarian_core::collaborators::{CatalogClient, CommandStatus};
use librarian_core::models::{CatalogMovie, Record};
use librarian_core::LibraryError;
use tracing::warn;

use crate::io::{Formatter, Plan};

const AVAILABILITY_MONTHS: u32 = 4;
const SEARCH_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Any,
    All,
}

#[derive(Debug, Clone)]
pub struct UpgradeSearchOptions {
    pub target_formats: Vec<String>,
    pub min_score: i32,
    pub match_mode: MatchMode,
    pub check_availability: bool,
    pub skip_monitoring: bool,
    pub dry_run: bool,
    pub batch_size: usize,
    pub pace: Duration,
}

#[derive(Debug, Clone)]
pub struct UpgradeCandidate {
    pub record_id: i64,
    pub current_formats: Vec<String>,
    pub missing_formats: Vec<String>,
    pub needs_monitoring: bool,
    pub is_available: bool,
}

#[derive(Debug, Default)]
pub struct UpgradeSearchOutcome {
    pub candidates: Vec<UpgradeCandidate>,
    pub monitored: Vec<i64>,
    pub searched: Vec<i64>,
    pub batches_failed: Vec<(Vec<i64>, String)>,
}

pub struct UpgradeSearchExecutor {
    catalog: Arc<dyn CatalogClient>,
}

impl UpgradeSearchExecutor {
    pub fn new(catalog: Arc<dyn CatalogClient>) -> Self {
        Self { catalog }
    }

    /// `records` should already be narrowed to the movies a filter selected;
    /// this executor applies the format/score gate on top of that set.
    pub async fn execute(
        &self,
        records: &[Record],
        options: &UpgradeSearchOptions,
        formatter: &dyn Formatter,
    ) -> librarian_core::Result<UpgradeSearchOutcome> {
        let formats = self.catalog.get_custom_formats().await?;
        let format_names: HashMap<i64, String> =
            formats.into_iter().map(|f| (f.id, f.name)).collect();

        let now = Utc::now();
        let mut outcome = UpgradeSearchOutcome::default();

        for record in records {
            let Some(file) = &record.file else { continue };
            let current_formats: Vec<String> = file
                .custom_format_ids
                .iter()
                .filter_map(|id| format_names.get(id).cloned())
                .collect();
            let missing_formats: Vec<String> = options
                .target_formats
                .iter()
                .filter(|name| !current_formats.contains(name))
                .cloned()
                .collect();

            let format_gate = match options.match_mode {
                MatchMode::All => missing_formats.len() == options.target_formats.len()
                    && !options.target_formats.is_empty(),
                MatchMode::Any => !missing_formats.is_empty(),
            };
            let is_candidate = format_gate || file.custom_format_score < options.min_score;
            if !is_candidate {
                continue;
            }

            let is_available = !options.check_availability || is_available(record, now);

            outcome.candidates.push(UpgradeCandidate {
                record_id: record.id,
                current_formats,
                missing_formats,
                needs_monitoring: !record.monitored,
                is_available,
            });
        }

        let plan = Plan::new(
            "upgrade-search",
            outcome.candidates.iter().map(|c| c.record_id).collect(),
            format!("search for upgrades on {} record(s)", outcome.candidates.len()),
        );
        formatter.render_plan(&plan);

        if options.dry_run {
            return Ok(outcome);
        }

        let searchable: Vec<&UpgradeCandidate> =
            outcome.candidates.iter().filter(|c| c.is_available).collect();

        for candidate in &searchable {
            if options.skip_monitoring || !candidate.needs_monitoring {
                continue;
            }
            let Some(record) = records.iter().find(|r| r.id == candidate.record_id) else {
                continue;
            };
            match self.enable_monitoring(record).await {
                Ok(()) => outcome.monitored.push(record.id),
                Err(err) => {
                    warn!(record_id = record.id, error = %err, "failed to enable monitoring before upgrade search");
                }
            }
        }

        let ids: Vec<i64> = searchable.iter().map(|c| c.record_id).collect();
        let batch_size = options.batch_size.max(1).min(SEARCH_BATCH_SIZE);
        let batches: Vec<&[i64]> = ids.chunks(batch_size).collect();
        let last = batches.len().saturating_sub(1);

        for (i, batch) in batches.into_iter().enumerate() {
            match self.send_batch(batch).await {
                Ok(_status) => outcome.searched.extend_from_slice(batch),
                Err(err) => {
                    warn!(batch = ?batch, error = %err, "upgrade search batch failed");
                    outcome.batches_failed.push((batch.to_vec(), err.to_string()));
                }
            }
            if i != last {
                tokio::time::sleep(options.pace).await;
            }
        }

        if !outcome.batches_failed.is_empty() {
            let requested = outcome.searched.len()
                + outcome.batches_failed.iter().map(|(ids, _)| ids.len()).sum::<usize>();
            let failed = outcome.batches_failed.len();
            return Err(LibraryError::PartialFailure {
                resource: "upgrade".to_string(),
                requested,
                failed,
            });
        }

        Ok(outcome)
    }

    async fn enable_monitoring(&self, record: &Record) -> librarian_core::Result<()> {
        let movie = CatalogMovie {
            id: record.id,
            imdb_id: record.imdb_id.clone(),
            tmdb_id: record.tmdb_id.clone(),
            title: record.title.clone(),
            year: record.year,
            path: record.path.clone(),
            tag_ids: record.tag_ids.clone(),
            added_at: record.added_at,
            file: record.file.clone(),
            ratings: record.ratings.clone(),
            popularity: record.popularity,
            monitored: true,
            available: record.available,
            digital_release: record.digital_release,
            physical_release: record.physical_release,
            in_cinemas: record.in_cinemas,
        };
        self.catalog.update_movie(record.id, &movie, false).await
    }

    async fn send_batch(&self, ids: &[i64]) -> librarian_core::Result<CommandStatus> {
        self.catalog.send_search_command(ids).await
    }
}

/// A movie is available when the catalog says so, or any release timestamp
/// is already in the past, or cinema release was at least 4 calendar
/// months ago (spec §4.3.3).
fn is_available(record: &Record, now: DateTime<Utc>) -> bool {
    if record.available {
        return true;
    }
    if record.digital_release.is_some_and(|t| t <= now) {
        return true;
    }
    if record.physical_release.is_some_and(|t| t <= now) {
        return true;
    }
    if let Some(in_cinemas) = record.in_cinemas {
        if in_cinemas <= shift_months(now, AVAILABILITY_MONTHS as i32) {
            return true;
        }
    }
    false
}

/// Shifts `dt` back by `months` calendar months, clamping the day down to
/// the last valid day of the target month.
fn shift_months(dt: DateTime<Utc>, months: i32) -> DateTime<Utc> {
    let total = dt.year() * 12 + dt.month0() as i32 - months;
    let year = total.div_euclid(12);
    let month = (total.rem_euclid(12) + 1) as u32;
    let naive_date = (1..=dt.day())
        .rev()
        .find_map(|day| chrono::NaiveDate::from_ymd_opt(year, month, day))
        .expect("every month has at least 28 days");
    Utc.from_utc_datetime(&naive_date.and_time(dt.time()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Silent;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use librarian_core::collaborators::{ImportCandidate, ImportCommand};
    use librarian_core::models::{CustomFormat, MovieFile, Tag};
    use std::sync::Mutex;

    struct FakeCatalog {
        formats: Vec<CustomFormat>,
        updated: Mutex<Vec<(i64, bool)>>,
    }

    #[async_trait]
    impl CatalogClient for FakeCatalog {
        async fn list_movies(&self) -> librarian_core::Result<Vec<CatalogMovie>> {
            Ok(vec![])
        }
        async fn list_tags(&self) -> librarian_core::Result<Vec<Tag>> {
            Ok(vec![])
        }
        async fn delete_movie(&self, _id: i64, _delete_files: bool) -> librarian_core::Result<()> {
            Ok(())
        }
        async fn delete_files(&self, _file_ids: &[i64]) -> librarian_core::Result<()> {
            Ok(())
        }
        async fn get_custom_formats(&self) -> librarian_core::Result<Vec<CustomFormat>> {
            Ok(self.formats.clone())
        }
        async fn update_movie(&self, id: i64, movie: &CatalogMovie, _move_files: bool) -> librarian_core::Result<()> {
            self.updated.lock().unwrap().push((id, movie.monitored));
            Ok(())
        }
        async fn send_search_command(&self, movie_ids: &[i64]) -> librarian_core::Result<librarian_core::collaborators::CommandStatus> {
            Ok(librarian_core::collaborators::CommandStatus {
                id: movie_ids.len() as i64,
                status: "queued".into(),
            })
        }
        async fn manual_import_scan(
            &self,
            _folder: &str,
            _movie_id: Option<i64>,
            _filter_existing: bool,
        ) -> librarian_core::Result<Vec<ImportCandidate>> {
            Ok(vec![])
        }
        async fn manual_import_apply(&self, _command: ImportCommand) -> librarian_core::Result<()> {
            Ok(())
        }
    }

    fn record_with_file(id: i64, score: i32, format_ids: Vec<i64>) -> Record {
        let mut r = Record::new(id, format!("tt{id}"), id.to_string(), format!("Movie {id}"), 2020);
        r.available = true;
        r.file = Some(MovieFile {
            id,
            path: format!("/movies/{id}"),
            size: 100,
            imported_at: chrono::Utc::now(),
            custom_format_score: score,
            custom_format_ids: format_ids,
        });
        r
    }

    fn options(targets: Vec<&str>, match_mode: MatchMode) -> UpgradeSearchOptions {
        UpgradeSearchOptions {
            target_formats: targets.into_iter().map(String::from).collect(),
            min_score: 50,
            match_mode,
            check_availability: true,
            skip_monitoring: false,
            dry_run: false,
            batch_size: 10,
            pace: Duration::from_millis(0),
        }
    }

    #[tokio::test]
    async fn selects_only_records_below_score_or_missing_format() {
        let below_score = record_with_file(1, 10, vec![5]);
        let missing_format = record_with_file(2, 100, vec![]);
        let fine = record_with_file(3, 100, vec![5]);

        let catalog = FakeCatalog {
            formats: vec![CustomFormat { id: 5, name: "HD".into() }],
            updated: Mutex::new(vec![]),
        };
        let executor = UpgradeSearchExecutor::new(Arc::new(catalog));
        let opts = options(vec!["HD"], MatchMode::Any);
        let outcome = executor
            .execute(&[below_score, missing_format, fine], &opts, &Silent)
            .await
            .unwrap();
        assert_eq!(outcome.searched, vec![1, 2]);
    }

    #[tokio::test]
    async fn all_match_mode_requires_every_target_missing() {
        let mut record = record_with_file(1, 100, vec![1]);
        record.monitored = true;
        let catalog = FakeCatalog {
            formats: vec![
                CustomFormat { id: 1, name: "HD".into() },
                CustomFormat { id: 2, name: "Remux".into() },
            ],
            updated: Mutex::new(vec![]),
        };
        let executor = UpgradeSearchExecutor::new(Arc::new(catalog));
        let opts = options(vec!["Remux"], MatchMode::All);
        let outcome = executor.execute(std::slice::from_ref(&record), &opts, &Silent).await.unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].missing_formats, vec!["Remux".to_string()]);
    }

    #[tokio::test]
    async fn dry_run_emits_candidate_with_no_monitoring_or_search() {
        let mut record = record_with_file(1, 100, vec![1]);
        record.monitored = false;
        let catalog = FakeCatalog {
            formats: vec![
                CustomFormat { id: 1, name: "HD".into() },
                CustomFormat { id: 2, name: "Remux".into() },
            ],
            updated: Mutex::new(vec![]),
        };
        let executor = UpgradeSearchExecutor::new(Arc::new(catalog));
        let mut opts = options(vec!["Remux"], MatchMode::All);
        opts.dry_run = true;
        let outcome = executor.execute(std::slice::from_ref(&record), &opts, &Silent).await.unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        let candidate = &outcome.candidates[0];
        assert_eq!(candidate.current_formats, vec!["HD".to_string()]);
        assert_eq!(candidate.missing_formats, vec!["Remux".to_string()]);
        assert!(candidate.needs_monitoring);
        assert!(candidate.is_available);
        assert!(outcome.monitored.is_empty());
        assert!(outcome.searched.is_empty());
    }

    #[tokio::test]
    async fn enables_monitoring_before_searching_when_needed() {
        let mut record = record_with_file(1, 10, vec![]);
        record.monitored = false;
        let catalog = Arc::new(FakeCatalog {
            formats: vec![],
            updated: Mutex::new(vec![]),
        });
        let executor = UpgradeSearchExecutor::new(catalog.clone());
        let opts = options(vec![], MatchMode::Any);
        let outcome = executor.execute(std::slice::from_ref(&record), &opts, &Silent).await.unwrap();
        assert_eq!(outcome.monitored, vec![1]);
        assert_eq!(catalog.updated.lock().unwrap().as_slice(), &[(1, true)]);
        assert_eq!(outcome.searched, vec![1]);
    }

    #[tokio::test]
    async fn unavailable_records_are_not_searched() {
        let mut record = record_with_file(1, 10, vec![]);
        record.available = false;
        record.in_cinemas = Some(Utc::now() - ChronoDuration::days(10));
        let catalog = FakeCatalog { formats: vec![], updated: Mutex::new(vec![]) };
        let executor = UpgradeSearchExecutor::new(Arc::new(catalog));
        let opts = options(vec![], MatchMode::Any);
        let outcome = executor.execute(std::slice::from_ref(&record), &opts, &Silent).await.unwrap();
        assert_eq!(outcome.candidates.len(), 1);
        assert!(!outcome.candidates[0].is_available);
        assert!(outcome.searched.is_empty());
    }

    #[tokio::test]
    async fn paces_between_batches() {
        let mut records: Vec<Record> = (0..5).map(|i| record_with_file(i, 0, vec![])).collect();
        for r in &mut records {
            r.monitored = true;
        }
        let catalog = FakeCatalog { formats: vec![], updated: Mutex::new(vec![]) };
        let executor = UpgradeSearchExecutor::new(Arc::new(catalog));
        let mut opts = options(vec![], MatchMode::Any);
        opts.batch_size = 2;
        opts.pace = Duration::from_millis(5);
        let outcome = executor.execute(&records, &opts, &Silent).await.unwrap();
        assert_eq!(outcome.searched.len(), 5);
    }
}
