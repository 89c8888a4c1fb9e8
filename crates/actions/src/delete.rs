//! Batch delete executor (spec §4.3.1). Grounded on
//! `sanitarr__src-cleaners-movies.rs`'s `delete_movies`/`cleanup`
//! force-delete-vs-list-only branching and per-id fan-out.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use librarian_core::collaborators::CatalogClient;
use librarian_core::models::Record;
use librarian_core::LibraryError;
use tracing::error;

use crate::io::{Formatter, Plan, Prompter};

/// At most this many `delete_movie` calls run concurrently (spec §4.3.1).
const DELETE_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct BatchDeleteOptions {
    pub dry_run: bool,
    pub delete_files: bool,
    pub confirm: bool,
}

#[derive(Debug, Default)]
pub struct BatchDeleteOutcome {
    pub deleted: Vec<i64>,
    pub failed: Vec<(i64, String)>,
    pub skipped_dry_run: bool,
    pub aborted: bool,
}

pub struct BatchDeleteExecutor {
    catalog: Arc<dyn CatalogClient>,
}

impl BatchDeleteExecutor {
    pub fn new(catalog: Arc<dyn CatalogClient>) -> Self {
        Self { catalog }
    }

    pub async fn execute(
        &self,
        records: &[Record],
        options: BatchDeleteOptions,
        prompter: &dyn Prompter,
        formatter: &dyn Formatter,
    ) -> librarian_core::Result<BatchDeleteOutcome> {
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        let plan = Plan::new(
            "delete",
            ids.clone(),
            format!(
                "delete {} record(s){}",
                ids.len(),
                if options.delete_files { " and their files" } else { "" }
            ),
        );
        formatter.render_plan(&plan);

        if options.dry_run {
            return Ok(BatchDeleteOutcome {
                skipped_dry_run: true,
                ..Default::default()
            });
        }

        if options.confirm && !prompter.confirm(&plan.summary)? {
            return Ok(BatchDeleteOutcome {
                aborted: true,
                ..Default::default()
            });
        }

        let delete_files = options.delete_files;
        let catalog = self.catalog.clone();
        let results: Vec<(i64, Result<(), String>)> = stream::iter(ids.into_iter())
            .map(|id| {
                let catalog = catalog.clone();
                async move {
                    let result = catalog
                        .delete_movie(id, delete_files)
                        .await
                        .map_err(|e| e.to_string());
                    (id, result)
                }
            })
            .buffer_unordered(DELETE_CONCURRENCY)
            .collect()
            .await;

        let mut outcome = BatchDeleteOutcome::default();
        for (id, result) in results {
            match result {
                Ok(()) => outcome.deleted.push(id),
                Err(message) => outcome.failed.push((id, message)),
            }
        }

        if !outcome.failed.is_empty() {
            for (id, message) in &outcome.failed {
                error!(record_id = id, error = %message, "delete failed");
            }
            error!(deleted = outcome.deleted.len(), "delete batch had failures; deletes that already succeeded were not rolled back");
            let requested = outcome.deleted.len() + outcome.failed.len();
            let failed = outcome.failed.len();
            return Err(LibraryError::PartialFailure {
                resource: "delete".to_string(),
                requested,
                failed,
            });
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Silent;
    use async_trait::async_trait;
    use librarian_core::collaborators::{
        CommandStatus, ImportCandidate, ImportCommand,
    };
    use librarian_core::models::CatalogMovie;
    use librarian_core::LibraryError;
    use std::sync::Mutex;

    struct FakeCatalog {
        fail_ids: Vec<i64>,
        deleted: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl CatalogClient for FakeCatalog {
        async fn list_movies(&self) -> librarian_core::Result<Vec<CatalogMovie>> {
            Ok(vec![])
        }
        async fn list_tags(&self) -> librarian_core::Result<Vec<librarian_core::models::Tag>> {
            Ok(vec![])
        }
        async fn delete_movie(&self, id: i64, _delete_files: bool) -> librarian_core::Result<()> {
            if self.fail_ids.contains(&id) {
                return Err(LibraryError::collaborator(
                    "catalog",
                    "boom",
                    librarian_core::CollaboratorErrorKind::Transient,
                ));
            }
            self.deleted.lock().unwrap().push(id);
            Ok(())
        }
        async fn delete_files(&self, _file_ids: &[i64]) -> librarian_core::Result<()> {
            Ok(())
        }
        async fn get_custom_formats(&self) -> librarian_core::Result<Vec<librarian_core::models::CustomFormat>> {
            Ok(vec![])
        }
        async fn update_movie(
            &self,
            _id: i64,
            _movie: &CatalogMovie,
            _move_files: bool,
        ) -> librarian_core::Result<()> {
            Ok(())
        }
        async fn send_search_command(&self, _movie_ids: &[i64]) -> librarian_core::Result<CommandStatus> {
            Ok(CommandStatus { id: 1, status: "queued".into() })
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

    fn record(id: i64) -> Record {
        Record::new(id, format!("tt{id}"), id.to_string(), format!("Movie {id}"), 2020)
    }

    #[tokio::test]
    async fn dry_run_deletes_nothing() {
        let catalog = Arc::new(FakeCatalog { fail_ids: vec![], deleted: Mutex::new(vec![]) });
        let executor = BatchDeleteExecutor::new(catalog.clone());
        let outcome = executor
            .execute(
                &[record(1)],
                BatchDeleteOptions { dry_run: true, delete_files: false, confirm: false },
                &Silent,
                &Silent,
            )
            .await
            .unwrap();
        assert!(outcome.skipped_dry_run);
        assert!(catalog.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_failures_surface_as_an_aggregate_error() {
        let catalog = Arc::new(FakeCatalog { fail_ids: vec![2], deleted: Mutex::new(vec![]) });
        let executor = BatchDeleteExecutor::new(catalog.clone());
        let err = executor
            .execute(
                &[record(1), record(2), record(3)],
                BatchDeleteOptions { dry_run: false, delete_files: false, confirm: false },
                &Silent,
                &Silent,
            )
            .await
            .unwrap_err();
        match err {
            LibraryError::PartialFailure { requested, failed, .. } => {
                assert_eq!(requested, 3);
                assert_eq!(failed, 1);
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
        // The successful deletes went through and were not rolled back.
        assert_eq!(catalog.deleted.lock().unwrap().len(), 2);
    }
}
