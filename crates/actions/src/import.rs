//! Manual import executor (spec §4.3.2): scan a folder, keep only
//! admissible candidates, convert each to an import command, and submit
//! them one at a time. Grounded on `import/src/pipeline.rs`'s
//! scan-then-import orchestration.

use std::sync::Arc;

use librarian_core::collaborators::{CatalogClient, ImportCandidate, ImportCommand, ImportMode};
use librarian_core::LibraryError;

use crate::io::{Formatter, Plan};

pub struct ManualImportOptions {
    pub folder: String,
    pub movie_id: Option<i64>,
    pub filter_existing: bool,
    pub mode: ImportMode,
}

#[derive(Debug, Default)]
pub struct ManualImportOutcome {
    pub imported: Vec<String>,
    pub rejected: Vec<(String, Vec<String>)>,
    pub failed: Vec<(String, String)>,
}

pub struct ManualImportExecutor {
    catalog: Arc<dyn CatalogClient>,
}

impl ManualImportExecutor {
    pub fn new(catalog: Arc<dyn CatalogClient>) -> Self {
        Self { catalog }
    }

    pub async fn execute(
        &self,
        options: ManualImportOptions,
        formatter: &dyn Formatter,
    ) -> librarian_core::Result<ManualImportOutcome> {
        let candidates = self
            .catalog
            .manual_import_scan(&options.folder, options.movie_id, options.filter_existing)
            .await?;

        let (admissible, rejected): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(ImportCandidate::is_admissible);

        let plan = Plan::new(
            "manual-import",
            admissible.iter().filter_map(|c| c.movie_id).collect(),
            format!(
                "import {} of {} scanned candidate(s) from {}",
                admissible.len(),
                admissible.len() + rejected.len(),
                options.folder
            ),
        );
        formatter.render_plan(&plan);

        let mut outcome = ManualImportOutcome {
            rejected: rejected
                .into_iter()
                .map(|c| (c.path, c.rejections))
                .collect(),
            ..Default::default()
        };

        // Sequential, not fanned out: each import command mutates shared
        // catalog state (moving/copying files, updating movie records) and
        // the collaborator contract gives no ordering guarantee across
        // concurrent applies.
        for candidate in admissible {
            let path = candidate.path.clone();
            let command = ImportCommand {
                movie_id: candidate.movie_id.expect("admissible implies movie_id"),
                path: candidate.path,
                mode: options.mode,
                quality: candidate.quality,
                languages: candidate.languages,
                release_group: candidate.release_group,
                download_id: candidate.download_id,
                custom_format_ids: candidate.custom_format_ids,
                custom_format_score: candidate.custom_format_score,
            };
            match self.catalog.manual_import_apply(command).await {
                Ok(()) => outcome.imported.push(path),
                Err(err) => outcome.failed.push((path, err.to_string())),
            }
        }

        if !outcome.failed.is_empty() {
            let requested = outcome.imported.len() + outcome.failed.len();
            let failed = outcome.failed.len();
            return Err(LibraryError::PartialFailure {
                resource: "import".to_string(),
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
    use librarian_core::collaborators::CommandStatus;
    use librarian_core::models::{CatalogMovie, CustomFormat, Tag};

    struct FakeCatalog {
        candidates: Vec<ImportCandidate>,
        fail_paths: Vec<String>,
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
            Ok(vec![])
        }
        async fn update_movie(&self, _id: i64, _movie: &CatalogMovie, _move_files: bool) -> librarian_core::Result<()> {
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
            Ok(self.candidates.clone())
        }
        async fn manual_import_apply(&self, command: ImportCommand) -> librarian_core::Result<()> {
            if self.fail_paths.contains(&command.path) {
                return Err(librarian_core::LibraryError::collaborator(
                    "catalog",
                    "import failed",
                    librarian_core::CollaboratorErrorKind::Transient,
                ));
            }
            Ok(())
        }
    }

    fn candidate(path: &str, admissible: bool) -> ImportCandidate {
        ImportCandidate {
            path: path.to_string(),
            movie_id: Some(1),
            quality: "Bluray-1080p".into(),
            languages: vec!["English".into()],
            release_group: None,
            download_id: None,
            custom_format_ids: vec![],
            custom_format_score: 0,
            rejections: if admissible { vec![] } else { vec!["no matching movie".into()] },
        }
    }

    #[tokio::test]
    async fn imports_only_admissible_candidates() {
        let catalog = Arc::new(FakeCatalog {
            candidates: vec![candidate("/a", true), candidate("/b", false)],
            fail_paths: vec![],
        });
        let executor = ManualImportExecutor::new(catalog);
        let outcome = executor
            .execute(
                ManualImportOptions {
                    folder: "/downloads".into(),
                    movie_id: None,
                    filter_existing: true,
                    mode: ImportMode::Move,
                },
                &Silent,
            )
            .await
            .unwrap();
        assert_eq!(outcome.imported, vec!["/a".to_string()]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].0, "/b");
    }

    #[tokio::test]
    async fn apply_failures_surface_as_an_aggregate_error() {
        let catalog = Arc::new(FakeCatalog {
            candidates: vec![candidate("/a", true), candidate("/b", true)],
            fail_paths: vec!["/b".to_string()],
        });
        let executor = ManualImportExecutor::new(catalog);
        let err = executor
            .execute(
                ManualImportOptions {
                    folder: "/downloads".into(),
                    movie_id: None,
                    filter_existing: true,
                    mode: ImportMode::Move,
                },
                &Silent,
            )
            .await
            .unwrap_err();
        match err {
            LibraryError::PartialFailure { requested, failed, .. } => {
                assert_eq!(requested, 2);
                assert_eq!(failed, 1);
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }
}
