//! Library-arbitration engine CLI entry point.
//!
//! Dispatches to one of six subcommands; each subcommand body calls
//! straight into the library crates (`librarian-core`, `librarian-filter`,
//! `librarian-enrichment`, `librarian-actions`) — flag parsing here is
//! limited to the minimal `clap` derive struct needed to route a
//! subcommand name, per the CLI non-goal in spec.md §1.

mod collaborator_stub;
mod config;
mod io;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use librarian_actions::{
    BatchDeleteExecutor, BatchDeleteOptions, HardlinkRepairExecutor, ManualImportExecutor,
    ManualImportOptions, MatchMode, UpgradeSearchExecutor, UpgradeSearchOptions,
};
use librarian_core::collaborators::ImportMode;
use librarian_core::{LibraryError, Result, WorkerPool};
use librarian_enrichment::Operations;
use librarian_filter::{compile, ConcurrentEvaluator, FilterCache};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use collaborator_stub::{UnixHardlinkStat, Unconfigured};
use config::LibrarianConfig;
use io::{PlainFormatter, StdPrompter};

#[derive(Parser)]
#[command(name = "librarian", about = "Library-arbitration engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a named filter against the catalog and print matching ids.
    List { filter: String },
    /// Delete every record matched by a filter.
    Delete {
        filter: String,
        #[arg(long)]
        no_confirm: bool,
        #[arg(long)]
        delete_files: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Compile and evaluate a filter expression without a catalog fetch.
    Test { expression: String },
    /// Scan a folder for importable files and apply the admissible ones.
    Import {
        #[arg(long)]
        path: String,
        #[arg(long)]
        movie_id: Option<i64>,
        #[arg(long, default_value = "move")]
        mode: String,
    },
    /// Repair broken hardlinks by re-importing or re-searching.
    Hardlink {
        #[arg(long)]
        no_confirm: bool,
    },
    /// Search for upgrades on records below the configured custom-format bar.
    Upgrade {
        #[arg(long)]
        unattended: Option<usize>,
        #[arg(long = "match", default_value = "any")]
        match_mode: String,
        #[arg(long)]
        no_monitor: bool,
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_logging();

    if let Err(err) = run().await {
        error!(error = %err, "librarian exited with an error");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("LIBRARIAN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = LibrarianConfig::from_env()?;

    if matches!(&cli.command, Command::Test { .. }) {
        return run_test(&cli.command);
    }

    config.validate()?;
    info!(workers = config.worker_count, "librarian starting");

    let catalog = Arc::new(Unconfigured { service: "catalog" });
    let watch_tracker = Arc::new(Unconfigured { service: "watch_tracker" });
    let request_tracker = Arc::new(Unconfigured { service: "request_tracker" });
    let torrent_client = Arc::new(Unconfigured { service: "torrent_client" });
    let hardlink_stat = Arc::new(UnixHardlinkStat);

    let operations = Operations::new(
        catalog.clone(),
        watch_tracker,
        request_tracker,
        torrent_client.clone(),
        hardlink_stat,
        config.actions.min_watch_percent,
    );

    let (pool, handle) = WorkerPool::new(config.worker_count);
    let evaluator = ConcurrentEvaluator::new(pool, config.worker_count);
    let cache = FilterCache::default();
    let cancel = CancellationToken::new();
    let prompter = StdPrompter;
    let formatter = PlainFormatter;

    match cli.command {
        Command::List { filter } => {
            let source = resolve_filter(&config, &filter)?;
            let program = cache.get_or_compile(&source).await.map_err(|e| {
                LibraryError::compilation(source.clone(), e.to_string())
            })?;
            let records = operations.load().await?;
            let matches = evaluator
                .evaluate_single(&program, &records, Utc::now(), &cancel)
                .await?;
            for (record, matched) in records.iter().zip(matches) {
                if matched {
                    println!("{}\t{}", record.id, record.title);
                }
            }
        }
        Command::Delete { filter, no_confirm, delete_files, dry_run } => {
            let source = resolve_filter(&config, &filter)?;
            let program = cache.get_or_compile(&source).await.map_err(|e| {
                LibraryError::compilation(source.clone(), e.to_string())
            })?;
            let records = operations.load().await?;
            let matches = evaluator
                .evaluate_single(&program, &records, Utc::now(), &cancel)
                .await?;
            let selected: Vec<_> = records
                .into_iter()
                .zip(matches)
                .filter_map(|(r, matched)| matched.then_some(r))
                .collect();

            let executor = BatchDeleteExecutor::new(catalog.clone());
            let outcome = executor
                .execute(
                    &selected,
                    BatchDeleteOptions { dry_run, delete_files, confirm: !no_confirm },
                    &prompter,
                    &formatter,
                )
                .await?;
            info!(deleted = outcome.deleted.len(), failed = outcome.failed.len(), "delete complete");
        }
        Command::Test { .. } => unreachable!("handled above"),
        Command::Import { path, movie_id, mode } => {
            let executor = ManualImportExecutor::new(catalog.clone());
            let mode = match mode.as_str() {
                "copy" => ImportMode::Copy,
                _ => ImportMode::Move,
            };
            let outcome = executor
                .execute(
                    ManualImportOptions { folder: path, movie_id, filter_existing: true, mode },
                    &formatter,
                )
                .await?;
            info!(imported = outcome.imported.len(), rejected = outcome.rejected.len(), "import complete");
        }
        Command::Hardlink { no_confirm } => {
            let records = operations.load().await?;
            let executor = HardlinkRepairExecutor::new(catalog.clone(), torrent_client.clone());
            let prompter: Box<dyn librarian_actions::Prompter> = if no_confirm {
                Box::new(librarian_actions::Silent)
            } else {
                Box::new(StdPrompter)
            };
            let outcome = executor.execute(&records, prompter.as_ref(), &formatter).await?;
            info!(
                repaired = outcome.repaired.len(),
                deleted = outcome.deleted_for_research.len(),
                "hardlink repair complete"
            );
        }
        Command::Upgrade { unattended, match_mode, no_monitor, dry_run } => {
            let match_mode = match match_mode.as_str() {
                "all" => MatchMode::All,
                "any" => MatchMode::Any,
                other => {
                    return Err(LibraryError::Config {
                        field: "--match".to_string(),
                        message: format!("expected any or all, got {other:?}"),
                    })
                }
            };
            let records = operations.load().await?;
            let executor = UpgradeSearchExecutor::new(catalog.clone());
            let options = UpgradeSearchOptions {
                target_formats: config.actions.upgrade_target_formats.clone(),
                min_score: config.actions.upgrade_min_score,
                match_mode,
                check_availability: true,
                skip_monitoring: no_monitor,
                dry_run,
                batch_size: unattended.unwrap_or(config.actions.upgrade_batch_size),
                pace: config.upgrade_pace(),
            };
            let outcome = executor.execute(&records, &options, &formatter).await?;
            info!(
                searched = outcome.searched.len(),
                monitored = outcome.monitored.len(),
                "upgrade search complete"
            );
        }
    }

    handle.shutdown(Duration::from_secs(10)).await;
    Ok(())
}

fn run_test(command: &Command) -> Result<()> {
    let Command::Test { expression } = command else {
        unreachable!()
    };
    let program = compile(expression).map_err(|e| LibraryError::compilation(expression.clone(), e.to_string()))?;
    println!("compiled ok: {}", program.source_expression);
    Ok(())
}

fn resolve_filter(config: &LibrarianConfig, name: &str) -> Result<String> {
    config
        .filters
        .get(name)
        .cloned()
        .ok_or_else(|| LibraryError::NotFound { resource: format!("filter {name:?}") })
}
