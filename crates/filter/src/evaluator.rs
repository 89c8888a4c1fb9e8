//! Concurrent single-filter and batch evaluators (spec §4.1 "concurrent
//! evaluator" + "evaluation error policy"), built on top of
//! `librarian_core::WorkerPool`. Grounded on `indexers/src/multi_indexer.rs`'s
//! fan-out-and-collect shape.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use librarian_core::models::Record;
use librarian_core::WorkerPool;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::compile::Program;

/// Below this many records, evaluation happens in the calling task; above
/// it, records are partitioned across the worker pool (spec §4.1).
pub const DEFAULT_BATCH_THRESHOLD: usize = 100;

pub struct ConcurrentEvaluator {
    pool: WorkerPool,
    workers: usize,
    batch_threshold: usize,
}

impl ConcurrentEvaluator {
    pub fn new(pool: WorkerPool, workers: usize) -> Self {
        Self {
            pool,
            workers: workers.max(1),
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
        }
    }

    pub fn with_batch_threshold(mut self, threshold: usize) -> Self {
        self.batch_threshold = threshold.max(1);
        self
    }

    /// Evaluates a single compiled filter against every record, preserving
    /// input order. A record whose evaluation errors is logged and treated
    /// as non-matching rather than aborting the whole run (spec §4.1
    /// evaluation error policy).
    pub async fn evaluate_single(
        &self,
        program: &Program,
        records: &[Record],
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> librarian_core::Result<Vec<bool>> {
        if records.len() <= self.batch_threshold {
            return Ok(eval_chunk(program, records, now));
        }

        let chunk_size = (records.len() / self.workers).max(self.batch_threshold);
        let mut results = Vec::with_capacity(records.len());
        for chunk in records.chunks(chunk_size) {
            if cancel.is_cancelled() {
                return Err(librarian_core::LibraryError::Cancelled);
            }
            let program = program.clone();
            let chunk = chunk.to_vec();
            let chunk_result = self
                .pool
                .submit(cancel, move || eval_chunk(&program, &chunk, now))
                .await?;
            results.extend(chunk_result);
        }
        Ok(results)
    }

    /// Evaluates every named filter against the full record slice
    /// concurrently, one task per filter. A filter whose task fails
    /// outright (pool stopped, cancelled) is dropped from the output and
    /// logged rather than failing the whole batch (spec §4.1).
    pub async fn evaluate_batch(
        &self,
        programs: &HashMap<String, Program>,
        records: &[Record],
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> HashMap<String, Vec<bool>> {
        type BatchFuture =
            Pin<Box<dyn Future<Output = librarian_core::Result<Vec<bool>>> + Send>>;

        let records = Arc::new(records.to_vec());
        let mut tasks: Vec<(String, BatchFuture)> = Vec::with_capacity(programs.len());
        for (name, program) in programs {
            let program = program.clone();
            let records = records.clone();
            let name = name.clone();
            let fut: BatchFuture = Box::pin(
                self.pool
                    .submit(cancel, move || eval_chunk(&program, &records, now)),
            );
            tasks.push((name, fut));
        }

        let mut out = HashMap::with_capacity(tasks.len());
        for (name, fut) in tasks {
            match fut.await {
                Ok(result) => {
                    out.insert(name, result);
                }
                Err(err) => {
                    warn!(filter = %name, error = %err, "dropping filter from batch evaluation");
                }
            }
        }
        out
    }
}

fn eval_chunk(program: &Program, records: &[Record], now: DateTime<Utc>) -> Vec<bool> {
    records
        .iter()
        .map(|record| match program.eval(record, now) {
            Ok(matched) => matched,
            Err(err) => {
                warn!(
                    record_id = record.id,
                    filter = %program.source_expression,
                    error = %err,
                    "filter evaluation error, treating record as non-matching"
                );
                false
            }
        })
        .collect()
}
