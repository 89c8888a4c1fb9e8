//! Bounded worker pool (spec §4.4).
//!
//! Modeled on the fan-out-and-collect style of `multi_indexer.rs` and
//! `jobs/list_sync.rs`, but generalized into a reusable primitive: a fixed
//! number of `tokio` workers pull boxed jobs off a bounded `mpsc` channel.
//! Submission blocks until a slot is free or the pool has been stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{LibraryError, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolInner {
    tx: mpsc::Sender<Job>,
    stopped: AtomicBool,
}

/// A bounded pool of fixed-size workers. Queue capacity is `2 * workers`
/// (spec §4.4) to absorb submission bursts without unbounded growth.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

pub struct PoolHandle {
    workers: JoinSet<()>,
}

impl WorkerPool {
    /// Spawns `workers` tasks (at least 1) and returns the pool plus a
    /// handle used to await graceful shutdown.
    pub fn new(workers: usize) -> (Self, PoolHandle) {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::channel::<Job>(2 * workers);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let mut join_set = JoinSet::new();
        for id in 0..workers {
            let rx = rx.clone();
            join_set.spawn(async move {
                loop {
                    let job = {
                        let mut rx = rx.lock().await;
                        rx.recv().await
                    };
                    match job {
                        Some(job) => job(),
                        None => {
                            debug!(worker = id, "worker pool queue closed, exiting");
                            break;
                        }
                    }
                }
            });
        }

        let pool = WorkerPool {
            inner: Arc::new(PoolInner {
                tx,
                stopped: AtomicBool::new(false),
            }),
        };
        (pool, PoolHandle { workers: join_set })
    }

    /// Submits a unit of work, returning its result once it runs. Fails
    /// immediately with [`LibraryError::PoolStopped`] if the pool has been
    /// shut down, or with [`LibraryError::Cancelled`] if `cancel` fires
    /// before a worker slot is available.
    pub async fn submit<F, T>(&self, cancel: &CancellationToken, f: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.inner.stopped.load(Ordering::Acquire) {
            return Err(LibraryError::PoolStopped);
        }
        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            let result = f();
            let _ = result_tx.send(result);
        });

        tokio::select! {
            send = self.inner.tx.send(job) => {
                send.map_err(|_| LibraryError::PoolStopped)?;
            }
            _ = cancel.cancelled() => {
                return Err(LibraryError::Cancelled);
            }
        }

        tokio::select! {
            res = result_rx => res.map_err(|_| LibraryError::PoolStopped),
            _ = cancel.cancelled() => Err(LibraryError::Cancelled),
        }
    }

    /// Marks the pool stopped: further submissions fail with
    /// `PoolStopped`; workers drain once the channel is dropped.
    pub fn mark_stopped(&self) {
        self.inner.stopped.store(true, Ordering::Release);
    }
}

impl PoolHandle {
    /// Awaits all workers, bounded by `deadline`. Workers only exit once
    /// every sender clone (the pool and any in-flight submit) has been
    /// dropped, so callers must drop the `WorkerPool` (or call
    /// `mark_stopped` and drop it) before awaiting shutdown.
    pub async fn shutdown(mut self, deadline: std::time::Duration) {
        let wait = async {
            while self.workers.join_next().await.is_some() {}
        };
        if tokio::time::timeout(deadline, wait).await.is_err() {
            warn!("worker pool shutdown deadline elapsed with workers still running");
        }
    }
}
