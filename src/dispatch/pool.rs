//! Bounded worker pool for value-returning endpoint methods.
//!
//! # Responsibilities
//! - Run endpoint method bodies off the request task (tokio blocking pool)
//! - Cap concurrently running jobs at `max_workers` via a semaphore
//! - Apply the overflow policy once `queue_depth` jobs are already waiting
//! - Enforce the per-job timeout and flag cancellation to the running job
//!
//! A job that times out keeps its worker slot until its body returns; the
//! blocking thread cannot be interrupted, only told to stop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::config::{DispatchConfig, OverflowPolicy};
use crate::http::context::Cancellation;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Dispatch queue full ({waiting} waiting)")]
    Rejected { waiting: usize },

    #[error("Dispatched call timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Dispatched call panicked")]
    Panicked,

    #[error("Dispatch pool closed")]
    Closed,
}

pub struct DispatchPool {
    workers: Arc<Semaphore>,
    waiting: Arc<AtomicUsize>,
    max_workers: usize,
    queue_depth: usize,
    overflow: OverflowPolicy,
    timeout: Option<Duration>,
}

impl DispatchPool {
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            workers: Arc::new(Semaphore::new(config.max_workers)),
            waiting: Arc::new(AtomicUsize::new(0)),
            max_workers: config.max_workers,
            queue_depth: config.queue_depth,
            overflow: config.overflow,
            timeout: (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms)),
        }
    }

    /// Run `job` on a worker.
    ///
    /// `cancellation` is flagged if the call times out or the returned future
    /// is dropped before the job finishes.
    pub async fn run<F, R>(&self, cancellation: Cancellation, job: F) -> Result<R, DispatchError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let mut guard = CancelOnDrop(Some(cancellation.clone()));

        let work = async {
            let worker = Worker::start(self.acquire().await?);
            let handle = tokio::task::spawn_blocking(move || {
                let _worker = worker;
                job()
            });
            handle.await.map_err(|e| {
                tracing::error!(error = %e, "Dispatched call failed to complete");
                DispatchError::Panicked
            })
        };

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => {
                    cancellation.cancel();
                    metrics::record_dispatch_timeout();
                    tracing::warn!(timeout = ?limit, "Dispatched call timed out");
                    Err(DispatchError::TimedOut(limit))
                }
            },
            None => work.await,
        };

        guard.disarm();
        result
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, DispatchError> {
        match self.workers.clone().try_acquire_owned() {
            Ok(permit) => return Ok(permit),
            Err(TryAcquireError::Closed) => return Err(DispatchError::Closed),
            Err(TryAcquireError::NoPermits) => {}
        }

        let waiting = self.waiting.fetch_add(1, Ordering::AcqRel);
        let _slot = WaitSlot(self.waiting.clone());

        if waiting >= self.queue_depth {
            match self.overflow {
                OverflowPolicy::Reject => {
                    metrics::record_dispatch_rejected();
                    tracing::warn!(
                        waiting,
                        queue_depth = self.queue_depth,
                        "Dispatch queue full, rejecting call"
                    );
                    return Err(DispatchError::Rejected { waiting });
                }
                OverflowPolicy::Wait => {
                    tracing::debug!(waiting, "Dispatch queue over depth, waiting anyway");
                }
            }
        }

        self.workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::Closed)
    }

    /// Worker slots currently free.
    pub fn available_workers(&self) -> usize {
        self.workers.available_permits()
    }

    /// Calls waiting for a worker slot.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Per-call deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Flags cancellation unless disarmed, i.e. when the caller stops waiting.
struct CancelOnDrop(Option<Cancellation>);

impl CancelOnDrop {
    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(cancellation) = self.0.take() {
            cancellation.cancel();
        }
    }
}

/// A held worker slot. Released when the job body returns or unwinds.
struct Worker(#[allow(dead_code)] OwnedSemaphorePermit);

impl Worker {
    fn start(permit: OwnedSemaphorePermit) -> Self {
        metrics::record_dispatch_started();
        Self(permit)
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        metrics::record_dispatch_finished();
    }
}

/// Releases a queue position.
struct WaitSlot(Arc<AtomicUsize>);

impl Drop for WaitSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
