//! Bounded worker pool for running the pipeline off the caller's thread.
//!
//! The pipeline is synchronous and CPU-bound. A server embeds it by
//! submitting jobs here and waiting on the returned [`PendingResult`], with
//! or without a deadline.
//!
//! Two deadline flavours:
//! - [`PendingResult::wait_timeout`] only stops the *wait*. The job keeps
//!   running on its worker and may still write its file.
//! - [`PendingResult::wait_or_cancel`] also cancels the job and waits for it
//!   to stop. On `TimedOut` nothing was written; if the job got past its last
//!   cancellation check first, its result is returned instead.

use crate::config::{ProcessingConfig, effective_threads};
use crate::imaging::ProcessingOptions;
use crate::pipeline::{ProcessError, ProcessingResult};
use crate::pipeline::Pipeline;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Failed to start worker pool: {0}")]
    Build(String),
    #[error("Timed out after {0:?} waiting for image")]
    TimedOut(Duration),
    #[error("Worker exited without a result")]
    Disconnected,
    #[error(transparent)]
    Process(#[from] ProcessError),
}

type JobResult = Result<ProcessingResult, ProcessError>;

pub struct ProcessingPool {
    pool: rayon::ThreadPool,
}

impl ProcessingPool {
    /// Pool sized from config (`None` = all cores, never more than cores).
    pub fn new(config: &ProcessingConfig) -> Result<Self, PoolError> {
        Self::with_threads(effective_threads(config))
    }

    pub fn with_threads(threads: usize) -> Result<Self, PoolError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pixbudget-{i}"))
            // Without a handler rayon aborts the process on a job panic
            .panic_handler(|_| tracing::error!("image worker panicked"))
            .build()
            .map_err(|e| PoolError::Build(e.to_string()))?;
        tracing::debug!(threads = pool.current_num_threads(), "worker pool ready");
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queue one image through the default pipeline.
    pub fn submit(
        &self,
        bytes: Vec<u8>,
        dest: PathBuf,
        options: ProcessingOptions,
    ) -> PendingResult {
        self.submit_with(move |cancel| {
            Pipeline::new().process_cancellable(&bytes, &dest, &options, cancel)
        })
    }

    /// Queue an arbitrary pipeline run (custom codec, pre-decoded source, ...).
    ///
    /// The job receives the cancel flag set by
    /// [`PendingResult::wait_or_cancel`]; jobs that ignore it cannot be
    /// cancelled.
    pub fn submit_with<F>(&self, job: F) -> PendingResult
    where
        F: FnOnce(&AtomicBool) -> JobResult + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let cancel = Arc::new(AtomicBool::new(false));
        let job_cancel = Arc::clone(&cancel);
        self.pool.spawn(move || {
            // Receiver may be gone after a timeout; the result is discarded
            let _ = tx.send(job(&job_cancel));
        });
        PendingResult { rx, cancel }
    }
}

/// Handle to a queued job.
#[must_use = "a pending result does nothing unless waited on"]
pub struct PendingResult {
    rx: mpsc::Receiver<JobResult>,
    cancel: Arc<AtomicBool>,
}

impl PendingResult {
    /// Block until the job finishes.
    pub fn wait(self) -> Result<ProcessingResult, PoolError> {
        match self.rx.recv() {
            Ok(result) => Ok(result?),
            Err(mpsc::RecvError) => Err(PoolError::Disconnected),
        }
    }

    /// Block for at most `timeout`.
    pub fn wait_timeout(self, timeout: Duration) -> Result<ProcessingResult, PoolError> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Ok(result?),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(?timeout, "gave up waiting for image");
                Err(PoolError::TimedOut(timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(PoolError::Disconnected),
        }
    }

    /// Block for at most `timeout`, then cancel the job and wait until it
    /// has stopped.
    pub fn cancel_after(self, timeout: Duration) -> Result<ProcessingResult, PoolError> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => return Ok(result?),
            Err(mpsc::RecvTimeoutError::Disconnected) => return Err(PoolError::Disconnected),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }

        tracing::warn!(?timeout, "deadline passed, cancelling image");
        self.cancel.store(true, Ordering::SeqCst);
        match self.rx.recv() {
            Ok(Err(ProcessError::Cancelled)) => Err(PoolError::TimedOut(timeout)),
            Ok(result) => {
                tracing::info!("image finished before the cancel was seen");
                Ok(result?)
            }
            Err(mpsc::RecvError) => Err(PoolError::Disconnected),
        }
    }

    /// [`cancel_after`](Self::cancel_after) when a deadline is set, else
    /// [`wait`](Self::wait).
    pub fn wait_or_cancel(self, timeout: Option<Duration>) -> Result<ProcessingResult, PoolError> {
        match timeout {
            Some(t) => self.cancel_after(t),
            None => self.wait(),
        }
    }

    /// [`wait_timeout`](Self::wait_timeout) when a deadline is set, else [`wait`](Self::wait).
    pub fn wait_for(self, timeout: Option<Duration>) -> Result<ProcessingResult, PoolError> {
        match timeout {
            Some(t) => self.wait_timeout(t),
            None => self.wait(),
        }
    }
}
