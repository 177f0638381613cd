//! In-process worker pool.

use super::{merge, Executor};
use crate::error::PlaceError;
use crate::job::PlacementJob;
use crate::netlist::Placement;
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Function that runs one job to completion.
pub type JobRunner = fn(&PlacementJob) -> Result<Placement, PlaceError>;

/// Runs jobs on a `rayon` pool of `min(workers, jobs)` threads.
///
/// A panicking job is caught and reported as [`PlaceError::JobFailed`].
#[derive(Clone)]
pub struct LocalExecutor {
    workers: usize,
    runner: JobRunner,
}

impl LocalExecutor {
    /// Creates an executor; `None` uses the machine's available parallelism.
    pub fn new(workers: Option<usize>) -> Self {
        let workers = workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        Self {
            workers: workers.max(1),
            runner: PlacementJob::run,
        }
    }

    /// Replaces the job runner.
    pub fn with_runner(mut self, runner: JobRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Returns the configured worker limit.
    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl std::fmt::Debug for LocalExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalExecutor")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

impl Executor for LocalExecutor {
    fn submit(&self, jobs: Vec<PlacementJob>) -> Result<Placement, PlaceError> {
        if jobs.is_empty() {
            return Ok(Placement::new());
        }
        let threads = self.workers.min(jobs.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tessera-detailed-{i}"))
            .build()
            .map_err(|e| PlaceError::Executor(e.to_string()))?;
        tracing::info!(jobs = jobs.len(), threads, "dispatching to local pool");

        let runner = self.runner;
        let results: Vec<Result<_, PlaceError>> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let fingerprint = job.fingerprint()?;
                    tracing::debug!(cluster = %job.cluster, job = %fingerprint.short(), "job started");
                    let placement = catch_unwind(AssertUnwindSafe(|| runner(job)))
                        .map_err(|payload| PlaceError::JobFailed {
                            cluster: job.cluster,
                            reason: panic_message(payload),
                        })??;
                    tracing::debug!(cluster = %job.cluster, job = %fingerprint.short(), "job finished");
                    Ok((job.cluster, placement))
                })
                .collect()
        });

        let results = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        merge(&jobs, results)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
