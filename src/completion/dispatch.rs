//! Parallel reconciliation of a batch of shows

use super::reconcile::{ReconcileError, Reconciler};
use super::result::{CatalogStatus, CompletionResult};
use crate::catalog::CatalogTransport;
use crate::model::ShowQuery;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Default upper bound on parallel workers
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Batch-wide failures; per-show problems never surface here
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Everything a batch produced
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// One result per input query, in input order
    pub results: Vec<CompletionResult>,

    /// Highest season index in any result
    pub max_season_index: u32,

    /// Per-show defects by input index
    pub defects: Vec<(usize, ReconcileError)>,

    /// Queries never reconciled because the batch was cancelled
    pub skipped: usize,
}

enum TaskOutcome {
    Done(CompletionResult),
    Defect(CompletionResult, ReconcileError),
    Skipped(CompletionResult),
}

/// Runs reconciliation on a bounded worker pool
pub struct Dispatcher<'a, T: CatalogTransport> {
    reconciler: &'a Reconciler<T>,
    max_workers: usize,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, T: CatalogTransport> Dispatcher<'a, T> {
    pub fn new(reconciler: &'a Reconciler<T>) -> Self {
        Self {
            reconciler,
            max_workers: DEFAULT_MAX_WORKERS,
            cancel: None,
        }
    }

    /// Cap the number of parallel workers (at least one)
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Stop starting new shows once `flag` is set
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Worker count used for a batch of `len` queries
    pub fn workers_for(&self, len: usize) -> usize {
        self.max_workers.min(len).max(1)
    }

    /// Reconcile every query, returning results in input order
    pub fn reconcile_all(&self, queries: &[ShowQuery]) -> Result<BatchOutcome, DispatchError> {
        if queries.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let workers = self.workers_for(queries.len());
        log::info!(
            "Processing {} TV shows with {} parallel workers...",
            queries.len(),
            workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("reconcile-{}", i))
            .build()?;

        let outcomes: Vec<TaskOutcome> = pool.install(|| {
            queries
                .par_iter()
                .map(|query| self.run_one(query))
                .collect()
        });

        let mut batch = BatchOutcome::default();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let result = match outcome {
                TaskOutcome::Done(result) => result,
                TaskOutcome::Defect(result, defect) => {
                    log::error!("Error processing show '{}': {}", result.title, defect);
                    batch.defects.push((index, defect));
                    result
                }
                TaskOutcome::Skipped(result) => {
                    batch.skipped += 1;
                    result
                }
            };
            if let Some(max) = result.max_season_index() {
                batch.max_season_index = batch.max_season_index.max(max);
            }
            batch.results.push(result);
        }

        log::info!(
            "Completed processing {} TV shows ({} defects, {} skipped).",
            batch.results.len(),
            batch.defects.len(),
            batch.skipped
        );
        Ok(batch)
    }

    fn run_one(&self, query: &ShowQuery) -> TaskOutcome {
        let unattempted = || {
            CompletionResult::unknown(
                query.title(),
                query.external_id().map(str::to_string),
                query.seasons(),
                CatalogStatus::NotAttempted,
            )
        };

        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
        {
            return TaskOutcome::Skipped(unattempted());
        }

        log::info!("Processing TV Show: {}", query.title());
        match self.reconciler.reconcile(query) {
            Ok(result) => TaskOutcome::Done(result),
            Err(defect @ ReconcileError::Catalog(_)) => TaskOutcome::Defect(
                CompletionResult::unknown(
                    query.title(),
                    query.external_id().map(str::to_string),
                    query.seasons(),
                    CatalogStatus::LookupFailed,
                ),
                defect,
            ),
            Err(defect) => TaskOutcome::Defect(unattempted(), defect),
        }
    }
}
