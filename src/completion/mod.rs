//! TV show completion reconciliation
//!
//! [`Reconciler`] resolves one show against the catalog (cache first) and
//! merges the catalog's expectations with the locally observed season
//! counts. [`Dispatcher`] runs it for a whole library section in parallel.

mod dispatch;
mod reconcile;
mod result;

pub use dispatch::{BatchOutcome, DispatchError, Dispatcher, DEFAULT_MAX_WORKERS};
pub use reconcile::{merge, ReconcileError, Reconciler};
pub use result::{
    CatalogStatus, Completion, CompletionResult, Expected, SeasonCompletion, SeriesCompletion,
};
