//! Episode-guide catalog access
//!
//! The catalog is reached through the [`CatalogTransport`] trait so the
//! network implementation ([`TvMazeTransport`]) can be swapped for a mock.
//! [`CatalogClient`] layers the two-step match strategy and the retry
//! policy on top of a transport. It never touches the lookup cache.

mod retry;
mod tvmaze;
mod types;

pub use retry::RetryPolicy;
pub use tvmaze::{TvMazeConfig, TvMazeTransport};
pub use types::{CatalogLookup, CatalogSeasonInfo, CatalogShowInfo};

use crate::model::ShowQuery;
use thiserror::Error;

/// Errors that can occur when querying the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Network failure, timeout, rate limiting or a server-side error.
    #[error("transient catalog failure: {0}")]
    Transient(String),

    /// The catalog refused the request (4xx other than not-found).
    #[error("catalog rejected request: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// The response could not be understood.
    #[error("malformed catalog response: {0}")]
    Malformed(String),
}

impl LookupError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LookupError::Transient(_))
    }
}

/// The two logical operations a catalog service offers.
///
/// Implementations report a confirmed "no such show" as
/// [`CatalogLookup::Absent`], never as an error.
pub trait CatalogTransport: Send + Sync {
    /// Direct lookup by external (IMDB) identifier
    fn lookup_by_external_id(&self, external_id: &str) -> Result<CatalogLookup, LookupError>;

    /// Free-text search by title; the first result is taken as the match
    fn search_by_title(&self, title: &str) -> Result<CatalogLookup, LookupError>;
}

/// Catalog client applying match strategy and retries around a transport
pub struct CatalogClient<T: CatalogTransport> {
    transport: T,
    retry: RetryPolicy,
}

impl<T: CatalogTransport> CatalogClient<T> {
    /// Create a client with the default retry policy
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Resolve a show against the catalog.
    ///
    /// The external identifier is tried first; the title search runs when
    /// there is no identifier or the identifier lookup came back absent.
    /// Errors after exhausted retries propagate to the caller.
    pub fn lookup(&self, query: &ShowQuery) -> Result<CatalogLookup, LookupError> {
        if let Some(external_id) = query.external_id() {
            let label = format!("catalog lookup for id '{}'", external_id);
            let found = self
                .retry
                .run(&label, || self.transport.lookup_by_external_id(external_id))?;

            if !found.is_absent() {
                log::debug!("Catalog match via external id: {}", external_id);
                return Ok(found);
            }
            log::debug!("No catalog match for id {}, falling back to title", external_id);
        }

        let title = query.title().trim();
        if title.is_empty() {
            return Ok(CatalogLookup::Absent);
        }

        let label = format!("catalog search for '{}'", title);
        let found = self.retry.run(&label, || self.transport.search_by_title(title))?;
        if found.is_absent() {
            log::debug!("No catalog match for title: {}", title);
        } else {
            log::debug!("Catalog match via title search: {}", title);
        }
        Ok(found)
    }
}
