//! Per-show reconciliation: cache, catalog, merge

use super::result::{CatalogStatus, CompletionResult, Expected, SeasonCompletion};
use crate::cache::{CacheKey, LookupCache};
use crate::catalog::{
    CatalogClient, CatalogLookup, CatalogShowInfo, CatalogTransport, LookupError,
};
use crate::model::ShowQuery;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Per-show defects that prevent reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The query has neither an external identifier nor a title
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    /// The catalog refused the request or answered with something unreadable
    #[error("catalog lookup failed: {0}")]
    Catalog(LookupError),
}

/// Matches shows against the catalog through the shared cache
pub struct Reconciler<T: CatalogTransport> {
    client: CatalogClient<T>,
    cache: Arc<LookupCache>,
}

impl<T: CatalogTransport> Reconciler<T> {
    pub fn new(client: CatalogClient<T>, cache: Arc<LookupCache>) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &CatalogClient<T> {
        &self.client
    }

    pub fn cache(&self) -> &Arc<LookupCache> {
        &self.cache
    }

    /// Cache key for a query: external id when present, else the title
    pub fn cache_key(query: &ShowQuery) -> CacheKey {
        match query.external_id() {
            Some(id) => CacheKey::external_id(id),
            None => CacheKey::title(query.title()),
        }
    }

    /// Reconcile one show.
    ///
    /// Transient catalog failures that outlast the retries yield an
    /// all-unknown result that is not cached. A malformed query and a
    /// rejected or unreadable catalog answer are errors.
    pub fn reconcile(&self, query: &ShowQuery) -> Result<CompletionResult, ReconcileError> {
        if query.is_malformed() {
            return Err(ReconcileError::MalformedQuery(
                "no external identifier and an empty title".to_string(),
            ));
        }

        let key = Self::cache_key(query);
        let lookup = match self.cache.get(&key) {
            Some(cached) => {
                log::debug!("Cache hit for catalog lookup: {:?}", key);
                cached
            }
            None => {
                log::debug!("Cache miss for catalog lookup: {:?}, querying catalog", key);
                match self.client.lookup(query) {
                    Ok(found) => {
                        self.cache.put(key, found.clone());
                        found
                    }
                    Err(e) if !e.is_transient() => {
                        return Err(ReconcileError::Catalog(e));
                    }
                    Err(e) => {
                        log::warn!(
                            "Catalog lookup failed for '{}' (id: {}): {}",
                            query.title(),
                            query.external_id().unwrap_or("N/A"),
                            e
                        );
                        return Ok(CompletionResult::unknown(
                            query.title(),
                            query.external_id().map(str::to_string),
                            query.seasons(),
                            CatalogStatus::LookupFailed,
                        ));
                    }
                }
            }
        };

        Ok(match lookup {
            CatalogLookup::Found(info) => merge(query, &info),
            CatalogLookup::Absent => {
                log::warn!(
                    "Could not find catalog info for: {} (id: {})",
                    query.title(),
                    query.external_id().unwrap_or("N/A")
                );
                CompletionResult::unknown(
                    query.title(),
                    query.external_id().map(str::to_string),
                    query.seasons(),
                    CatalogStatus::NoMatch,
                )
            }
        })
    }
}

/// Merge local season counts with catalog expectations
pub fn merge(query: &ShowQuery, info: &CatalogShowInfo) -> CompletionResult {
    let mut seasons = BTreeMap::new();

    for (&index, &observed) in query.seasons() {
        let expected = match info.season(index) {
            Some(season) => season
                .total_episodes
                .map_or(Expected::Unknown, Expected::Count),
            None => Expected::NotInCatalog,
        };
        seasons.insert(index, SeasonCompletion { observed, expected });
    }

    for (&index, season) in &info.seasons {
        seasons.entry(index).or_insert(SeasonCompletion {
            observed: 0,
            expected: season
                .total_episodes
                .map_or(Expected::Unknown, Expected::Count),
        });
    }

    CompletionResult {
        title: query.title().to_string(),
        external_id: query.external_id().map(str::to_string),
        catalog: CatalogStatus::Matched,
        seasons,
    }
}
