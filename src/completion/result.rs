//! Completion results and their classification

use std::collections::BTreeMap;

/// Completion state of a season or a whole series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Completion {
    /// No catalog data for the show (lookup failed or no match)
    Unknown,

    /// The catalog knows the show but not this season
    NonexistentExternally,

    /// Every expected episode is present
    Complete,

    /// Fewer episodes than expected are present
    Incomplete,
}

/// What the catalog says to expect for a season
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// Expected episode count
    Count(u32),

    /// The catalog matched the show but does not list this season
    NotInCatalog,

    /// Nothing can be said about this season
    Unknown,
}

impl Expected {
    pub fn count(self) -> Option<u32> {
        match self {
            Expected::Count(n) => Some(n),
            _ => None,
        }
    }
}

/// Observed vs expected episodes for one season
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonCompletion {
    pub observed: u32,
    pub expected: Expected,
}

impl SeasonCompletion {
    pub fn classify(&self) -> Completion {
        match self.expected {
            Expected::Unknown => Completion::Unknown,
            Expected::NotInCatalog => Completion::NonexistentExternally,
            Expected::Count(expected) => classify_counts(self.observed, expected),
        }
    }
}

/// How the catalog side of a result was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogStatus {
    /// The show was matched
    Matched,

    /// The catalog confirmed it has no such show
    NoMatch,

    /// The lookup failed for this run
    LookupFailed,

    /// The query itself was unusable or was never dispatched
    NotAttempted,
}

/// Series-wide totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesCompletion {
    /// Episodes owned across every season
    pub observed: u32,

    /// Episodes owned in seasons with a known expected count
    pub observed_in_catalog: u32,

    /// Sum of known expected counts; `None` without catalog data
    pub expected: Option<u32>,
}

impl SeriesCompletion {
    pub fn classify(&self) -> Completion {
        match self.expected {
            None => Completion::Unknown,
            Some(expected) => classify_counts(self.observed_in_catalog, expected),
        }
    }
}

/// Reconciliation output for one show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub title: String,
    pub external_id: Option<String>,
    pub catalog: CatalogStatus,

    /// Season index -> completion, covering local and catalog seasons
    pub seasons: BTreeMap<u32, SeasonCompletion>,
}

impl CompletionResult {
    /// Result with every observed season unknown
    pub fn unknown(
        title: impl Into<String>,
        external_id: Option<String>,
        observed: &BTreeMap<u32, u32>,
        catalog: CatalogStatus,
    ) -> Self {
        let seasons = observed
            .iter()
            .map(|(&index, &count)| {
                (
                    index,
                    SeasonCompletion {
                        observed: count,
                        expected: Expected::Unknown,
                    },
                )
            })
            .collect();

        Self {
            title: title.into(),
            external_id,
            catalog,
            seasons,
        }
    }

    pub fn has_catalog_data(&self) -> bool {
        self.catalog == CatalogStatus::Matched
    }

    pub fn season(&self, index: u32) -> Option<&SeasonCompletion> {
        self.seasons.get(&index)
    }

    /// Classification of one season; seasons neither side knows are Unknown
    /// without catalog data and NonexistentExternally with it
    pub fn season_status(&self, index: u32) -> Completion {
        match self.seasons.get(&index) {
            Some(season) => season.classify(),
            None if self.has_catalog_data() => Completion::NonexistentExternally,
            None => Completion::Unknown,
        }
    }

    pub fn series(&self) -> SeriesCompletion {
        let observed = self.seasons.values().map(|s| s.observed).sum();

        if !self.has_catalog_data() {
            return SeriesCompletion {
                observed,
                observed_in_catalog: observed,
                expected: None,
            };
        }

        let (observed_in_catalog, expected) = self
            .seasons
            .values()
            .filter_map(|s| s.expected.count().map(|e| (s.observed, e)))
            .fold((0, 0), |(o, e), (so, se)| (o + so, e + se));

        SeriesCompletion {
            observed,
            observed_in_catalog,
            expected: Some(expected),
        }
    }

    pub fn series_status(&self) -> Completion {
        self.series().classify()
    }

    /// Highest season index in this result
    pub fn max_season_index(&self) -> Option<u32> {
        self.seasons.keys().next_back().copied()
    }

    /// Regular (non-special) seasons the catalog lists
    pub fn catalog_regular_seasons(&self) -> usize {
        self.seasons
            .iter()
            .filter(|(&index, s)| index > 0 && s.expected.count().is_some())
            .count()
    }

    /// Regular seasons that are complete
    pub fn complete_regular_seasons(&self) -> usize {
        self.seasons
            .iter()
            .filter(|(&index, s)| {
                index > 0
                    && matches!(s.expected, Expected::Count(n) if n > 0)
                    && s.classify() == Completion::Complete
            })
            .count()
    }

    /// Regular seasons with at least one local episode
    pub fn owned_regular_seasons(&self) -> usize {
        self.seasons
            .iter()
            .filter(|(&index, s)| index > 0 && s.observed > 0)
            .count()
    }
}

fn classify_counts(observed: u32, expected: u32) -> Completion {
    if observed >= expected {
        Completion::Complete
    } else {
        Completion::Incomplete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(observed: u32, expected: Expected) -> SeasonCompletion {
        SeasonCompletion { observed, expected }
    }

    #[test]
    fn test_classification_table() {
        assert_eq!(season(10, Expected::Count(10)).classify(), Completion::Complete);
        assert_eq!(season(6, Expected::Count(10)).classify(), Completion::Incomplete);
        assert_eq!(
            season(3, Expected::NotInCatalog).classify(),
            Completion::NonexistentExternally
        );
        assert_eq!(season(0, Expected::Count(0)).classify(), Completion::Complete);
        assert_eq!(season(0, Expected::Count(8)).classify(), Completion::Incomplete);
        assert_eq!(season(12, Expected::Count(10)).classify(), Completion::Complete);
        assert_eq!(season(5, Expected::Unknown).classify(), Completion::Unknown);
    }

    #[test]
    fn test_unknown_result() {
        let observed = BTreeMap::from([(1, 5), (2, 3)]);
        let result = CompletionResult::unknown("Show", None, &observed, CatalogStatus::LookupFailed);

        assert_eq!(result.season_status(1), Completion::Unknown);
        assert_eq!(result.season_status(2), Completion::Unknown);
        assert_eq!(result.series_status(), Completion::Unknown);
        assert_eq!(result.series().observed, 8);
        assert_eq!(result.max_season_index(), Some(2));
    }

    #[test]
    fn test_series_sums_only_resolvable_seasons() {
        let result = CompletionResult {
            title: "Show".to_string(),
            external_id: None,
            catalog: CatalogStatus::Matched,
            seasons: BTreeMap::from([
                (1, season(10, Expected::Count(10))),
                (2, season(4, Expected::Count(8))),
                (7, season(3, Expected::NotInCatalog)),
            ]),
        };

        let series = result.series();
        assert_eq!(series.observed, 17);
        assert_eq!(series.observed_in_catalog, 14);
        assert_eq!(series.expected, Some(18));
        assert_eq!(result.series_status(), Completion::Incomplete);
        assert_eq!(result.complete_regular_seasons(), 1);
        assert_eq!(result.catalog_regular_seasons(), 2);
        assert_eq!(result.owned_regular_seasons(), 3);
    }

    #[test]
    fn test_unlisted_season_status_depends_on_catalog() {
        let mut result = CompletionResult::unknown("Show", None, &BTreeMap::new(), CatalogStatus::NoMatch);
        assert_eq!(result.season_status(4), Completion::Unknown);

        result.catalog = CatalogStatus::Matched;
        assert_eq!(result.season_status(4), Completion::NonexistentExternally);
    }
}
