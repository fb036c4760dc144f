//! Catalog data as seen by reconciliation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Expected episode count for one catalog season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeasonInfo {
    /// Total episodes the catalog lists, `None` when it does not say
    pub total_episodes: Option<u32>,
}

/// Season/episode layout of a show according to the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogShowInfo {
    /// Highest season index the catalog knows about
    pub total_seasons: u32,

    /// Season index -> expected counts; only seasons with a known index
    pub seasons: BTreeMap<u32, CatalogSeasonInfo>,
}

impl CatalogShowInfo {
    /// Build show info from raw per-episode season numbers.
    ///
    /// Episodes without a season number are dropped.
    pub fn from_episode_seasons<I>(seasons: I) -> Self
    where
        I: IntoIterator<Item = Option<u32>>,
    {
        let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
        for season in seasons.into_iter().flatten() {
            *counts.entry(season).or_insert(0) += 1;
        }

        let total_seasons = counts.keys().next_back().copied().unwrap_or(0);
        let seasons = counts
            .into_iter()
            .map(|(index, count)| {
                (
                    index,
                    CatalogSeasonInfo {
                        total_episodes: Some(count),
                    },
                )
            })
            .collect();

        Self {
            total_seasons,
            seasons,
        }
    }

    /// Expected episode count for a season, if the catalog lists that season
    pub fn season(&self, index: u32) -> Option<&CatalogSeasonInfo> {
        self.seasons.get(&index)
    }
}

/// Outcome of a catalog lookup that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "show", rename_all = "snake_case")]
pub enum CatalogLookup {
    /// The catalog matched the show
    Found(CatalogShowInfo),

    /// The catalog confirmed it has no such show
    Absent,
}

impl CatalogLookup {
    /// Show info when found
    pub fn show(&self) -> Option<&CatalogShowInfo> {
        match self {
            CatalogLookup::Found(info) => Some(info),
            CatalogLookup::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, CatalogLookup::Absent)
    }
}

impl From<Option<CatalogShowInfo>> for CatalogLookup {
    fn from(value: Option<CatalogShowInfo>) -> Self {
        value.map_or(CatalogLookup::Absent, CatalogLookup::Found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_seasons_are_aggregated() {
        let info = CatalogShowInfo::from_episode_seasons(vec![
            Some(1),
            Some(1),
            Some(2),
            None,
            Some(0),
            Some(2),
            Some(2),
        ]);

        assert_eq!(info.total_seasons, 2);
        assert_eq!(info.seasons.len(), 3);
        assert_eq!(info.season(0).unwrap().total_episodes, Some(1));
        assert_eq!(info.season(1).unwrap().total_episodes, Some(2));
        assert_eq!(info.season(2).unwrap().total_episodes, Some(3));
        assert!(info.season(3).is_none());
    }

    #[test]
    fn test_no_numbered_episodes_yields_empty_show() {
        let info = CatalogShowInfo::from_episode_seasons(vec![None, None]);
        assert_eq!(info.total_seasons, 0);
        assert!(info.seasons.is_empty());
    }

    #[test]
    fn test_absent_serializes_distinctly() {
        let absent = serde_json::to_string(&CatalogLookup::Absent).unwrap();
        let empty = serde_json::to_string(&CatalogLookup::Found(CatalogShowInfo::default())).unwrap();
        assert_ne!(absent, empty);

        let back: CatalogLookup = serde_json::from_str(&absent).unwrap();
        assert!(back.is_absent());
    }
}
