use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A TV show as known to the local library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Show {
    /// Show title
    pub title: String,

    /// Title in the original language, used for catalog search when present
    pub original_title: Option<String>,

    /// IMDB identifier without the `imdb://` scheme
    pub imdb_id: Option<String>,

    pub year: Option<u32>,
    pub studio: Option<String>,
    pub content_rating: Option<String>,
    pub summary: Option<String>,
    pub tagline: Option<String>,
    pub added_at: Option<NaiveDateTime>,
    pub last_viewed_at: Option<NaiveDateTime>,
    pub originally_available_at: Option<String>,
    pub audience_rating: Option<f64>,
    pub rating: Option<f64>,
    pub collections: Vec<String>,
    pub genres: Vec<String>,
    pub labels: Vec<String>,
    pub view_count: u32,
    pub skip_count: u32,

    /// Season index (0 = specials) -> episodes present locally
    pub seasons: BTreeMap<u32, u32>,
}

impl Show {
    /// Create a show with only a title set
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Title to hand to a free-text catalog search
    pub fn search_title(&self) -> &str {
        match self.original_title.as_deref() {
            Some(original) if !original.trim().is_empty() => original,
            _ => &self.title,
        }
    }

    /// Build the reconciliation input for this show
    pub fn to_query(&self) -> ShowQuery {
        ShowQuery::new(
            self.imdb_id.clone(),
            self.search_title().to_string(),
            self.seasons.clone(),
        )
    }
}

/// Input to reconciliation: who the show is and what is owned locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowQuery {
    external_id: Option<String>,
    title: String,
    seasons: BTreeMap<u32, u32>,
}

impl ShowQuery {
    /// Blank external identifiers are treated as absent
    pub fn new(external_id: Option<String>, title: String, seasons: BTreeMap<u32, u32>) -> Self {
        let external_id = external_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        Self {
            external_id,
            title,
            seasons,
        }
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Locally observed episode count per season index
    pub fn seasons(&self) -> &BTreeMap<u32, u32> {
        &self.seasons
    }

    /// True when there is nothing to look the show up by
    pub fn is_malformed(&self) -> bool {
        self.external_id.is_none() && self.title.trim().is_empty()
    }
}
