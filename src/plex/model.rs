//! Internal Plex data structures for XML parsing

use crate::model::{SectionKind, Show};

/// A library section entry from `/library/sections`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEntry {
    pub key: String,
    pub kind: SectionKind,
    pub title: String,
}

/// A show entry from a section listing, before its seasons are fetched
#[derive(Debug, Clone)]
pub struct ShowEntry {
    /// Plex metadata key used to list the seasons
    pub rating_key: String,
    pub show: Show,
}
