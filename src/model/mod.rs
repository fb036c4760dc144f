//! Unified data model for media library representation
//!
//! These structures are independent of both the input (Plex) and
//! output (workbook) formats.

mod library;
mod movie;
mod show;

pub use library::{Library, LibrarySection, SectionKind};
pub use movie::{MediaInfo, Movie};
pub use show::{Show, ShowQuery};
