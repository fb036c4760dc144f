//! Plex Media Server library source
//!
//! Reads sections, movies, shows and local season inventories from a
//! Plex server's XML API.

mod client;
mod model;
mod parser;

pub use client::{PlexClient, PlexConfig};
pub use model::{SectionEntry, ShowEntry};
pub use parser::{parse_movies, parse_seasons, parse_sections, parse_shows};

use crate::model::{Library, LibrarySection, SectionKind, Show};
use anyhow::{Context, Result};
use rayon::prelude::*;
use thiserror::Error;

/// Failures talking to the Plex server
#[derive(Debug, Error)]
pub enum PlexError {
    #[error("Plex request failed: {0}")]
    Http(String),

    #[error("Plex returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid Plex XML {0}")]
    Xml(String),
}

/// Load every movie and show section from the server
///
/// A section that fails to load is logged and skipped. A show whose
/// season listing fails keeps an empty season inventory.
///
/// # Arguments
/// * `client` - Connected Plex client
/// * `workers` - Parallel season requests
pub fn load_library(client: &PlexClient, workers: usize) -> Result<Library> {
    log::info!("Listing Plex sections from {}", client.base_url());
    let sections = client
        .sections()
        .context("Failed to list Plex library sections")?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .context("Failed to create Plex worker pool")?;

    let mut library = Library::new();

    for entry in sections {
        log::info!("Loading section '{}'", entry.title);
        let loaded = match entry.kind {
            SectionKind::Movie => client.movies(&entry.key).map(|movies| {
                let mut section = LibrarySection::new(&entry.title, SectionKind::Movie);
                section.movies = movies;
                section
            }),
            SectionKind::Show => client.shows(&entry.key).map(|shows| {
                let mut section = LibrarySection::new(&entry.title, SectionKind::Show);
                section.shows = pool.install(|| load_seasons(client, shows));
                section
            }),
        };

        match loaded {
            Ok(section) => {
                log::info!("Section '{}': {} items", section.title, section.len());
                library.add_section(section);
            }
            Err(e) => log::error!("Skipping section '{}': {}", entry.title, e),
        }
    }

    log::info!(
        "Loaded library: {} movies, {} shows",
        library.movie_count(),
        library.show_count()
    );

    Ok(library)
}

fn load_seasons(client: &PlexClient, entries: Vec<ShowEntry>) -> Vec<Show> {
    entries
        .into_par_iter()
        .map(|entry| {
            let mut show = entry.show;
            match client.seasons(&entry.rating_key, &show.title) {
                Ok(seasons) => show.seasons = seasons,
                Err(e) => log::error!("Failed to list seasons for '{}': {}", show.title, e),
            }
            show
        })
        .collect()
}
