//! Plex Exporter - Plex library to spreadsheet exporter
//!
//! This library exports the movie and TV show sections of a Plex Media
//! Server to a workbook, checking every show's seasons against the TVMaze
//! episode guide.

pub mod cache;
pub mod catalog;
pub mod completion;
pub mod export;
pub mod model;
pub mod plex;

pub use cache::LookupCache;
pub use catalog::{CatalogClient, CatalogTransport, RetryPolicy};
pub use completion::{Dispatcher, Reconciler};
pub use export::config::ExportConfig;
pub use export::pipeline::ExportPipeline;
