//! Export configuration

use super::fields::{Field, DEFAULT_MOVIE_FIELDS, DEFAULT_SHOW_FIELDS};
use crate::completion::DEFAULT_MAX_WORKERS;
use std::path::PathBuf;

/// Cache file name used when no explicit path is given
pub const CACHE_FILE_NAME: &str = ".tvmaze_cache.json";

/// Configuration for the export process
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory the workbook is written to
    pub output_dir: PathBuf,

    /// Columns of movie sheets
    pub movie_fields: Vec<Field>,

    /// Leading columns of show sheets
    pub show_fields: Vec<Field>,

    /// Parallel workers for reconciliation and row extraction
    pub workers: usize,
}

impl ExportConfig {
    /// Create a new export configuration
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            movie_fields: DEFAULT_MOVIE_FIELDS.to_vec(),
            show_fields: DEFAULT_SHOW_FIELDS.to_vec(),
            workers: DEFAULT_MAX_WORKERS,
        }
    }

    pub fn with_movie_fields(mut self, fields: Vec<Field>) -> Self {
        if !fields.is_empty() {
            self.movie_fields = fields;
        }
        self
    }

    pub fn with_show_fields(mut self, fields: Vec<Field>) -> Self {
        if !fields.is_empty() {
            self.show_fields = fields;
        }
        self
    }

    /// Set the worker cap (at least one)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Default location of the lookup cache for this output directory
    pub fn default_cache_path(&self) -> PathBuf {
        self.output_dir.join(CACHE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::new(PathBuf::from("/tmp/out"));
        assert_eq!(config.movie_fields, DEFAULT_MOVIE_FIELDS);
        assert_eq!(config.workers, DEFAULT_MAX_WORKERS);
        assert_eq!(
            config.default_cache_path(),
            PathBuf::from("/tmp/out/.tvmaze_cache.json")
        );
    }

    #[test]
    fn test_empty_selection_keeps_defaults() {
        let config = ExportConfig::new(PathBuf::from("."))
            .with_show_fields(Vec::new())
            .with_workers(0);
        assert_eq!(config.show_fields, DEFAULT_SHOW_FIELDS);
        assert_eq!(config.workers, 1);
    }
}
