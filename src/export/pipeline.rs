//! Main export pipeline orchestration

use super::config::ExportConfig;
use super::fields::CellValue;
use super::workbook::{output_file_name, ExportWorkbook};
use crate::cache::LookupCache;
use crate::catalog::{CatalogClient, CatalogTransport};
use crate::completion::{BatchOutcome, Dispatcher, Reconciler};
use crate::model::{Library, LibrarySection, Movie, SectionKind, Show, ShowQuery};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Summary of a finished export
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Path of the written workbook
    pub workbook: PathBuf,
    pub sheets: usize,
    pub movies: usize,
    pub shows: usize,

    /// Shows that could not be reconciled
    pub defects: usize,
}

/// Main export pipeline
pub struct ExportPipeline<T: CatalogTransport> {
    config: ExportConfig,
    reconciler: Reconciler<T>,
    pool: rayon::ThreadPool,
    cancel: Option<Arc<AtomicBool>>,
}

impl<T: CatalogTransport> ExportPipeline<T> {
    /// Create a new export pipeline
    pub fn new(
        config: ExportConfig,
        client: CatalogClient<T>,
        cache: Arc<LookupCache>,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .context("Failed to create export worker pool")?;

        Ok(Self {
            config,
            reconciler: Reconciler::new(client, cache),
            pool,
            cancel: None,
        })
    }

    /// Stop starting new show lookups once `flag` is set
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn reconciler(&self) -> &Reconciler<T> {
        &self.reconciler
    }

    /// Run the complete export process
    ///
    /// The lookup cache is saved even when writing the workbook fails.
    pub fn export(&self, library: &Library) -> Result<ExportReport> {
        log::info!("Starting Plex export");
        log::info!("Target: {:?}", self.config.output_dir);

        let written = self.write_workbook(library);

        match self.reconciler.cache().save() {
            Ok(0) => {}
            Ok(count) => log::info!("Saved {} catalog lookups to cache", count),
            Err(e) => log::error!("Failed to save lookup cache: {}", e),
        }

        let report = written?;
        log::info!("Export complete: {:?}", report.workbook);
        Ok(report)
    }

    fn write_workbook(&self, library: &Library) -> Result<ExportReport> {
        std::fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!("Failed to create output directory: {:?}", self.config.output_dir)
        })?;

        let mut workbook = ExportWorkbook::new();
        let mut report = ExportReport {
            workbook: self
                .config
                .output_dir
                .join(output_file_name(chrono::Local::now().naive_local())),
            sheets: 0,
            movies: 0,
            shows: 0,
            defects: 0,
        };

        for section in library.sections() {
            let written = match section.kind {
                SectionKind::Movie => self.write_movie_section(&mut workbook, section).map(|n| {
                    report.movies += n;
                }),
                SectionKind::Show => self.write_show_section(&mut workbook, section).map(|o| {
                    report.shows += o.results.len();
                    report.defects += o.defects.len();
                }),
            };

            match written {
                Ok(()) => report.sheets += 1,
                Err(e) => log::error!("Skipping section '{}': {:#}", section.title, e),
            }
        }

        workbook
            .save(&report.workbook)
            .with_context(|| format!("Failed to save workbook: {:?}", report.workbook))?;

        Ok(report)
    }

    fn write_movie_section(
        &self,
        workbook: &mut ExportWorkbook,
        section: &LibrarySection,
    ) -> Result<usize> {
        log::info!("Processing movie section '{}'", section.title);
        let rows = self.movie_rows(&section.movies);

        workbook
            .add_movie_sheet(&section.title, &self.config.movie_fields, &rows)
            .with_context(|| format!("Failed to write sheet for '{}'", section.title))?;

        log::info!("Wrote {} movies from '{}'", rows.len(), section.title);
        Ok(rows.len())
    }

    /// Extract the selected fields of every movie, sorted by title
    pub fn movie_rows(&self, movies: &[Movie]) -> Vec<Vec<CellValue>> {
        let mut sorted: Vec<&Movie> = movies.iter().collect();
        sorted.sort_by_cached_key(|m| m.title.to_lowercase());

        let fields = &self.config.movie_fields;
        self.pool.install(|| {
            sorted
                .par_iter()
                .map(|movie| fields.iter().map(|f| f.movie_value(movie)).collect())
                .collect()
        })
    }

    fn write_show_section(
        &self,
        workbook: &mut ExportWorkbook,
        section: &LibrarySection,
    ) -> Result<BatchOutcome> {
        log::info!("Processing TV show section '{}'", section.title);

        let mut shows: Vec<&Show> = section.shows.iter().collect();
        shows.sort_by_cached_key(|s| s.title.to_lowercase());

        let outcome = self.reconcile(&shows)?;

        workbook
            .add_show_sheet(&section.title, &self.config.show_fields, &shows, &outcome)
            .with_context(|| format!("Failed to write sheet for '{}'", section.title))?;

        Ok(outcome)
    }

    /// Reconcile shows against the catalog, in the given order
    pub fn reconcile(&self, shows: &[&Show]) -> Result<BatchOutcome> {
        let queries: Vec<ShowQuery> = shows.iter().map(|s| s.to_query()).collect();

        let mut dispatcher = Dispatcher::new(&self.reconciler).with_max_workers(self.config.workers);
        if let Some(flag) = &self.cancel {
            dispatcher = dispatcher.with_cancellation(Arc::clone(flag));
        }

        Ok(dispatcher.reconcile_all(&queries)?)
    }
}
