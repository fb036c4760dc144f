use plex_exporter::cache::{LookupCache, SCHEMA_VERSION};
use plex_exporter::catalog::{CatalogLookup, CatalogShowInfo, LookupError};
use plex_exporter::export::CellValue;
use plex_exporter::model::{Library, LibrarySection, MediaInfo, Movie, SectionKind, Show};
use plex_exporter::{CatalogClient, CatalogTransport, ExportConfig, ExportPipeline, RetryPolicy};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Catalog that knows every show as having two seasons of ten episodes
struct TwoSeasonCatalog;

impl CatalogTransport for TwoSeasonCatalog {
    fn lookup_by_external_id(&self, _external_id: &str) -> Result<CatalogLookup, LookupError> {
        Ok(CatalogLookup::Absent)
    }

    fn search_by_title(&self, _title: &str) -> Result<CatalogLookup, LookupError> {
        Ok(CatalogLookup::Found(CatalogShowInfo::from_episode_seasons(
            (1..=2).flat_map(|s| std::iter::repeat(Some(s)).take(10)),
        )))
    }
}

/// Catalog that is never reachable
struct OfflineCatalog;

impl CatalogTransport for OfflineCatalog {
    fn lookup_by_external_id(&self, _external_id: &str) -> Result<CatalogLookup, LookupError> {
        Err(LookupError::Transient("offline".to_string()))
    }

    fn search_by_title(&self, _title: &str) -> Result<CatalogLookup, LookupError> {
        Err(LookupError::Transient("offline".to_string()))
    }
}

/// Create a minimal test library
fn create_test_library() -> Library {
    let mut movies = LibrarySection::new("Movies", SectionKind::Movie);

    let mut heat = Movie::new("Heat");
    heat.year = Some(1995);
    heat.duration_ms = Some(10_230_000);
    heat.media = Some(MediaInfo {
        video_resolution: Some("1080".to_string()),
        bitrate: Some(9_800),
        container: Some("mkv".to_string()),
        file: Some(PathBuf::from("/media/movies/Heat.mkv")),
        ..MediaInfo::default()
    });
    movies.movies.push(heat);
    movies.movies.push(Movie::new("alien"));

    let mut shows = LibrarySection::new("TV Shows", SectionKind::Show);

    let mut complete = Show::new("Complete Show");
    complete.seasons = BTreeMap::from([(1, 10), (2, 10)]);
    let mut partial = Show::new("Partial Show");
    partial.seasons = BTreeMap::from([(0, 1), (1, 4)]);
    shows.shows.push(partial);
    shows.shows.push(complete);

    let mut lib = Library::new();
    lib.add_section(movies);
    lib.add_section(shows);
    lib
}

fn pipeline<T: CatalogTransport>(
    output_dir: PathBuf,
    transport: T,
    cache: Arc<LookupCache>,
) -> ExportPipeline<T> {
    let config = ExportConfig::new(output_dir).with_workers(2);
    let client = CatalogClient::new(transport).with_retry(RetryPolicy::none());
    ExportPipeline::new(config, client, cache).expect("Failed to create pipeline")
}

#[test]
fn test_library_creation() {
    let lib = create_test_library();

    assert_eq!(lib.sections().len(), 2);
    assert_eq!(lib.movie_count(), 2);
    assert_eq!(lib.show_count(), 2);
}

#[test]
fn test_export_writes_workbook_and_cache() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output_dir = temp_dir.path().join("export");
    let config = ExportConfig::new(output_dir.clone());
    let cache = Arc::new(LookupCache::load(config.default_cache_path()));

    let pipeline = pipeline(output_dir.clone(), TwoSeasonCatalog, Arc::clone(&cache));
    let report = pipeline
        .export(&create_test_library())
        .expect("Export failed");

    assert_eq!(report.sheets, 2);
    assert_eq!(report.movies, 2);
    assert_eq!(report.shows, 2);
    assert_eq!(report.defects, 0);

    // Workbook is a zip container named by timestamp
    let name = report.workbook.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("PlexMediaExport_"));
    assert!(name.ends_with(".xlsx"));
    let bytes = fs::read(&report.workbook).unwrap();
    assert_eq!(&bytes[..2], b"PK");

    // One lookup per show, persisted next to the workbook
    let stored = fs::read_to_string(output_dir.join(".tvmaze_cache.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(json["version"], SCHEMA_VERSION);
    assert_eq!(json["entries"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_offline_catalog_still_exports() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output_dir = temp_dir.path().to_path_buf();
    let cache = Arc::new(LookupCache::in_memory());

    let pipeline = pipeline(output_dir, OfflineCatalog, Arc::clone(&cache));
    let report = pipeline
        .export(&create_test_library())
        .expect("Export failed");

    assert!(report.workbook.exists());
    assert_eq!(report.shows, 2);
    assert!(cache.is_empty(), "failed lookups must not be cached");
}

#[test]
fn test_movie_rows_sorted_by_title() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let pipeline = pipeline(
        temp_dir.path().to_path_buf(),
        TwoSeasonCatalog,
        Arc::new(LookupCache::in_memory()),
    );
    let lib = create_test_library();

    let rows = pipeline.movie_rows(&lib.sections()[0].movies);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], CellValue::Text("alien".to_string()));
    assert_eq!(rows[1][0], CellValue::Text("Heat".to_string()));
    // Title, Year, Studio, ContentRating, Video Resolution, Bitrate, File Path, Container, Duration
    assert_eq!(rows[1][4], CellValue::Text("1080".to_string()));
    assert_eq!(rows[1][8], CellValue::Number(171.0));
    assert_eq!(rows[0][4], CellValue::Text("Unknown".to_string()));
}

#[test]
fn test_show_reconciliation_order_matches_sorted_titles() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let pipeline = pipeline(
        temp_dir.path().to_path_buf(),
        TwoSeasonCatalog,
        Arc::new(LookupCache::in_memory()),
    );
    let lib = create_test_library();
    let mut shows: Vec<&Show> = lib.sections()[1].shows.iter().collect();
    shows.sort_by_key(|s| s.title.to_lowercase());

    let outcome = pipeline.reconcile(&shows).unwrap();

    assert_eq!(outcome.results[0].title, "Complete Show");
    assert_eq!(outcome.results[0].complete_regular_seasons(), 2);
    assert_eq!(outcome.results[1].title, "Partial Show");
    assert_eq!(outcome.results[1].complete_regular_seasons(), 0);
    assert_eq!(outcome.max_season_index, 2);
}
