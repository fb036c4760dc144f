use anyhow::Result;
use clap::Parser;
use plex_exporter::catalog::{TvMazeConfig, TvMazeTransport};
use plex_exporter::export::fields::{
    parse_selection, DEFAULT_MOVIE_FIELDS, DEFAULT_SHOW_FIELDS, MOVIE_FIELDS, SHOW_FIELDS,
};
use plex_exporter::plex::{PlexClient, PlexConfig};
use plex_exporter::{CatalogClient, ExportConfig, ExportPipeline, LookupCache, RetryPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "plex-exporter")]
#[command(about = "Export a Plex library to a spreadsheet with TV season completion", long_about = None)]
struct Args {
    /// Plex server URL (e.g. http://localhost:32400)
    #[arg(long, env = "PLEX_URL")]
    plex_url: String,

    /// Plex authentication token
    #[arg(long, env = "PLEX_TOKEN", hide_env_values = true)]
    plex_token: String,

    /// Directory for the workbook
    #[arg(short = 'o', long, env = "PLEX_EXPORT_DIR", default_value = ".")]
    output_dir: String,

    /// Comma-separated movie columns
    #[arg(long, env = "PLEX_MOVIE_EXPORT_FIELDS")]
    movie_fields: Option<String>,

    /// Comma-separated TV show columns
    #[arg(long, env = "PLEX_SHOW_EXPORT_FIELDS")]
    show_fields: Option<String>,

    /// TVMaze API base URL
    #[arg(long, default_value = "https://api.tvmaze.com")]
    catalog_url: String,

    /// Maximum parallel workers
    #[arg(short = 'w', long, default_value = "10")]
    workers: usize,

    /// Total attempts per catalog request
    #[arg(long, default_value = "3")]
    max_attempts: u32,

    /// Initial retry delay in milliseconds (doubles per retry)
    #[arg(long, default_value = "1000")]
    retry_delay_ms: u64,

    /// Lookup cache file (default: <output-dir>/.tvmaze_cache.json)
    #[arg(long)]
    cache_file: Option<String>,

    /// Do not read or write the lookup cache
    #[arg(long)]
    no_cache: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::info!("Plex Exporter");
    log::info!("=============");

    let output_dir = PathBuf::from(shellexpand::tilde(&args.output_dir).as_ref());

    let config = ExportConfig::new(output_dir)
        .with_movie_fields(parse_selection(
            args.movie_fields.as_deref(),
            MOVIE_FIELDS,
            DEFAULT_MOVIE_FIELDS,
        ))
        .with_show_fields(parse_selection(
            args.show_fields.as_deref(),
            SHOW_FIELDS,
            DEFAULT_SHOW_FIELDS,
        ))
        .with_workers(args.workers);

    log::info!("Movie fields: {}", join(&config.movie_fields));
    log::info!("TV show fields: {}", join(&config.show_fields));

    // Load the lookup cache before touching Plex
    let cache = if args.no_cache {
        log::info!("Lookup cache disabled");
        LookupCache::in_memory()
    } else {
        let path = match &args.cache_file {
            Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
            None => config.default_cache_path(),
        };
        LookupCache::load(path)
    };

    let plex = PlexClient::new(PlexConfig::new(&args.plex_url, &args.plex_token));
    let library = plex_exporter::plex::load_library(&plex, config.workers)?;

    let transport = TvMazeTransport::new(TvMazeConfig {
        base_url: args.catalog_url.clone(),
        ..TvMazeConfig::default()
    });
    let retry = RetryPolicy::default()
        .with_max_attempts(args.max_attempts)
        .with_initial_delay(Duration::from_millis(args.retry_delay_ms));
    let client = CatalogClient::new(transport).with_retry(retry);

    let pipeline = ExportPipeline::new(config, client, Arc::new(cache))?;
    let report = pipeline.export(&library)?;

    log::info!(
        "Exported {} movies and {} TV shows to {} sheet(s)",
        report.movies,
        report.shows,
        report.sheets
    );
    if report.defects > 0 {
        log::warn!("{} TV show(s) could not be checked", report.defects);
    }
    log::info!("Workbook ready at: {:?}", report.workbook);

    Ok(())
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
