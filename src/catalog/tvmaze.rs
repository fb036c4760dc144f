//! TVMaze API transport.
//!
//! TVMaze needs no API key. Episode counts are derived from the full
//! episode list of the matched show.

use super::types::{CatalogLookup, CatalogShowInfo};
use super::{CatalogTransport, LookupError};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.tvmaze.com";
const USER_AGENT: &str = concat!("plex-exporter/", env!("CARGO_PKG_VERSION"));

/// TVMaze transport configuration
#[derive(Debug, Clone)]
pub struct TvMazeConfig {
    /// Base URL (default: https://api.tvmaze.com)
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for TvMazeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Show reference as returned by lookup and search endpoints
#[derive(Debug, Deserialize)]
struct TvMazeShowRef {
    id: u64,
}

/// One hit of `/search/shows`
#[derive(Debug, Deserialize)]
struct TvMazeSearchHit {
    show: TvMazeShowRef,
}

/// The only episode field we need
#[derive(Debug, Deserialize)]
struct TvMazeEpisode {
    #[serde(default)]
    season: Option<u32>,
}

/// Blocking TVMaze client, safe to share between worker threads
pub struct TvMazeTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl TvMazeTransport {
    pub fn new(config: TvMazeConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build();

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET a JSON endpoint; `Ok(None)` on 404
    fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Option<String>, LookupError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("TVMaze GET {} {:?}", url, params);

        let mut request = self.agent.get(&url);
        for &(key, value) in params {
            request = request.query(key, value);
        }

        match request.call() {
            Ok(response) => response
                .into_string()
                .map(Some)
                .map_err(|e| LookupError::Transient(format!("failed to read response: {}", e))),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(ureq::Error::Status(status, response)) => {
                let message = response.into_string().unwrap_or_default();
                Err(classify_status(status, message))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(LookupError::Transient(transport.to_string()))
            }
        }
    }

    /// Fetch the episode list of a TVMaze show and aggregate it
    fn show_info(&self, show_id: u64) -> Result<CatalogLookup, LookupError> {
        match self.get(&format!("/shows/{}/episodes", show_id), &[])? {
            Some(body) => Ok(CatalogLookup::Found(parse_episodes(&body)?)),
            None => Ok(CatalogLookup::Absent),
        }
    }
}

impl CatalogTransport for TvMazeTransport {
    fn lookup_by_external_id(&self, external_id: &str) -> Result<CatalogLookup, LookupError> {
        let Some(body) = self.get("/lookup/shows", &[("imdb", external_id)])? else {
            return Ok(CatalogLookup::Absent);
        };

        match parse_lookup(&body)? {
            Some(show_id) => self.show_info(show_id),
            None => Ok(CatalogLookup::Absent),
        }
    }

    fn search_by_title(&self, title: &str) -> Result<CatalogLookup, LookupError> {
        let Some(body) = self.get("/search/shows", &[("q", title)])? else {
            return Ok(CatalogLookup::Absent);
        };

        match parse_search(&body)? {
            Some(show_id) => self.show_info(show_id),
            None => Ok(CatalogLookup::Absent),
        }
    }
}

/// Map an HTTP error status to a lookup error
fn classify_status(status: u16, message: String) -> LookupError {
    match status {
        408 | 429 | 500..=599 => LookupError::Transient(format!("HTTP {}", status)),
        _ => LookupError::Rejected { status, message },
    }
}

/// `/lookup/shows` answers with a single show object, or `null`
fn parse_lookup(body: &str) -> Result<Option<u64>, LookupError> {
    let show: Option<TvMazeShowRef> = serde_json::from_str(body)
        .map_err(|e| LookupError::Malformed(format!("lookup response: {}", e)))?;
    Ok(show.map(|s| s.id))
}

/// `/search/shows` answers with a ranked list; the first hit wins
fn parse_search(body: &str) -> Result<Option<u64>, LookupError> {
    let hits: Vec<TvMazeSearchHit> = serde_json::from_str(body)
        .map_err(|e| LookupError::Malformed(format!("search response: {}", e)))?;
    Ok(hits.into_iter().next().map(|hit| hit.show.id))
}

fn parse_episodes(body: &str) -> Result<CatalogShowInfo, LookupError> {
    let episodes: Vec<TvMazeEpisode> = serde_json::from_str(body)
        .map_err(|e| LookupError::Malformed(format!("episodes response: {}", e)))?;
    Ok(CatalogShowInfo::from_episode_seasons(
        episodes.into_iter().map(|e| e.season),
    ))
}
