//! Blocking Plex Media Server HTTP client

use super::model::{SectionEntry, ShowEntry};
use super::{parser, PlexError};
use crate::model::Movie;
use std::collections::BTreeMap;
use std::time::Duration;

const TOKEN_HEADER: &str = "X-Plex-Token";

/// Plex server connection settings
#[derive(Debug, Clone)]
pub struct PlexConfig {
    /// Server base URL, e.g. http://localhost:32400
    pub base_url: String,

    /// Authentication token
    pub token: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl PlexConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the Plex library endpoints
pub struct PlexClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl PlexClient {
    pub fn new(config: PlexConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_xml(&self, path: &str, params: &[(&str, &str)]) -> Result<String, PlexError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("Plex GET {} {:?}", url, params);

        let mut request = self
            .agent
            .get(&url)
            .set(TOKEN_HEADER, &self.token)
            .set("Accept", "application/xml");
        for &(key, value) in params {
            request = request.query(key, value);
        }

        match request.call() {
            Ok(response) => response
                .into_string()
                .map_err(|e| PlexError::Http(format!("failed to read {}: {}", url, e))),
            Err(ureq::Error::Status(status, _)) => Err(PlexError::Status { status, url }),
            Err(ureq::Error::Transport(transport)) => Err(PlexError::Http(transport.to_string())),
        }
    }

    /// List movie and show sections
    pub fn sections(&self) -> Result<Vec<SectionEntry>, PlexError> {
        parser::parse_sections(&self.get_xml("/library/sections", &[])?)
    }

    /// List every movie of a section
    pub fn movies(&self, section_key: &str) -> Result<Vec<Movie>, PlexError> {
        let path = format!("/library/sections/{}/all", section_key);
        parser::parse_movies(&self.get_xml(&path, &[])?)
    }

    /// List every show of a section, with external IDs
    pub fn shows(&self, section_key: &str) -> Result<Vec<ShowEntry>, PlexError> {
        let path = format!("/library/sections/{}/all", section_key);
        parser::parse_shows(&self.get_xml(&path, &[("includeGuids", "1")])?)
    }

    /// Season index -> local episode count for one show
    pub fn seasons(&self, rating_key: &str, show_title: &str) -> Result<BTreeMap<u32, u32>, PlexError> {
        let path = format!("/library/metadata/{}/children", rating_key);
        parser::parse_seasons(&self.get_xml(&path, &[])?, show_title)
    }
}
