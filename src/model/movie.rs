use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single movie with the metadata the exporter knows how to render
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Movie {
    /// Movie title
    pub title: String,

    /// Release year (optional)
    pub year: Option<u32>,

    pub studio: Option<String>,
    pub content_rating: Option<String>,

    /// Duration in milliseconds
    pub duration_ms: Option<u64>,

    pub added_at: Option<NaiveDateTime>,
    pub last_viewed_at: Option<NaiveDateTime>,
    pub originally_available_at: Option<String>,

    pub summary: Option<String>,
    pub tagline: Option<String>,

    /// Audience rating (0-10)
    pub audience_rating: Option<f64>,

    /// Critic rating (0-10)
    pub rating: Option<f64>,

    pub collections: Vec<String>,
    pub genres: Vec<String>,
    pub labels: Vec<String>,

    pub view_count: u32,
    pub skip_count: u32,

    /// First media version of the movie, if Plex reported one
    pub media: Option<MediaInfo>,
}

/// Technical details of a movie's first media version and part
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    pub video_resolution: Option<String>,

    /// Bitrate in kbps
    pub bitrate: Option<u32>,

    pub container: Option<String>,
    pub aspect_ratio: Option<f64>,
    pub audio_channels: Option<u32>,
    pub audio_codec: Option<String>,
    pub video_codec: Option<String>,
    pub video_frame_rate: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,

    /// File path of the first part
    pub file: Option<PathBuf>,
}

impl Movie {
    /// Create a movie with only a title set
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Duration rounded to whole minutes
    pub fn duration_minutes(&self) -> Option<u64> {
        self.duration_ms
            .filter(|ms| *ms > 0)
            .map(|ms| (ms as f64 / 60_000.0).round() as u64)
    }
}
