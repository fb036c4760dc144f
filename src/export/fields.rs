//! Exportable metadata fields and per-item cell extraction

use crate::model::{Movie, Show};
use chrono::NaiveDateTime;
use std::fmt;
use std::path::Path;

const NOT_AVAILABLE: &str = "N/A";
const UNKNOWN: &str = "Unknown";

/// A single worksheet cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    fn missing() -> Self {
        CellValue::text(NOT_AVAILABLE)
    }

    fn unknown() -> Self {
        CellValue::text(UNKNOWN)
    }

    fn or_missing(value: Option<&str>) -> Self {
        value.map_or_else(Self::missing, Self::text)
    }

    fn number_or<N: Into<f64>>(value: Option<N>, fallback: fn() -> Self) -> Self {
        value.map_or_else(fallback, |n| CellValue::Number(n.into()))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Columns the exporter can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Year,
    Studio,
    ContentRating,
    VideoResolution,
    Bitrate,
    FilePath,
    Container,
    Duration,
    AddedAt,
    LastViewedAt,
    OriginallyAvailableAt,
    Summary,
    Tagline,
    AudienceRating,
    Rating,
    Collections,
    Genres,
    Labels,
    AspectRatio,
    AudioChannels,
    AudioCodec,
    VideoCodec,
    VideoFrameRate,
    Height,
    Width,
    ViewCount,
    SkipCount,
}

/// Every movie field, in canonical order
pub const MOVIE_FIELDS: &[Field] = &[
    Field::Title,
    Field::Year,
    Field::Studio,
    Field::ContentRating,
    Field::VideoResolution,
    Field::Bitrate,
    Field::FilePath,
    Field::Container,
    Field::Duration,
    Field::AddedAt,
    Field::LastViewedAt,
    Field::OriginallyAvailableAt,
    Field::Summary,
    Field::Tagline,
    Field::AudienceRating,
    Field::Rating,
    Field::Collections,
    Field::Genres,
    Field::Labels,
    Field::AspectRatio,
    Field::AudioChannels,
    Field::AudioCodec,
    Field::VideoCodec,
    Field::VideoFrameRate,
    Field::Height,
    Field::Width,
    Field::ViewCount,
    Field::SkipCount,
];

pub const DEFAULT_MOVIE_FIELDS: &[Field] = &[
    Field::Title,
    Field::Year,
    Field::Studio,
    Field::ContentRating,
    Field::VideoResolution,
    Field::Bitrate,
    Field::FilePath,
    Field::Container,
    Field::Duration,
];

/// Every show field; shows carry no media details
pub const SHOW_FIELDS: &[Field] = &[
    Field::Title,
    Field::Year,
    Field::Studio,
    Field::ContentRating,
    Field::Summary,
    Field::Tagline,
    Field::AddedAt,
    Field::LastViewedAt,
    Field::OriginallyAvailableAt,
    Field::AudienceRating,
    Field::Rating,
    Field::Collections,
    Field::Genres,
    Field::Labels,
    Field::ViewCount,
    Field::SkipCount,
];

pub const DEFAULT_SHOW_FIELDS: &[Field] = &[
    Field::Title,
    Field::Year,
    Field::Studio,
    Field::ContentRating,
    Field::Summary,
];

impl Field {
    /// Column header and configuration name
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Year => "Year",
            Field::Studio => "Studio",
            Field::ContentRating => "ContentRating",
            Field::VideoResolution => "Video Resolution",
            Field::Bitrate => "Bitrate (kbps)",
            Field::FilePath => "File Path",
            Field::Container => "Container",
            Field::Duration => "Duration (min)",
            Field::AddedAt => "AddedAt",
            Field::LastViewedAt => "LastViewedAt",
            Field::OriginallyAvailableAt => "OriginallyAvailableAt",
            Field::Summary => "Summary",
            Field::Tagline => "Tagline",
            Field::AudienceRating => "AudienceRating",
            Field::Rating => "Rating",
            Field::Collections => "Collections",
            Field::Genres => "Genres",
            Field::Labels => "Labels",
            Field::AspectRatio => "AspectRatio",
            Field::AudioChannels => "AudioChannels",
            Field::AudioCodec => "AudioCodec",
            Field::VideoCodec => "VideoCodec",
            Field::VideoFrameRate => "VideoFrameRate",
            Field::Height => "Height",
            Field::Width => "Width",
            Field::ViewCount => "ViewCount",
            Field::SkipCount => "SkipCount",
        }
    }

    /// Look up a field by its exact name
    pub fn from_name(name: &str) -> Option<Self> {
        MOVIE_FIELDS.iter().copied().find(|f| f.name() == name)
    }

    /// Long free text that should wrap in the sheet
    pub fn is_wrapped(self) -> bool {
        matches!(
            self,
            Field::Summary
                | Field::Tagline
                | Field::FilePath
                | Field::Collections
                | Field::Genres
                | Field::Labels
        )
    }

    /// Extract this field from a movie
    pub fn movie_value(self, movie: &Movie) -> CellValue {
        let media = movie.media.as_ref();
        match self {
            Field::Duration => CellValue::number_or(
                movie.duration_minutes().map(|m| m as f64),
                CellValue::missing,
            ),
            Field::VideoResolution => media
                .and_then(|m| m.video_resolution.as_deref())
                .map_or_else(CellValue::unknown, CellValue::text),
            Field::Bitrate => {
                CellValue::number_or(media.and_then(|m| m.bitrate), CellValue::unknown)
            }
            Field::FilePath => media
                .and_then(|m| m.file.as_deref())
                .map(Path::to_string_lossy)
                .map_or_else(CellValue::unknown, CellValue::text),
            Field::Container => media
                .and_then(|m| m.container.as_deref())
                .map_or_else(CellValue::unknown, CellValue::text),
            Field::AspectRatio => {
                CellValue::number_or(media.and_then(|m| m.aspect_ratio), CellValue::missing)
            }
            Field::AudioChannels => {
                CellValue::number_or(media.and_then(|m| m.audio_channels), CellValue::missing)
            }
            Field::AudioCodec => CellValue::or_missing(media.and_then(|m| m.audio_codec.as_deref())),
            Field::VideoCodec => CellValue::or_missing(media.and_then(|m| m.video_codec.as_deref())),
            Field::VideoFrameRate => {
                CellValue::or_missing(media.and_then(|m| m.video_frame_rate.as_deref()))
            }
            Field::Height => CellValue::number_or(media.and_then(|m| m.height), CellValue::missing),
            Field::Width => CellValue::number_or(media.and_then(|m| m.width), CellValue::missing),
            common => Metadata::from(movie).value(common),
        }
    }

    /// Extract this field from a show; media fields are always missing
    pub fn show_value(self, show: &Show) -> CellValue {
        Metadata::from(show).value(self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields shared by movies and shows
struct Metadata<'a> {
    title: &'a str,
    year: Option<u32>,
    studio: Option<&'a str>,
    content_rating: Option<&'a str>,
    added_at: Option<NaiveDateTime>,
    last_viewed_at: Option<NaiveDateTime>,
    originally_available_at: Option<&'a str>,
    summary: Option<&'a str>,
    tagline: Option<&'a str>,
    audience_rating: Option<f64>,
    rating: Option<f64>,
    collections: &'a [String],
    genres: &'a [String],
    labels: &'a [String],
    view_count: u32,
    skip_count: u32,
}

impl<'a> From<&'a Movie> for Metadata<'a> {
    fn from(m: &'a Movie) -> Self {
        Self {
            title: &m.title,
            year: m.year,
            studio: m.studio.as_deref(),
            content_rating: m.content_rating.as_deref(),
            added_at: m.added_at,
            last_viewed_at: m.last_viewed_at,
            originally_available_at: m.originally_available_at.as_deref(),
            summary: m.summary.as_deref(),
            tagline: m.tagline.as_deref(),
            audience_rating: m.audience_rating,
            rating: m.rating,
            collections: &m.collections,
            genres: &m.genres,
            labels: &m.labels,
            view_count: m.view_count,
            skip_count: m.skip_count,
        }
    }
}

impl<'a> From<&'a Show> for Metadata<'a> {
    fn from(s: &'a Show) -> Self {
        Self {
            title: &s.title,
            year: s.year,
            studio: s.studio.as_deref(),
            content_rating: s.content_rating.as_deref(),
            added_at: s.added_at,
            last_viewed_at: s.last_viewed_at,
            originally_available_at: s.originally_available_at.as_deref(),
            summary: s.summary.as_deref(),
            tagline: s.tagline.as_deref(),
            audience_rating: s.audience_rating,
            rating: s.rating,
            collections: &s.collections,
            genres: &s.genres,
            labels: &s.labels,
            view_count: s.view_count,
            skip_count: s.skip_count,
        }
    }
}

impl Metadata<'_> {
    fn value(&self, field: Field) -> CellValue {
        match field {
            Field::Title => CellValue::text(self.title),
            Field::Year => CellValue::number_or(self.year, CellValue::missing),
            Field::Studio => CellValue::or_missing(self.studio),
            Field::ContentRating => CellValue::or_missing(self.content_rating),
            Field::AddedAt => format_datetime(self.added_at),
            Field::LastViewedAt => format_datetime(self.last_viewed_at),
            Field::OriginallyAvailableAt => CellValue::or_missing(self.originally_available_at),
            Field::Summary => CellValue::or_missing(self.summary),
            Field::Tagline => CellValue::or_missing(self.tagline),
            Field::AudienceRating => CellValue::number_or(self.audience_rating, CellValue::missing),
            Field::Rating => CellValue::number_or(self.rating, CellValue::missing),
            Field::Collections => format_list(self.collections),
            Field::Genres => format_list(self.genres),
            Field::Labels => format_list(self.labels),
            Field::ViewCount => CellValue::Number(self.view_count.into()),
            Field::SkipCount => CellValue::Number(self.skip_count.into()),
            _ => CellValue::missing(),
        }
    }
}

fn format_datetime(value: Option<NaiveDateTime>) -> CellValue {
    value.map_or_else(CellValue::missing, |dt| {
        CellValue::Text(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    })
}

fn format_list(items: &[String]) -> CellValue {
    if items.is_empty() {
        CellValue::missing()
    } else {
        CellValue::Text(items.join(", "))
    }
}

/// Parse a comma-separated field selection
///
/// Unknown names and fields outside `allowed` are dropped with a warning.
/// An unset or fully invalid selection yields `defaults`.
pub fn parse_selection(input: Option<&str>, allowed: &[Field], defaults: &[Field]) -> Vec<Field> {
    let Some(input) = input else {
        return defaults.to_vec();
    };

    let mut selected = Vec::new();
    for name in input.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        match Field::from_name(name).filter(|f| allowed.contains(f)) {
            Some(field) if !selected.contains(&field) => selected.push(field),
            Some(_) => {}
            None => log::warn!("Ignoring unknown export field '{}'", name),
        }
    }

    if selected.is_empty() {
        log::warn!("No valid export fields in '{}', using defaults", input);
        return defaults.to_vec();
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaInfo;
    use std::path::PathBuf;

    #[test]
    fn test_selection_keeps_user_order() {
        let fields = parse_selection(
            Some("Year, Title ,Bogus,Genres"),
            MOVIE_FIELDS,
            DEFAULT_MOVIE_FIELDS,
        );
        assert_eq!(fields, vec![Field::Year, Field::Title, Field::Genres]);
    }

    #[test]
    fn test_selection_falls_back_to_defaults() {
        assert_eq!(
            parse_selection(Some(" , Bogus"), SHOW_FIELDS, DEFAULT_SHOW_FIELDS),
            DEFAULT_SHOW_FIELDS
        );
        assert_eq!(
            parse_selection(None, MOVIE_FIELDS, DEFAULT_MOVIE_FIELDS),
            DEFAULT_MOVIE_FIELDS
        );
    }

    #[test]
    fn test_media_fields_not_allowed_for_shows() {
        let fields = parse_selection(Some("Title,Container"), SHOW_FIELDS, DEFAULT_SHOW_FIELDS);
        assert_eq!(fields, vec![Field::Title]);
    }

    #[test]
    fn test_movie_values() {
        let mut movie = Movie::new("Alien");
        movie.year = Some(1979);
        movie.duration_ms = Some(7_020_000);
        movie.genres = vec!["Horror".to_string(), "Science Fiction".to_string()];
        movie.media = Some(MediaInfo {
            video_resolution: Some("4k".to_string()),
            file: Some(PathBuf::from("/movies/Alien.mkv")),
            ..MediaInfo::default()
        });

        assert_eq!(Field::Title.movie_value(&movie), CellValue::text("Alien"));
        assert_eq!(Field::Year.movie_value(&movie), CellValue::Number(1979.0));
        assert_eq!(Field::Duration.movie_value(&movie), CellValue::Number(117.0));
        assert_eq!(
            Field::Genres.movie_value(&movie),
            CellValue::text("Horror, Science Fiction")
        );
        assert_eq!(
            Field::FilePath.movie_value(&movie),
            CellValue::text("/movies/Alien.mkv")
        );
        assert_eq!(Field::Studio.movie_value(&movie), CellValue::text("N/A"));
        assert_eq!(Field::Bitrate.movie_value(&movie), CellValue::text("Unknown"));
        assert_eq!(Field::Height.movie_value(&movie), CellValue::text("N/A"));
    }

    #[test]
    fn test_movie_without_media_is_unknown() {
        let movie = Movie::new("Bare");
        assert_eq!(
            Field::VideoResolution.movie_value(&movie),
            CellValue::text("Unknown")
        );
        assert_eq!(Field::Container.movie_value(&movie), CellValue::text("Unknown"));
        assert_eq!(Field::ViewCount.movie_value(&movie), CellValue::Number(0.0));
    }

    #[test]
    fn test_show_values() {
        let mut show = Show::new("Dark");
        show.added_at = chrono::DateTime::from_timestamp(1_600_000_000, 0).map(|d| d.naive_utc());

        assert_eq!(
            Field::AddedAt.show_value(&show),
            CellValue::text("2020-09-13T12:26:40")
        );
        assert_eq!(Field::Summary.show_value(&show), CellValue::text("N/A"));
    }
}
