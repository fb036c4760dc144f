//! Plex `MediaContainer` XML parsing

use super::model::{SectionEntry, ShowEntry};
use super::PlexError;
use crate::model::{MediaInfo, Movie, SectionKind, Show};
use chrono::{DateTime, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

type Attrs = HashMap<String, String>;

/// Collect the attributes of an element, unescaped
fn attributes(e: &BytesStart) -> Attrs {
    let mut attrs = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        if let Ok(value) = attr.unescape_value() {
            attrs.insert(key, value.into_owned());
        }
    }
    attrs
}

fn text(attrs: &Attrs, name: &str) -> Option<String> {
    attrs
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn number<T: std::str::FromStr>(attrs: &Attrs, name: &str) -> Option<T> {
    attrs.get(name).and_then(|v| v.trim().parse().ok())
}

/// Plex timestamps are unix seconds
fn timestamp(attrs: &Attrs, name: &str) -> Option<NaiveDateTime> {
    number::<i64>(attrs, name)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.naive_utc())
}

fn reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader
}

fn xml_error(reader: &Reader<&[u8]>, e: quick_xml::Error) -> PlexError {
    PlexError::Xml(format!("at position {}: {}", reader.buffer_position(), e))
}

/// Parse `/library/sections`, keeping movie and show sections
pub fn parse_sections(xml: &str) -> Result<Vec<SectionEntry>, PlexError> {
    let mut reader = reader(xml);
    let mut sections = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"Directory" => {
                let attrs = attributes(&e);
                let kind = match attrs.get("type").map(String::as_str) {
                    Some("movie") => SectionKind::Movie,
                    Some("show") => SectionKind::Show,
                    _ => continue,
                };
                if let (Some(key), Some(title)) = (text(&attrs, "key"), text(&attrs, "title")) {
                    sections.push(SectionEntry { key, kind, title });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
    }

    Ok(sections)
}

/// Parse the items of a movie section
pub fn parse_movies(xml: &str) -> Result<Vec<Movie>, PlexError> {
    let mut reader = reader(xml);
    let mut movies = Vec::new();
    let mut current: Option<Movie> = None;
    let mut in_first_media = false;

    loop {
        let (e, is_empty) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, false),
            Ok(Event::Empty(e)) => (e, true),
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"Video" => {
                        if let Some(movie) = current.take() {
                            movies.push(movie);
                        }
                    }
                    b"Media" => in_first_media = false,
                    _ => {}
                }
                continue;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => continue,
        };

        let attrs = attributes(&e);
        match e.name().as_ref() {
            b"Video" => {
                let movie = movie_from_attrs(&attrs);
                if is_empty {
                    movies.push(movie);
                } else {
                    current = Some(movie);
                }
            }
            b"Media" => {
                if let Some(movie) = current.as_mut() {
                    if movie.media.is_none() {
                        movie.media = Some(media_from_attrs(&attrs));
                        in_first_media = !is_empty;
                    }
                }
            }
            b"Part" if in_first_media => {
                if let Some(media) = current.as_mut().and_then(|m| m.media.as_mut()) {
                    if media.file.is_none() {
                        media.file = text(&attrs, "file").map(PathBuf::from);
                    }
                }
            }
            tag => {
                if let (Some(movie), Some(value)) = (current.as_mut(), text(&attrs, "tag")) {
                    match tag {
                        b"Genre" => movie.genres.push(value),
                        b"Collection" => movie.collections.push(value),
                        b"Label" => movie.labels.push(value),
                        _ => {}
                    }
                }
            }
        }
    }

    Ok(movies)
}

fn movie_from_attrs(attrs: &Attrs) -> Movie {
    Movie {
        title: text(attrs, "title").unwrap_or_default(),
        year: number(attrs, "year"),
        studio: text(attrs, "studio"),
        content_rating: text(attrs, "contentRating"),
        duration_ms: number(attrs, "duration"),
        added_at: timestamp(attrs, "addedAt"),
        last_viewed_at: timestamp(attrs, "lastViewedAt"),
        originally_available_at: text(attrs, "originallyAvailableAt"),
        summary: text(attrs, "summary"),
        tagline: text(attrs, "tagline"),
        audience_rating: number(attrs, "audienceRating"),
        rating: number(attrs, "rating"),
        view_count: number(attrs, "viewCount").unwrap_or(0),
        skip_count: number(attrs, "skipCount").unwrap_or(0),
        ..Movie::default()
    }
}

fn media_from_attrs(attrs: &Attrs) -> MediaInfo {
    MediaInfo {
        video_resolution: text(attrs, "videoResolution"),
        bitrate: number(attrs, "bitrate"),
        container: text(attrs, "container"),
        aspect_ratio: number(attrs, "aspectRatio"),
        audio_channels: number(attrs, "audioChannels"),
        audio_codec: text(attrs, "audioCodec"),
        video_codec: text(attrs, "videoCodec"),
        video_frame_rate: text(attrs, "videoFrameRate"),
        height: number(attrs, "height"),
        width: number(attrs, "width"),
        file: None,
    }
}

/// Parse the items of a show section (requested with `includeGuids=1`)
pub fn parse_shows(xml: &str) -> Result<Vec<ShowEntry>, PlexError> {
    let mut reader = reader(xml);
    let mut shows = Vec::new();
    let mut current: Option<ShowEntry> = None;

    loop {
        let (e, is_empty) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, false),
            Ok(Event::Empty(e)) => (e, true),
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"Directory" {
                    if let Some(entry) = current.take() {
                        shows.push(entry);
                    }
                }
                continue;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => continue,
        };

        let attrs = attributes(&e);
        match e.name().as_ref() {
            b"Directory" => {
                if attrs.get("type").map(String::as_str) != Some("show") {
                    continue;
                }
                let Some(rating_key) = text(&attrs, "ratingKey") else {
                    log::warn!("Skipping show without ratingKey: {:?}", attrs.get("title"));
                    continue;
                };
                let entry = ShowEntry {
                    rating_key,
                    show: show_from_attrs(&attrs),
                };
                if is_empty {
                    shows.push(entry);
                } else {
                    current = Some(entry);
                }
            }
            tag => {
                let Some(entry) = current.as_mut() else {
                    continue;
                };
                match tag {
                    b"Guid" => {
                        if let Some(id) = text(&attrs, "id") {
                            if let Some(imdb) = id.strip_prefix("imdb://") {
                                entry.show.imdb_id.get_or_insert_with(|| imdb.to_string());
                            }
                        }
                    }
                    b"Genre" | b"Collection" | b"Label" => {
                        if let Some(value) = text(&attrs, "tag") {
                            match tag {
                                b"Genre" => entry.show.genres.push(value),
                                b"Collection" => entry.show.collections.push(value),
                                _ => entry.show.labels.push(value),
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(shows)
}

fn show_from_attrs(attrs: &Attrs) -> Show {
    Show {
        title: text(attrs, "title").unwrap_or_default(),
        original_title: text(attrs, "originalTitle"),
        year: number(attrs, "year"),
        studio: text(attrs, "studio"),
        content_rating: text(attrs, "contentRating"),
        summary: text(attrs, "summary"),
        tagline: text(attrs, "tagline"),
        added_at: timestamp(attrs, "addedAt"),
        last_viewed_at: timestamp(attrs, "lastViewedAt"),
        originally_available_at: text(attrs, "originallyAvailableAt"),
        audience_rating: number(attrs, "audienceRating"),
        rating: number(attrs, "rating"),
        view_count: number(attrs, "viewCount").unwrap_or(0),
        skip_count: number(attrs, "skipCount").unwrap_or(0),
        ..Show::default()
    }
}

/// Parse `/library/metadata/{key}/children` into season -> episode count.
///
/// Entries without a numeric `index` (e.g. "All episodes") are skipped.
pub fn parse_seasons(xml: &str, show_title: &str) -> Result<BTreeMap<u32, u32>, PlexError> {
    let mut reader = reader(xml);
    let mut seasons = BTreeMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"Directory" => {
                let attrs = attributes(&e);
                let kind = attrs.get("type").map(String::as_str);
                if kind.is_some_and(|k| k != "season") {
                    continue;
                }

                match attrs.get("index").map(|i| i.trim().parse::<u32>()) {
                    Some(Ok(index)) => {
                        seasons.insert(index, number(&attrs, "leafCount").unwrap_or(0));
                    }
                    Some(Err(_)) => {
                        log::warn!(
                            "Skipping invalid season number '{}' for show '{}'",
                            attrs["index"],
                            show_title
                        );
                    }
                    None if kind.is_some() => {
                        log::warn!("Skipping season without number for show '{}'", show_title);
                    }
                    None => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
    }

    Ok(seasons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="3">
  <Directory key="1" type="movie" title="Movies" agent="tv.plex.agents.movie"/>
  <Directory key="2" type="show" title="TV Shows"/>
  <Directory key="3" type="artist" title="Music"/>
</MediaContainer>"#;

        let sections = parse_sections(xml).unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].key, "1");
        assert_eq!(sections[0].kind, SectionKind::Movie);
        assert_eq!(sections[1].title, "TV Shows");
        assert_eq!(sections[1].kind, SectionKind::Show);
    }

    #[test]
    fn test_parse_movies() {
        let xml = r#"<MediaContainer size="2">
  <Video ratingKey="10" title="Alien" year="1979" studio="20th Century Fox" contentRating="R"
         duration="7020000" addedAt="1600000000" audienceRating="9.4" viewCount="2">
    <Media videoResolution="1080" bitrate="10450" container="mkv" videoCodec="h264" height="800" width="1920">
      <Part file="/media/movies/Alien (1979).mkv"/>
    </Media>
    <Media videoResolution="sd" container="avi">
      <Part file="/media/movies/Alien.avi"/>
    </Media>
    <Genre tag="Horror"/>
    <Genre tag="Science Fiction"/>
    <Collection tag="Alien"/>
  </Video>
  <Video ratingKey="11" title="Bare &amp; Simple"/>
</MediaContainer>"#;

        let movies = parse_movies(xml).unwrap();

        assert_eq!(movies.len(), 2);
        let alien = &movies[0];
        assert_eq!(alien.title, "Alien");
        assert_eq!(alien.year, Some(1979));
        assert_eq!(alien.duration_minutes(), Some(117));
        assert_eq!(alien.view_count, 2);
        assert!(alien.added_at.is_some());
        assert_eq!(alien.genres, vec!["Horror", "Science Fiction"]);
        assert_eq!(alien.collections, vec!["Alien"]);

        let media = alien.media.as_ref().unwrap();
        assert_eq!(media.video_resolution.as_deref(), Some("1080"));
        assert_eq!(media.bitrate, Some(10450));
        assert_eq!(
            media.file.as_deref(),
            Some(std::path::Path::new("/media/movies/Alien (1979).mkv"))
        );

        assert_eq!(movies[1].title, "Bare & Simple");
        assert!(movies[1].media.is_none());
    }

    #[test]
    fn test_parse_shows_with_guids() {
        let xml = r#"<MediaContainer>
  <Directory ratingKey="20" type="show" title="Dark" originalTitle="Dark" year="2017" leafCount="26">
    <Genre tag="Drama"/>
    <Guid id="tmdb://70523"/>
    <Guid id="imdb://tt5753856"/>
    <Guid id="tvdb://334824"/>
  </Directory>
  <Directory ratingKey="21" type="show" title="No Guids"/>
</MediaContainer>"#;

        let shows = parse_shows(xml).unwrap();

        assert_eq!(shows.len(), 2);
        assert_eq!(shows[0].rating_key, "20");
        assert_eq!(shows[0].show.imdb_id.as_deref(), Some("tt5753856"));
        assert_eq!(shows[0].show.year, Some(2017));
        assert_eq!(shows[0].show.genres, vec!["Drama"]);
        assert_eq!(shows[1].show.title, "No Guids");
        assert!(shows[1].show.imdb_id.is_none());
    }

    #[test]
    fn test_parse_seasons() {
        let xml = r#"<MediaContainer>
  <Directory key="/library/metadata/20/allLeaves" title="All episodes" leafCount="30"/>
  <Directory ratingKey="30" type="season" index="0" title="Specials" leafCount="2"/>
  <Directory ratingKey="31" type="season" index="1" title="Season 1" leafCount="10"/>
  <Directory ratingKey="32" type="season" index="2" title="Season 2" leafCount="8"/>
  <Directory ratingKey="33" type="season" index="x" title="Broken" leafCount="8"/>
</MediaContainer>"#;

        let seasons = parse_seasons(xml, "Dark").unwrap();

        assert_eq!(seasons, BTreeMap::from([(0, 2), (1, 10), (2, 8)]));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(matches!(
            parse_sections("<MediaContainer><Directory></MediaContainer>"),
            Err(PlexError::Xml(_))
        ));
    }
}
