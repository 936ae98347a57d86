//! Reads title, artist and release year from audio files.

use std::{path::Path, sync::LazyLock};

use lofty::{
    file::{TaggedFile, TaggedFileExt as _},
    tag::{Accessor as _, ItemKey, Tag},
};
use regex::Regex;

use crate::library::error::LibraryError;

const ARTIST_SEPARATOR: &str = " & ";

/// Date fields that may carry the release year, in no particular order.
const YEAR_KEYS: &[ItemKey] = &[
    ItemKey::Year,
    ItemKey::RecordingDate,
    ItemKey::ReleaseDate,
    ItemKey::OriginalReleaseDate,
];

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19[0-9]{2}|20[0-9]{2})\b").expect("valid year pattern"));

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<u16>,
}

impl TrackTags {
    /// Fills missing fields from `other`.
    pub fn or(self, other: TrackTags) -> TrackTags {
        TrackTags {
            title: self.title.or(other.title),
            artist: self.artist.or(other.artist),
            year: self.year.or(other.year),
        }
    }
}

pub fn read_tags(path: &Path) -> Result<TrackTags, LibraryError> {
    let mut tagged_file = lofty::read_from_path(path)?;
    Ok(take_primary_or_first_tag(&mut tagged_file)
        .map(|tag| tags_from(&tag))
        .unwrap_or_default())
}

fn take_primary_or_first_tag(tagged_file: &mut TaggedFile) -> Option<Tag> {
    if let Some(tag) = tagged_file.remove(tagged_file.primary_tag_type()) {
        return Some(tag);
    }
    let first_tag_type = tagged_file.first_tag().map(Tag::tag_type)?;
    tagged_file.remove(first_tag_type)
}

pub fn tags_from(tag: &Tag) -> TrackTags {
    let title = tag.title().and_then(|title| non_empty(&title));

    let artists = tag
        .get_strings(&ItemKey::TrackArtist)
        .map(str::trim)
        .filter(|artist| !artist.is_empty())
        .collect::<Vec<_>>();
    let artist = (!artists.is_empty()).then(|| artists.join(ARTIST_SEPARATOR));

    let year = YEAR_KEYS
        .iter()
        .filter_map(|key| tag.get_string(key))
        .filter_map(earliest_year)
        .min();

    TrackTags {
        title,
        artist,
        year,
    }
}

/// Parses `Artist - Title` or `Artist - Title - Year` file stems.
pub fn tags_from_file_name(path: &Path) -> TrackTags {
    let Some(stem) = path.file_stem().map(|s| s.to_string_lossy()) else {
        return TrackTags::default();
    };
    let mut parts = stem.split(" - ").map(str::trim).collect::<Vec<_>>();

    let year = match parts.as_slice() {
        [_, _, .., last] => earliest_year(last).filter(|_| last.len() == 4),
        _ => None,
    };
    if year.is_some() {
        parts.pop();
    }

    match parts.as_slice() {
        [artist, title @ ..] if !title.is_empty() => TrackTags {
            artist: non_empty(artist),
            title: non_empty(&title.join(" - ")),
            year,
        },
        _ => TrackTags {
            title: non_empty(&stem),
            artist: None,
            year,
        },
    }
}

/// Earliest plausible release year mentioned in a free-form date field.
pub fn earliest_year(text: &str) -> Option<u16> {
    YEAR_PATTERN
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u16>().ok())
        .min()
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use lofty::tag::{ItemValue, TagItem, TagType};

    use super::*;

    #[test]
    fn earliest_year_from_wiki_style_text() {
        let text = "{{Start date|1978|01|27|df=y}}<ref>{{cite magazine|date=28 January 1977}}</ref>";
        assert_eq!(earliest_year(text), Some(1977));
        assert_eq!(earliest_year("2003-05-12"), Some(2003));
        assert_eq!(earliest_year("1850"), None);
        assert_eq!(earliest_year("19790"), None);
        assert_eq!(earliest_year(""), None);
    }

    #[test]
    fn tags_are_read_from_vorbis_comments() {
        let mut tag = Tag::new(TagType::VorbisComments);
        tag.insert_text(ItemKey::TrackTitle, " Imagine ".to_string());
        tag.push(TagItem::new(
            ItemKey::TrackArtist,
            ItemValue::Text("John Lennon".to_string()),
        ));
        tag.push(TagItem::new(
            ItemKey::TrackArtist,
            ItemValue::Text("Plastic Ono Band".to_string()),
        ));
        tag.insert_text(ItemKey::RecordingDate, "1971-10-11".to_string());

        assert_eq!(
            tags_from(&tag),
            TrackTags {
                title: Some("Imagine".to_string()),
                artist: Some("John Lennon & Plastic Ono Band".to_string()),
                year: Some(1971),
            }
        );
    }

    #[test]
    fn empty_tag_yields_nothing() {
        let tag = Tag::new(TagType::VorbisComments);
        assert_eq!(tags_from(&tag), TrackTags::default());
    }

    #[test]
    fn file_name_with_year() {
        let tags = tags_from_file_name(&PathBuf::from("/music/Queen - Bohemian Rhapsody - 1975.mp3"));
        assert_eq!(
            tags,
            TrackTags {
                title: Some("Bohemian Rhapsody".to_string()),
                artist: Some("Queen".to_string()),
                year: Some(1975),
            }
        );
    }

    #[test]
    fn file_name_without_year() {
        let tags = tags_from_file_name(&PathBuf::from("Gorillaz - Clint Eastwood.flac"));
        assert_eq!(tags.artist.as_deref(), Some("Gorillaz"));
        assert_eq!(tags.title.as_deref(), Some("Clint Eastwood"));
        assert_eq!(tags.year, None);
    }

    #[test]
    fn bare_file_name_is_a_title() {
        let tags = tags_from_file_name(&PathBuf::from("track01.wav"));
        assert_eq!(tags.title.as_deref(), Some("track01"));
        assert_eq!(tags.artist, None);
    }

    #[test]
    fn tags_take_precedence_over_file_name() {
        let from_tags = TrackTags {
            title: Some("Imagine".to_string()),
            artist: None,
            year: None,
        };
        let from_name = TrackTags {
            title: Some("imagine (remaster)".to_string()),
            artist: Some("John Lennon".to_string()),
            year: Some(1971),
        };

        let merged = from_tags.or(from_name);
        assert_eq!(merged.title.as_deref(), Some("Imagine"));
        assert_eq!(merged.artist.as_deref(), Some("John Lennon"));
        assert_eq!(merged.year, Some(1971));
    }

    #[test]
    fn unreadable_file_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.flac");
        std::fs::write(&path, b"not really audio")?;

        assert!(read_tags(&path).is_err());

        Ok(())
    }
}
