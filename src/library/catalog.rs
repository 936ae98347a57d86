//! The answer key: every playable track with its correct answers and the
//! file it is streamed from.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use log::{info, warn};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{
    config::LibrarySource,
    domain::{hash::TrackId, track::TrackRecord},
    library::{
        error::LibraryError,
        fs::{ObservedFile, scan_library},
        tags::{TrackTags, read_tags, tags_from_file_name},
        wiki::YearLookup,
    },
};

const EMOJIS: &[&str] = &[
    "🎵", "🎶", "🎤", "🎧", "🎸", "🎹", "🎺", "🎷", "🥁", "🎼", "👑", "⭐", "🌟", "✨", "💫",
    "🔥", "❤️", "💯", "🎉", "🎊", "🕺", "💃", "🙌", "👏", "✌️", "🤘", "🎯", "🏆", "🥇", "🌈",
    "☀️", "🌙", "⚡", "🌊", "🌸", "🦋", "🐝", "🎭", "🎪", "🎨",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub record: TrackRecord,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub generated_at: DateTime<Local>,
    pub tracks: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(tracks: Vec<CatalogEntry>) -> Self {
        Self {
            generated_at: Local::now(),
            tracks,
        }
    }

    /// Scans the library and turns every usable file into a card.
    ///
    /// Files without a title, artist or release year are skipped, as are
    /// further copies of a recording that already made it in. A missing
    /// year is asked of `lookup` first, when there is one.
    pub fn build(
        source: &LibrarySource,
        shuffle: bool,
        lookup: Option<&dyn YearLookup>,
    ) -> Result<Self, LibraryError> {
        info!("Scanning the music library...");
        let files = scan_library(source)?;
        let mut seen = HashSet::new();
        let mut rng = rand::thread_rng();

        let mut tracks = files
            .into_iter()
            .filter_map(|file| entry_for(file, lookup))
            .filter(|entry| seen.insert(entry.record.id.clone()))
            .map(|mut entry| {
                if let Some(emoji) = EMOJIS.choose(&mut rng) {
                    entry.record.emoji = emoji.to_string();
                }
                entry
            })
            .collect::<Vec<_>>();

        if shuffle {
            tracks.shuffle(&mut rng);
        }

        info!("Catalog built with {} tracks", tracks.len());
        Ok(Self::new(tracks))
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let contents = std::fs::read_to_string(path)?;
        let catalog: Catalog = serde_json::from_str(&contents)?;
        for entry in &catalog.tracks {
            entry.record.validate()?;
        }
        Ok(catalog)
    }

    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Wrote catalog to {}", path.to_string_lossy());
        Ok(())
    }

    pub fn records(&self) -> Vec<TrackRecord> {
        self.tracks.iter().map(|e| e.record.clone()).collect()
    }

    pub fn path_of(&self, id: &TrackId) -> Option<&Path> {
        self.tracks
            .iter()
            .find(|e| &e.record.id == id)
            .map(|e| e.path.as_path())
    }
}

/// Card for a single file, or `None` when it cannot be played.
fn entry_for(file: ObservedFile, lookup: Option<&dyn YearLookup>) -> Option<CatalogEntry> {
    let path_str = file.path.to_string_lossy().to_string();
    let from_tags = read_tags(&file.path).unwrap_or_else(|e| {
        warn!("{path_str}: {e}, falling back to the file name");
        TrackTags::default()
    });
    let tags = from_tags.or(tags_from_file_name(&file.path));

    let (Some(title), Some(artist)) = (tags.title, tags.artist) else {
        warn!("{path_str}: missing title or artist, skipping");
        return None;
    };
    let year = tags.year.or_else(|| {
        let lookup = lookup?;
        lookup
            .release_year(&title, &artist)
            .unwrap_or_else(|e| {
                warn!("{path_str}: {e}");
                None
            })
    });
    let Some(year) = year else {
        warn!("{path_str}: no release year, skipping");
        return None;
    };

    let record = TrackRecord::new(file.track_id, title, artist, year);
    if let Err(e) = record.validate() {
        warn!("{path_str}: {e}, skipping");
        return None;
    }

    Some(CatalogEntry {
        record,
        path: file.path,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::game::error::GameError;

    fn source(root: &Path) -> LibrarySource {
        LibrarySource {
            roots: vec![root.to_path_buf()],
            follow_symlinks: false,
            ignored_dirs: vec![],
        }
    }

    #[test]
    fn build_uses_file_names_and_skips_unusable_files() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("Queen - Bohemian Rhapsody - 1975.mp3"), b"a")?;
        fs::write(dir.path().join("John Lennon - Imagine - 1971.flac"), b"b")?;
        // same bytes, same recording
        fs::write(dir.path().join("Queen - Bohemian Rhapsody - 1975 (copy).mp3"), b"a")?;
        // no year anywhere
        fs::write(dir.path().join("Gorillaz - Clint Eastwood.mp3"), b"c")?;
        fs::write(dir.path().join("cover.jpg"), b"d")?;

        let catalog = Catalog::build(&source(dir.path()), false, None)?;

        let titles: Vec<_> = catalog
            .tracks
            .iter()
            .map(|e| e.record.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Imagine", "Bohemian Rhapsody"]);

        let imagine = &catalog.tracks[0];
        assert_eq!(imagine.record.performer, "John Lennon");
        assert_eq!(imagine.record.release_year, 1971);
        assert_eq!(imagine.record.id, TrackId::from_bytes(b"b"));
        assert!(EMOJIS.contains(&imagine.record.emoji.as_str()));
        assert_eq!(catalog.path_of(&imagine.record.id), Some(imagine.path.as_path()));

        Ok(())
    }

    struct FixedYears(Vec<(&'static str, Option<u16>)>);

    impl YearLookup for FixedYears {
        fn release_year(&self, title: &str, _artist: &str) -> Result<Option<u16>, LibraryError> {
            match self.0.iter().find(|(t, _)| *t == title) {
                Some((_, year)) => Ok(*year),
                None => Err(LibraryError::Internal(anyhow::anyhow!("offline"))),
            }
        }
    }

    #[test]
    fn build_asks_lookup_for_missing_years() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("Gorillaz - Clint Eastwood.mp3"), b"a")?;
        fs::write(dir.path().join("Blur - Song 2.mp3"), b"b")?;
        fs::write(dir.path().join("Oasis - Wonderwall.mp3"), b"c")?;
        // tagged years win over the lookup
        fs::write(dir.path().join("Queen - Bohemian Rhapsody - 1975.mp3"), b"d")?;

        let lookup = FixedYears(vec![
            ("Clint Eastwood", Some(2001)),
            ("Song 2", None),
            ("Bohemian Rhapsody", Some(2018)),
        ]);
        let catalog = Catalog::build(&source(dir.path()), false, Some(&lookup))?;

        let cards: Vec<_> = catalog
            .tracks
            .iter()
            .map(|e| (e.record.title.as_str(), e.record.release_year))
            .collect();
        assert_eq!(
            cards,
            vec![("Clint Eastwood", 2001), ("Bohemian Rhapsody", 1975)]
        );

        Ok(())
    }

    #[test]
    fn shuffle_keeps_every_track() -> anyhow::Result<()> {
        let dir = tempdir()?;
        for year in 1980..1990 {
            fs::write(
                dir.path().join(format!("Band - Song {year} - {year}.mp3")),
                year.to_string(),
            )?;
        }

        let catalog = Catalog::build(&source(dir.path()), true, None)?;

        let mut years: Vec<_> = catalog
            .tracks
            .iter()
            .map(|e| e.record.release_year)
            .collect();
        years.sort();
        assert_eq!(years, (1980..1990).collect::<Vec<u16>>());

        Ok(())
    }

    #[test]
    fn save_then_load() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("catalog.json");

        let record = TrackRecord {
            emoji: "🎹".to_string(),
            ..TrackRecord::new(
                TrackId::from_bytes(b"x"),
                "Imagine".to_string(),
                "John Lennon".to_string(),
                1971,
            )
        };
        let catalog = Catalog::new(vec![CatalogEntry {
            record: record.clone(),
            path: PathBuf::from("/music/imagine.flac"),
        }]);

        catalog.save(&path)?;
        let loaded = Catalog::load(&path)?;

        assert_eq!(loaded.tracks, catalog.tracks);
        assert_eq!(loaded.records(), vec![record]);

        Ok(())
    }

    #[test]
    fn load_revalidates_records() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("catalog.json");
        let json = format!(
            r#"{{
  "generated_at": "2024-01-01T12:00:00+01:00",
  "tracks": [
    {{
      "id": "{}",
      "audio_ref": "/tracks/x/stream",
      "title": "",
      "performer": "Nobody",
      "release_year": 1999,
      "path": "/music/x.mp3"
    }}
  ]
}}"#,
            TrackId::from_bytes(b"x").to_hex()
        );
        fs::write(&path, json)?;

        let err = Catalog::load(&path).unwrap_err();
        assert!(matches!(
            err,
            LibraryError::InvalidRecord(GameError::InvalidRecord { .. })
        ));

        Ok(())
    }

    #[test]
    fn load_missing_file_fails() {
        let err = Catalog::load(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, LibraryError::Fs(_)));
    }
}
