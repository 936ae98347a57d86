//! Module to scan music directories in the file system

use log::warn;
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

use crate::{config::LibrarySource, domain::hash::TrackId, library::error::LibraryError};

const MUSIC_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "m4a", "ogg", "aac"];

pub fn is_music_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MUSIC_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct ObservedFile {
    pub track_id: TrackId,
    pub path: PathBuf,
}

impl ObservedFile {
    pub fn new(id: TrackId, path: PathBuf) -> Self {
        Self { track_id: id, path }
    }
}

/// Recursively scans all music files in the given directory. Retrieves their paths and track ids
pub fn scan_dir(
    follow_symlinks: bool,
    root: &Path,
    ignored_dirs: &[PathBuf],
) -> Result<Vec<ObservedFile>, LibraryError> {
    let root_str = root.to_string_lossy();

    let paths = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .into_iter()
        // keep the entry if it's not inside any ignored directory
        .filter_entry(|entry| {
            !ignored_dirs
                .iter()
                .any(|ignored| entry.path().starts_with(ignored))
        })
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("error while scanning dir {root_str}, skipping an entry: {err:?}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|e| is_music_file(e))
        .collect::<Vec<PathBuf>>();

    paths
        .into_iter()
        .map(|path| Ok(ObservedFile::new(TrackId::from_file(&path)?, path)))
        .collect()
}

/// Scans every configured root. Files come back sorted by path.
pub fn scan_library(source: &LibrarySource) -> Result<Vec<ObservedFile>, LibraryError> {
    let mut files = source
        .roots
        .iter()
        .map(|root| scan_dir(source.follow_symlinks, root, &source.ignored_dirs))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Best-effort check that a path points to a real, playable music file.
///
/// This does NOT decode audio, but rules out:
/// - missing paths
/// - directories / special files
/// - wrong extensions
/// - empty files
pub fn is_valid_music_path(path: &Path) -> bool {
    let meta = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return false,
    };

    meta.is_file() && is_music_file(path) && meta.len() > 0
}
