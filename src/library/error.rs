use thiserror::Error;

use crate::{domain::hash::TrackId, game::error::GameError};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("track {0} not found")]
    TrackNotFound(TrackId),

    #[error("track {track} has no valid music file")]
    InvalidTrackFile { track: TrackId },

    #[error("invalid track id")]
    InvalidTrackId,

    #[error("catalog entry rejected: {0}")]
    InvalidRecord(#[from] GameError),

    #[error("could not read tags: {0}")]
    Metadata(#[from] lofty::error::LoftyError),

    #[error("release year lookup failed: {0}")]
    Lookup(#[from] reqwest::Error),

    #[error("catalog file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
