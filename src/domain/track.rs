use serde::{Deserialize, Serialize};

use super::hash::TrackId;
use crate::game::error::GameError;

pub const MIN_YEAR: u16 = 1000;
pub const MAX_YEAR: u16 = 9999;

/// One card of the answer key: what is playing and what the players must guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: TrackId,
    pub audio_ref: String,
    pub title: String,
    pub performer: String,
    pub release_year: u16,
    #[serde(default)]
    pub emoji: String,
}

impl TrackRecord {
    pub fn new(id: TrackId, title: String, performer: String, release_year: u16) -> Self {
        Self {
            audio_ref: stream_ref(&id),
            id,
            title,
            performer,
            release_year,
            emoji: String::new(),
        }
    }

    /// Checks the invariants every record must hold before it can be played.
    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |reason: &str| GameError::InvalidRecord {
            id: self.id.to_hex(),
            reason: reason.to_string(),
        };

        if self.title.trim().is_empty() {
            return Err(invalid("empty title"));
        }
        if self.performer.trim().is_empty() {
            return Err(invalid("empty performer"));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.release_year) {
            return Err(invalid(&format!(
                "release year {} is not a 4-digit year",
                self.release_year
            )));
        }
        Ok(())
    }
}

/// URL path the game page streams a track from.
pub fn stream_ref(id: &TrackId) -> String {
    format!("/tracks/{}/stream", id.to_hex())
}
