//! Checks a player's guess against the answer key.

use serde::{Deserialize, Serialize};

use crate::domain::track::TrackRecord;

pub const TITLE_POINTS: u32 = 1;
pub const PERFORMER_POINTS: u32 = 1;
pub const EXACT_YEAR_POINTS: u32 = 2;
pub const NEAR_YEAR_POINTS: u32 = 1;
/// Largest distance in years that still earns [`NEAR_YEAR_POINTS`].
pub const YEAR_TOLERANCE: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuessInput {
    pub title: Option<String>,
    pub performer: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub title_correct: bool,
    pub performer_correct: bool,
    pub year_points: u32,
    pub points_awarded: u32,
}

pub fn evaluate(record: &TrackRecord, guess: &GuessInput) -> MatchResult {
    let title_correct = text_matches(&record.title, guess.title.as_deref());
    let performer_correct = text_matches(&record.performer, guess.performer.as_deref());
    let year_points = guess
        .year
        .map(|year| year_points(year, record.release_year))
        .unwrap_or(0);

    let points_awarded = u32::from(title_correct) * TITLE_POINTS
        + u32::from(performer_correct) * PERFORMER_POINTS
        + year_points;

    MatchResult {
        title_correct,
        performer_correct,
        year_points,
        points_awarded,
    }
}

/// Exact year scores 2, a year at most [`YEAR_TOLERANCE`] away scores 1.
pub fn year_points(guess: i32, release_year: u16) -> u32 {
    match guess.abs_diff(i32::from(release_year)) {
        0 => EXACT_YEAR_POINTS,
        diff if diff <= YEAR_TOLERANCE => NEAR_YEAR_POINTS,
        _ => 0,
    }
}

fn text_matches(expected: &str, guess: Option<&str>) -> bool {
    guess.is_some_and(|guess| normalize(guess) == normalize(expected))
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
