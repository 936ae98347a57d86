//! Which card is on the table and whether it has been flipped.

use serde::Serialize;

use crate::{
    domain::track::TrackRecord,
    game::{error::GameError, matcher::MatchResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Idle,
    Active,
    Ended,
}

#[derive(Debug)]
pub struct RoundMachine {
    catalog: Vec<TrackRecord>,
    status: RoundStatus,
    current_index: usize,
    revealed: bool,
    guess_result: Option<MatchResult>,
}

impl Default for RoundMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundMachine {
    pub fn new() -> Self {
        Self {
            catalog: Vec::new(),
            status: RoundStatus::Idle,
            current_index: 0,
            revealed: false,
            guess_result: None,
        }
    }

    pub fn load_catalog(&mut self, tracks: Vec<TrackRecord>) -> Result<(), GameError> {
        match self.status {
            RoundStatus::Idle => {}
            RoundStatus::Active => return Err(GameError::AlreadyStarted),
            RoundStatus::Ended => return Err(GameError::SessionEnded),
        }
        if tracks.is_empty() {
            return Err(GameError::EmptyCatalog);
        }
        self.catalog = tracks;
        self.status = RoundStatus::Active;
        self.current_index = 0;
        self.reset_round();
        Ok(())
    }

    pub fn reveal(&mut self) -> Result<(), GameError> {
        self.ensure_active()?;
        self.revealed = true;
        Ok(())
    }

    /// Moves to the next track. Returns `false` when already on the last
    /// track, in which case the index stays put.
    pub fn next(&mut self) -> Result<bool, GameError> {
        self.ensure_active()?;
        let last = self.catalog.len() - 1;
        let moved = self.current_index < last;
        self.current_index = (self.current_index + 1).min(last);
        self.reset_round();
        Ok(moved)
    }

    pub fn previous(&mut self) -> Result<bool, GameError> {
        self.ensure_active()?;
        let moved = self.current_index > 0;
        self.current_index = self.current_index.saturating_sub(1);
        self.reset_round();
        Ok(moved)
    }

    pub fn record_guess(&mut self, result: MatchResult) -> Result<(), GameError> {
        self.ensure_active()?;
        self.guess_result = Some(result);
        Ok(())
    }

    pub fn end(&mut self) {
        if self.status == RoundStatus::Active {
            self.status = RoundStatus::Ended;
        }
    }

    pub fn ensure_active(&self) -> Result<(), GameError> {
        match self.status {
            RoundStatus::Idle => Err(GameError::NotStarted),
            RoundStatus::Active => Ok(()),
            RoundStatus::Ended => Err(GameError::SessionEnded),
        }
    }

    pub fn current(&self) -> Option<&TrackRecord> {
        self.catalog.get(self.current_index)
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn guess_result(&self) -> Option<MatchResult> {
        self.guess_result
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    fn reset_round(&mut self) {
        self.revealed = false;
        self.guess_result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hash::TrackId;

    fn catalog(n: u8) -> Vec<TrackRecord> {
        (0..n)
            .map(|i| {
                TrackRecord::new(
                    TrackId::from_bytes(&[i]),
                    format!("Song {i}"),
                    "Band".to_string(),
                    1980 + u16::from(i),
                )
            })
            .collect()
    }

    fn active(n: u8) -> RoundMachine {
        let mut machine = RoundMachine::new();
        machine.load_catalog(catalog(n)).unwrap();
        machine
    }

    fn some_result() -> MatchResult {
        MatchResult {
            title_correct: true,
            performer_correct: false,
            year_points: 0,
            points_awarded: 1,
        }
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let mut machine = RoundMachine::new();
        assert_eq!(machine.load_catalog(vec![]), Err(GameError::EmptyCatalog));
        assert_eq!(machine.status(), RoundStatus::Idle);
    }

    #[test]
    fn idle_machine_rejects_transitions() {
        let mut machine = RoundMachine::new();
        assert_eq!(machine.reveal(), Err(GameError::NotStarted));
        assert_eq!(machine.next(), Err(GameError::NotStarted));
        assert_eq!(machine.previous(), Err(GameError::NotStarted));
    }

    #[test]
    fn load_starts_at_first_track_unrevealed() {
        let machine = active(3);
        assert_eq!(machine.status(), RoundStatus::Active);
        assert_eq!(machine.current_index(), 0);
        assert!(!machine.revealed());
        assert_eq!(machine.current().unwrap().title, "Song 0");
    }

    #[test]
    fn second_load_is_a_state_error() {
        let mut machine = active(3);
        machine.next().unwrap();
        assert_eq!(machine.load_catalog(catalog(1)), Err(GameError::AlreadyStarted));
        assert_eq!(machine.catalog_len(), 3);
        assert_eq!(machine.current_index(), 1);
    }

    #[test]
    fn reveal_is_idempotent() {
        let mut machine = active(2);
        machine.reveal().unwrap();
        machine.reveal().unwrap();
        assert!(machine.revealed());
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut machine = active(3);

        assert_eq!(machine.previous(), Ok(false));
        assert_eq!(machine.current_index(), 0);

        assert_eq!(machine.next(), Ok(true));
        assert_eq!(machine.next(), Ok(true));
        assert_eq!(machine.current_index(), 2);

        assert_eq!(machine.next(), Ok(false));
        assert_eq!(machine.current_index(), 2);

        assert_eq!(machine.previous(), Ok(true));
        assert_eq!(machine.current_index(), 1);
    }

    #[test]
    fn moving_resets_reveal_and_guess() {
        let mut machine = active(2);
        machine.record_guess(some_result()).unwrap();
        machine.reveal().unwrap();

        machine.next().unwrap();
        assert!(!machine.revealed());
        assert_eq!(machine.guess_result(), None);

        machine.record_guess(some_result()).unwrap();
        machine.reveal().unwrap();

        // clamped moves reset too
        machine.next().unwrap();
        assert!(!machine.revealed());
        assert_eq!(machine.guess_result(), None);
    }

    #[test]
    fn record_guess_keeps_card_hidden() {
        let mut machine = active(1);
        machine.record_guess(some_result()).unwrap();
        assert_eq!(machine.guess_result(), Some(some_result()));
        assert!(!machine.revealed());
    }

    #[test]
    fn ended_machine_is_frozen() {
        let mut machine = active(2);
        machine.end();
        assert_eq!(machine.status(), RoundStatus::Ended);
        assert_eq!(machine.next(), Err(GameError::SessionEnded));
        assert_eq!(machine.reveal(), Err(GameError::SessionEnded));
        assert_eq!(machine.current_index(), 0);
    }
}
