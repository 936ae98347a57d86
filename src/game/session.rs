//! Session controller: play mode, countdown and end-of-game rules on top of
//! the round machine, matcher and ledger.

use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{hash::TrackId, track::TrackRecord},
    game::{
        error::GameError,
        ledger::{ScoreLedger, Standing},
        matcher::{self, GuessInput, MatchResult},
        round::{RoundMachine, RoundStatus},
    },
};

/// Length of a speed round.
pub const TIMED_ROUND_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    FreePlay,
    TimedRound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndCondition {
    /// Someone reaches `points`.
    TargetScore { points: u64 },
    /// The speed round countdown runs out.
    TimeLimit,
    /// Someone tries to advance past the last track.
    CatalogExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: PlayMode,
    pub end_condition: EndCondition,
}

impl SessionConfig {
    pub fn free_play(end_condition: EndCondition) -> Self {
        Self {
            mode: PlayMode::FreePlay,
            end_condition,
        }
    }

    pub fn timed_round() -> Self {
        Self {
            mode: PlayMode::TimedRound,
            end_condition: EndCondition::TimeLimit,
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        match (self.mode, self.end_condition) {
            (_, EndCondition::TargetScore { points: 0 }) => Err(GameError::InvalidConfig(
                "target score must be at least 1".into(),
            )),
            (PlayMode::FreePlay, EndCondition::TimeLimit) => Err(GameError::InvalidConfig(
                "a time limit needs the timed round mode".into(),
            )),
            (PlayMode::TimedRound, EndCondition::CatalogExhausted) => Err(
                GameError::InvalidConfig("catalog exhaustion only ends free play".into()),
            ),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
}

/// Speed round clock. Only moves when the host calls [`Countdown::tick`].
#[derive(Debug, Clone)]
pub struct Countdown {
    duration: Duration,
    elapsed: Duration,
    running: bool,
}

impl Countdown {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn tick(&mut self, elapsed: Duration) {
        if self.running {
            self.elapsed = self.elapsed.saturating_add(elapsed).min(self.duration);
        }
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }

    pub fn expired(&self) -> bool {
        self.remaining().is_zero()
    }

    pub fn running(&self) -> bool {
        self.running && !self.expired()
    }

    /// Whole seconds left, rounded up so the display only shows 0 once
    /// time is really up.
    pub fn remaining_seconds(&self) -> u64 {
        let remaining = self.remaining();
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }
}

pub struct Session {
    config: SessionConfig,
    round: RoundMachine,
    ledger: ScoreLedger,
    countdown: Option<Countdown>,
    /// Set once somebody tried to move past the last track.
    exhausted: bool,
}

impl Session {
    pub fn start(config: SessionConfig, catalog: Vec<TrackRecord>) -> Result<Self, GameError> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(GameError::EmptyCatalog);
        }
        for record in &catalog {
            record.validate()?;
        }

        let tracks = catalog.len();
        let mut round = RoundMachine::new();
        round.load_catalog(catalog)?;

        let countdown = match config.mode {
            PlayMode::FreePlay => None,
            PlayMode::TimedRound => Some(Countdown::new(Duration::from_secs(TIMED_ROUND_SECONDS))),
        };

        info!(
            "Session started: {:?}, end condition {:?}, {} tracks",
            config.mode, config.end_condition, tracks
        );

        Ok(Self {
            config,
            round,
            ledger: ScoreLedger::new(),
            countdown,
            exhausted: false,
        })
    }

    pub fn join(&mut self, player: &str) -> Result<(), GameError> {
        self.round.ensure_active()?;
        self.ledger.join(player);
        Ok(())
    }

    pub fn submit_guess(
        &mut self,
        player: &str,
        guess: &GuessInput,
    ) -> Result<MatchResult, GameError> {
        self.round.ensure_active()?;
        if self.round.revealed() {
            return Err(GameError::RoundRevealed);
        }
        if self.countdown.as_ref().is_some_and(Countdown::expired) {
            return Err(GameError::TimeExpired);
        }
        if self.round.guess_result().is_some() {
            return Err(GameError::RoundAlreadyGuessed);
        }

        let record = self.round.current().ok_or(GameError::NotStarted)?;
        let result = matcher::evaluate(record, guess);
        debug!(
            "Guess by {} on track {}: {:?}",
            player,
            record.id,
            result
        );

        self.round.record_guess(result)?;
        self.ledger
            .apply_points(player, i64::from(result.points_awarded))?;
        Ok(result)
    }

    /// Flips the current card.
    pub fn reveal(&mut self) -> Result<&TrackRecord, GameError> {
        self.round.reveal()?;
        let record = self.round.current().ok_or(GameError::NotStarted)?;
        debug!("Revealed track {}", record.id);
        Ok(record)
    }

    pub fn advance(&mut self, direction: Direction) -> Result<(), GameError> {
        let moved = match direction {
            Direction::Next => self.round.next()?,
            Direction::Previous => self.round.previous()?,
        };
        if direction == Direction::Next && !moved {
            debug!("Advance past the last track");
            self.exhausted = true;
        }
        debug!("Now on track {}", self.round.current_index());
        Ok(())
    }

    pub fn start_timer(&mut self) -> Result<(), GameError> {
        self.round.ensure_active()?;
        let countdown = self.countdown.as_mut().ok_or(GameError::NotTimed)?;
        countdown.start();
        Ok(())
    }

    /// Feeds wall-clock time into the countdown. Does nothing outside a
    /// running speed round.
    pub fn tick(&mut self, elapsed: Duration) {
        if self.round.status() != RoundStatus::Active {
            return;
        }
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.tick(elapsed);
        }
    }

    /// Ends the session if its end condition holds. Returns whether the
    /// session is over.
    pub fn check_end_condition(&mut self) -> bool {
        match self.round.status() {
            RoundStatus::Ended => return true,
            RoundStatus::Idle => return false,
            RoundStatus::Active => {}
        }

        let reason = if self.countdown.as_ref().is_some_and(Countdown::expired) {
            Some("time is up".to_string())
        } else {
            match self.config.end_condition {
                EndCondition::TargetScore { points } if self.ledger.max_score() >= points => {
                    Some(format!("target score {points} reached"))
                }
                EndCondition::CatalogExhausted
                    if self.config.mode == PlayMode::FreePlay && self.exhausted =>
                {
                    Some("catalog exhausted".to_string())
                }
                _ => None,
            }
        };

        match reason {
            Some(reason) => {
                info!("Session ended: {reason}");
                self.round.end();
                true
            }
            None => false,
        }
    }

    /// Everyone sharing the top score, in join order.
    pub fn winner(&self) -> Result<Vec<Standing>, GameError> {
        if self.round.status() != RoundStatus::Ended {
            return Err(GameError::NotEnded);
        }
        Ok(self.ledger.leaders())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let revealed = self.round.revealed();
        // the last card is shown once the game is over
        let show_answer = revealed || self.round.status() == RoundStatus::Ended;
        let card = self.round.current().map(|record| CardView {
            id: record.id.clone(),
            audio_ref: record.audio_ref.clone(),
            emoji: record.emoji.clone(),
            answer: show_answer.then(|| Answer {
                title: record.title.clone(),
                performer: record.performer.clone(),
                release_year: record.release_year,
            }),
        });

        SessionSnapshot {
            status: self.round.status(),
            mode: self.config.mode,
            current_index: self.round.current_index(),
            catalog_len: self.round.catalog_len(),
            card,
            revealed,
            guess_result: self.round.guess_result(),
            remaining_seconds: self.countdown.as_ref().map(Countdown::remaining_seconds),
            timer_running: self.countdown.as_ref().is_some_and(Countdown::running),
            standings: self.ledger.standings(),
        }
    }
}

/// Everything the game page needs to draw the card, timer and scoreboard.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub status: RoundStatus,
    pub mode: PlayMode,
    pub current_index: usize,
    pub catalog_len: usize,
    pub card: Option<CardView>,
    pub revealed: bool,
    pub guess_result: Option<MatchResult>,
    pub remaining_seconds: Option<u64>,
    pub timer_running: bool,
    pub standings: Vec<Standing>,
}

#[derive(Debug, Serialize)]
pub struct CardView {
    pub id: TrackId,
    pub audio_ref: String,
    pub emoji: String,
    /// Only present once the card has been revealed or the game is over.
    pub answer: Option<Answer>,
}

#[derive(Debug, Serialize)]
pub struct Answer {
    pub title: String,
    pub performer: String,
    pub release_year: u16,
}
