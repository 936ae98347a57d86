use serde::Serialize;

use crate::game::error::GameError;

pub type PlayerId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub player: PlayerId,
    pub score: u64,
}

/// Running totals per player, kept in join order.
#[derive(Debug, Default)]
pub struct ScoreLedger {
    entries: Vec<Standing>,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a player with no points. Joining twice keeps the original
    /// position and score.
    pub fn join(&mut self, player: &str) {
        self.entry_mut(player);
    }

    pub fn apply_points(&mut self, player: &str, points: i64) -> Result<u64, GameError> {
        let points = u64::try_from(points).map_err(|_| GameError::InvalidPoints(points))?;
        let entry = self.entry_mut(player);
        entry.score = entry.score.saturating_add(points);
        Ok(entry.score)
    }

    /// Highest score first. Ties keep join order.
    pub fn standings(&self) -> Vec<Standing> {
        let mut standings = self.entries.clone();
        // stable sort
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        standings
    }

    /// Every player sharing the top score, in join order.
    pub fn leaders(&self) -> Vec<Standing> {
        let Some(top) = self.entries.iter().map(|e| e.score).max() else {
            return Vec::new();
        };
        self.entries
            .iter()
            .filter(|e| e.score == top)
            .cloned()
            .collect()
    }

    pub fn max_score(&self) -> u64 {
        self.entries.iter().map(|e| e.score).max().unwrap_or(0)
    }

    fn entry_mut(&mut self, player: &str) -> &mut Standing {
        let pos = match self.entries.iter().position(|e| e.player == player) {
            Some(pos) => pos,
            None => {
                self.entries.push(Standing {
                    player: player.to_string(),
                    score: 0,
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos]
    }
}
