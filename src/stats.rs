//! Per-player shooting statistics and the frozen end-of-game snapshot.

use serde::{Deserialize, Serialize};

use crate::common::{Side, Timestamp};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub shots: u32,
    pub hits: u32,
    /// Hit rate as a whole percentage, rounded.
    pub accuracy: u8,
    pub ships_sunk: u32,
    /// Running average of time taken per shot, in milliseconds.
    pub avg_turn_ms: u64,
}

impl PlayerStats {
    /// Fold one shot into the running figures. `elapsed_ms` is the time since
    /// the turn started.
    pub fn record_shot(&mut self, hit: bool, sunk: bool, elapsed_ms: u64) {
        self.shots += 1;
        if hit {
            self.hits += 1;
        }
        if sunk {
            self.ships_sunk += 1;
        }
        self.accuracy = ((self.hits as f64 / self.shots as f64) * 100.0).round() as u8;
        let n = self.shots as u64;
        self.avg_turn_ms = (self.avg_turn_ms * (n - 1) + elapsed_ms) / n;
    }
}

/// Why a game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum EndReason {
    FleetDestroyed,
    Forfeit(String),
    /// No untargeted cell remains for the side to move.
    Stalemate,
    Timeout,
    /// Decided by the remote authority.
    Authoritative(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Winner(Side),
    Draw,
}

/// Immutable end-of-game record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub outcome: GameOutcome,
    pub reason: EndReason,
    pub stats: [PlayerStats; 2],
    pub ended_at: Timestamp,
    pub duration_ms: u64,
}

impl GameSummary {
    pub fn winner(&self) -> Option<Side> {
        match self.outcome {
            GameOutcome::Winner(side) => Some(side),
            GameOutcome::Draw => None,
        }
    }

    pub fn stats_for(&self, side: Side) -> &PlayerStats {
        &self.stats[side.index()]
    }
}

/// Outcome implied by the fleets' state, if the game is over. Both fleets
/// gone at once is a draw.
pub fn detect_outcome(first_destroyed: bool, second_destroyed: bool) -> Option<GameOutcome> {
    match (first_destroyed, second_destroyed) {
        (true, true) => Some(GameOutcome::Draw),
        (true, false) => Some(GameOutcome::Winner(Side::Second)),
        (false, true) => Some(GameOutcome::Winner(Side::First)),
        (false, false) => None,
    }
}
