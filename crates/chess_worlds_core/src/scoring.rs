//! Time budget and score for a completed level.
//!
//! The budget is the player's move count times a per-move allowance. The
//! score is the unused share of the budget scaled to [`MAX_SCORE`], never
//! negative.

use super::level::LevelDefinition;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Allowance per player move when a game does not set one.
pub const DEFAULT_SECONDS_PER_MOVE: u32 = 10;

/// Score for a completion in zero time.
pub const MAX_SCORE: u32 = 1000;

/// Time allowed for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct TimeBudget {
    /// Moves the player must make.
    player_moves: usize,
    /// Seconds granted per move.
    seconds_per_move: u32,
}

impl TimeBudget {
    /// Creates a budget; a missing or zero allowance uses [`DEFAULT_SECONDS_PER_MOVE`].
    pub fn new(player_moves: usize, seconds_per_move: Option<u32>) -> Self {
        let seconds_per_move = seconds_per_move
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_SECONDS_PER_MOVE);
        Self {
            player_moves,
            seconds_per_move,
        }
    }

    /// Budget for a level definition.
    pub fn for_level(definition: &LevelDefinition, seconds_per_move: Option<u32>) -> Self {
        Self::new(definition.player_move_count(), seconds_per_move)
    }

    /// Total time allowed.
    pub fn limit(&self) -> Duration {
        Duration::from_secs(self.player_moves as u64 * u64::from(self.seconds_per_move))
    }

    /// Time left after `elapsed`, saturating at zero.
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.limit().saturating_sub(elapsed)
    }

    /// Score for finishing in `elapsed`.
    ///
    /// A zero budget is treated as one second so that the score stays defined.
    #[instrument(skip(self), fields(limit = ?self.limit()))]
    pub fn score(&self, elapsed: Duration) -> u32 {
        let limit = self.limit().as_secs_f64();
        let limit = if limit > 0.0 { limit } else { 1.0 };
        let raw = (f64::from(MAX_SCORE) * (limit - elapsed.as_secs_f64()) / limit).round();
        let score = raw.clamp(0.0, f64::from(MAX_SCORE)) as u32;
        debug!(score, "Score computed");
        score
    }

    /// Builds the card shown after completion.
    pub fn card(&self, elapsed: Duration) -> ScoreCard {
        ScoreCard {
            score: self.score(elapsed),
            elapsed_seconds: elapsed.as_secs_f64(),
            limit_seconds: self.limit().as_secs(),
            player_moves: self.player_moves,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ScoreCard {
    /// Points earned.
    score: u32,
    /// Time taken.
    elapsed_seconds: f64,
    /// Time allowed.
    limit_seconds: u64,
    /// Moves the player made.
    player_moves: usize,
}

impl std::fmt::Display for ScoreCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Score {} ({:.1}s of {}s for {} moves)",
            self.score, self.elapsed_seconds, self.limit_seconds, self.player_moves
        )
    }
}

/// Run timer that starts on the first attempted move.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunClock {
    started: Option<Instant>,
}

impl RunClock {
    /// Starts timing unless already running.
    pub fn start_if_idle(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    /// Whether the clock is running.
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Time since start, zero when idle.
    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Stops the clock and returns the elapsed time.
    pub fn stop(&mut self) -> Duration {
        let elapsed = self.elapsed();
        self.started = None;
        elapsed
    }
}
