//! Per-connection interview session and the adaptive difficulty engine.
//!
//! Difficulty follows a two-in-a-row rule:
//!
//! ```text
//!             two scores >= 4               two scores >= 4
//!   +------+  ------------------>  +--------+  ---------------->  +------+
//!   | easy |                       | medium |                     | hard |
//!   +------+  <------------------  +--------+  <----------------  +------+
//!             two scores <= 2               two scores <= 2
//! ```
//!
//! A score of 3 breaks any streak. Firing a transition resets the streak that
//! caused it. There is no decay over time.

use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use super::level::Level;
use super::questions::{Question, QuestionBank};

/// Streak length that triggers a level change.
pub const STREAK_TO_TRANSITION: u32 = 2;

/// An answer score in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Neutral score used when an oracle reply carries no usable digit.
    pub const NEUTRAL: Score = Score(3);

    /// Returns `None` when `value` is outside `1..=5`.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Clamp any integer into `1..=5`.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn is_good(self) -> bool {
        self.0 >= 4
    }

    fn is_bad(self) -> bool {
        self.0 <= 2
    }
}

/// Level change produced by a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Advanced { from: Level, to: Level },
    Regressed { from: Level, to: Level },
}

/// Snapshot of a session's counters, sent to the client as `stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub level: Level,
    pub streak_up: u32,
    pub streak_down: u32,
    pub answered: u32,
    pub total_score: u32,
}

impl SessionStats {
    /// Apply one score: update totals, then streaks, then the level.
    pub fn apply_score(&mut self, score: Score) -> Transition {
        self.answered += 1;
        self.total_score += u32::from(score.get());

        if score.is_good() {
            self.streak_up += 1;
            self.streak_down = 0;
        } else if score.is_bad() {
            self.streak_down += 1;
            self.streak_up = 0;
        } else {
            self.streak_up = 0;
            self.streak_down = 0;
        }

        let from = self.level;
        if self.streak_up == STREAK_TO_TRANSITION && from != Level::Hard {
            self.level = from.advance();
            self.streak_up = 0;
            Transition::Advanced {
                from,
                to: self.level,
            }
        } else if self.streak_down == STREAK_TO_TRANSITION && from != Level::Easy {
            self.level = from.regress();
            self.streak_down = 0;
            Transition::Regressed {
                from,
                to: self.level,
            }
        } else {
            Transition::Unchanged
        }
    }

    /// Mean score so far, `None` before the first answer.
    pub fn average_score(&self) -> Option<f64> {
        (self.answered > 0).then(|| f64::from(self.total_score) / f64::from(self.answered))
    }
}

/// One candidate's interview, owned by its connection task.
///
/// A session always has exactly one pending question: the one most recently
/// sent to the client and not yet answered.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    stats: SessionStats,
    pending: Question,
}

impl Session {
    /// Start a session at `easy` with the first question already drawn.
    pub fn start<R: Rng + ?Sized>(bank: &QuestionBank, rng: &mut R) -> Self {
        Self::with_id(Uuid::new_v4(), bank, rng)
    }

    pub fn with_id<R: Rng + ?Sized>(id: Uuid, bank: &QuestionBank, rng: &mut R) -> Self {
        let stats = SessionStats::default();
        let pending = bank.draw(stats.level, rng);
        Self { id, stats, pending }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn level(&self) -> Level {
        self.stats.level
    }

    /// The question currently awaiting an answer.
    pub fn pending_question(&self) -> &Question {
        &self.pending
    }

    /// Close the current turn: record `score` against the pending question,
    /// then draw the next one at the resulting level.
    pub fn complete_turn<R: Rng + ?Sized>(
        &mut self,
        score: Score,
        bank: &QuestionBank,
        rng: &mut R,
    ) -> Transition {
        let transition = self.stats.apply_score(score);
        self.pending = bank.draw(self.stats.level, rng);
        transition
    }
}
