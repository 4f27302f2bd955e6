//! Difficulty levels and question categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Difficulty tier of a question. Ordered `Easy < Medium < Hard`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Level; 3] = [Level::Easy, Level::Medium, Level::Hard];

    /// One step harder, clamped at `Hard`.
    pub fn advance(self) -> Self {
        match self {
            Level::Easy => Level::Medium,
            Level::Medium | Level::Hard => Level::Hard,
        }
    }

    /// One step easier, clamped at `Easy`.
    pub fn regress(self) -> Self {
        match self {
            Level::Hard => Level::Medium,
            Level::Medium | Level::Easy => Level::Easy,
        }
    }

    /// Advisory answer time in seconds, rendered by the client as a countdown.
    pub fn time_budget_secs(self) -> u32 {
        match self {
            Level::Easy => 120,
            Level::Medium => 90,
            Level::Hard => 60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Easy => "easy",
            Level::Medium => "medium",
            Level::Hard => "hard",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technical,
    Behavioural,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Technical, Category::Behavioural];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Behavioural => "behavioural",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
