//! The question bank and random question selection.
//!
//! A bank is built once at startup (either the built-in set or a TOML file) and
//! shared read-only across every connection. Construction validates that each
//! category × level cell holds at least one question, so [`QuestionBank::draw`]
//! never has to handle an empty list.

use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::level::{Category, Level};

/// Errors raised while building a question bank.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("Failed to read question bank {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse question bank: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Question bank has no {category} questions at level {level}")]
    Empty { category: Category, level: Level },
}

/// A single interview question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub category: Category,
    pub level: Level,
    pub text: String,
}

/// Questions for one category, split by level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSet {
    pub easy: Vec<String>,
    pub medium: Vec<String>,
    pub hard: Vec<String>,
}

impl LevelSet {
    fn from_static(easy: &[&str], medium: &[&str], hard: &[&str]) -> Self {
        let owned = |list: &[&str]| -> Vec<String> { list.iter().map(|q| q.to_string()).collect() };
        Self {
            easy: owned(easy),
            medium: owned(medium),
            hard: owned(hard),
        }
    }

    fn at(&self, level: Level) -> &[String] {
        match level {
            Level::Easy => &self.easy,
            Level::Medium => &self.medium,
            Level::Hard => &self.hard,
        }
    }
}

/// On-disk layout of a custom bank.
#[derive(Debug, Deserialize)]
struct BankFile {
    #[serde(default)]
    technical: LevelSet,
    #[serde(default)]
    behavioural: LevelSet,
}

/// Immutable bank of questions keyed by category × level.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    technical: LevelSet,
    behavioural: LevelSet,
}

impl QuestionBank {
    /// Build a bank, rejecting it if any category × level cell is empty.
    pub fn new(technical: LevelSet, behavioural: LevelSet) -> Result<Self, BankError> {
        let bank = Self {
            technical,
            behavioural,
        };
        bank.validate()?;
        Ok(bank)
    }

    /// The built-in investment-banking question set.
    pub fn builtin() -> Self {
        Self {
            technical: LevelSet::from_static(
                &[
                    "Walk me through the three financial statements.",
                    "Define enterprise value.",
                ],
                &[
                    "How does a $10 depreciation flow through all three statements?",
                    "Why might two companies with identical EBITDA trade at different EV/EBITDA multiples?",
                ],
                &[
                    "Explain how to value a company with negative cash flow and no comparables.",
                    "Describe a precedent-transaction analysis step-by-step and its pitfalls.",
                ],
            ),
            behavioural: LevelSet::from_static(
                &["Tell me about yourself.", "Why investment banking?"],
                &[
                    "Describe a time you worked under extreme pressure.",
                    "What is your greatest professional failure and what did you learn?",
                ],
                &[
                    "Tell me about a time you had to persuade senior stakeholders to change strategy.",
                    "Describe a situation where you balanced ethical considerations against profit.",
                ],
            ),
        }
    }

    /// Parse a bank from TOML with `[technical]` and `[behavioural]` tables.
    pub fn from_toml_str(contents: &str) -> Result<Self, BankError> {
        let file: BankFile = toml::from_str(contents)?;
        Self::new(file.technical, file.behavioural)
    }

    /// Load a bank from a TOML file.
    pub async fn load(path: &Path) -> Result<Self, BankError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| BankError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let bank = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded question bank from {:?}", path);
        Ok(bank)
    }

    /// All questions for a category at a level, in bank order.
    pub fn questions(&self, category: Category, level: Level) -> &[String] {
        match category {
            Category::Technical => self.technical.at(level),
            Category::Behavioural => self.behavioural.at(level),
        }
    }

    /// Total number of questions across all cells.
    pub fn len(&self) -> usize {
        Category::ALL
            .iter()
            .flat_map(|c| Level::ALL.iter().map(move |l| self.questions(*c, *l).len()))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pick a category uniformly, then a question uniformly from that
    /// category's list at `level`.
    pub fn draw<R: Rng + ?Sized>(&self, level: Level, rng: &mut R) -> Question {
        let category = Category::ALL[rng.gen_range(0..Category::ALL.len())];
        let list = self.questions(category, level);
        let text = list[rng.gen_range(0..list.len())].clone();
        Question {
            category,
            level,
            text,
        }
    }

    fn validate(&self) -> Result<(), BankError> {
        for category in Category::ALL {
            for level in Level::ALL {
                if self.questions(category, level).is_empty() {
                    return Err(BankError::Empty { category, level });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn builtin_bank_is_valid() {
        let bank = QuestionBank::builtin();
        assert!(bank.validate().is_ok());
        assert_eq!(bank.len(), 12);
        assert!(!bank.is_empty());
    }

    #[test]
    fn draw_returns_question_at_requested_level() {
        let bank = QuestionBank::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        for level in Level::ALL {
            for _ in 0..50 {
                let q = bank.draw(level, &mut rng);
                assert_eq!(q.level, level);
                assert!(bank.questions(q.category, level).contains(&q.text));
            }
        }
    }

    #[test]
    fn draw_covers_both_categories() {
        let bank = QuestionBank::builtin();
        let mut rng = StdRng::seed_from_u64(42);
        let categories: HashSet<Category> = (0..100)
            .map(|_| bank.draw(Level::Medium, &mut rng).category)
            .collect();
        assert_eq!(categories.len(), 2);
    }

    #[test]
    fn draw_is_deterministic_for_a_seed() {
        let bank = QuestionBank::builtin();
        let a = bank.draw(Level::Hard, &mut StdRng::seed_from_u64(3));
        let b = bank.draw(Level::Hard, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn parses_custom_bank() {
        let toml = r#"
            [technical]
            easy = ["What is a DCF?"]
            medium = ["What is WACC?"]
            hard = ["Value an unprofitable startup."]

            [behavioural]
            easy = ["Why us?"]
            medium = ["Describe a conflict."]
            hard = ["Describe an ethical dilemma."]
        "#;
        let bank = QuestionBank::from_toml_str(toml).unwrap();
        assert_eq!(bank.len(), 6);
        assert_eq!(
            bank.questions(Category::Technical, Level::Medium),
            &["What is WACC?".to_string()]
        );
    }

    #[test]
    fn rejects_bank_with_empty_cell() {
        let toml = r#"
            [technical]
            easy = ["What is a DCF?"]
            medium = ["What is WACC?"]
            hard = ["Value an unprofitable startup."]

            [behavioural]
            easy = ["Why us?"]
            medium = []
            hard = ["Describe an ethical dilemma."]
        "#;
        let err = QuestionBank::from_toml_str(toml).unwrap_err();
        assert!(matches!(
            err,
            BankError::Empty {
                category: Category::Behavioural,
                level: Level::Medium
            }
        ));
    }

    #[test]
    fn rejects_bank_missing_a_category() {
        let toml = r#"
            [technical]
            easy = ["a"]
            medium = ["b"]
            hard = ["c"]
        "#;
        let err = QuestionBank::from_toml_str(toml).unwrap_err();
        assert!(matches!(
            err,
            BankError::Empty {
                category: Category::Behavioural,
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = QuestionBank::from_toml_str("[technical\neasy = 3").unwrap_err();
        assert!(matches!(err, BankError::Parse(_)));
    }

    #[tokio::test]
    async fn loads_bank_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.toml");
        std::fs::write(
            &path,
            r#"
            [technical]
            easy = ["a"]
            medium = ["b"]
            hard = ["c"]
            [behavioural]
            easy = ["d"]
            medium = ["e"]
            hard = ["f"]
            "#,
        )
        .unwrap();

        let bank = QuestionBank::load(&path).await.unwrap();
        assert_eq!(bank.questions(Category::Behavioural, Level::Hard), &["f"]);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = QuestionBank::load(Path::new("/nonexistent/bank.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, BankError::Io { .. }));
    }
}
