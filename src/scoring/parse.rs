//! Parsing of raw oracle replies into a score and explanation.
//!
//! The model is asked for `{"score": int, "explanation": string}`. When it
//! answers with anything else, the first digit `1`-`5` in the text becomes the
//! score and the trimmed text becomes the explanation.

use serde_json::Value;

use crate::interview::Score;

/// Outcome of parsing a raw model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedReply {
    /// The reply was a JSON object with usable `score` and `explanation`.
    Structured { score: Score, explanation: String },
    /// The reply was free text; `raw` is the trimmed reply.
    Fallback { score: Score, raw: String },
}

impl ParsedReply {
    pub fn score(&self) -> Score {
        match self {
            ParsedReply::Structured { score, .. } | ParsedReply::Fallback { score, .. } => *score,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ParsedReply::Fallback { .. })
    }

    /// Split into `(score, explanation)`.
    pub fn into_parts(self) -> (Score, String) {
        match self {
            ParsedReply::Structured { score, explanation } => (score, explanation),
            ParsedReply::Fallback { score, raw } => (score, raw),
        }
    }
}

/// Parse a model reply, falling back to a digit scan when it isn't the
/// expected JSON object.
pub fn parse_reply(raw: &str) -> ParsedReply {
    match parse_structured(raw) {
        Some((score, explanation)) => ParsedReply::Structured { score, explanation },
        None => ParsedReply::Fallback {
            score: first_score_digit(raw).unwrap_or(Score::NEUTRAL),
            raw: raw.trim().to_string(),
        },
    }
}

fn parse_structured(raw: &str) -> Option<(Score, String)> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let score = score_value(object.get("score")?)?;
    let explanation = object.get("explanation")?.as_str()?.to_string();
    Some((score, explanation))
}

/// Accept integers, floats (truncated) and numeric strings, clamped to 1..=5.
fn score_value(value: &Value) -> Option<Score> {
    let n = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(Score::clamped(n))
}

fn first_score_digit(raw: &str) -> Option<Score> {
    raw.chars()
        .find(|c| ('1'..='5').contains(c))
        .and_then(|c| c.to_digit(10))
        .and_then(|d| Score::new(d as u8))
}
