//! Core data model types for skillcheck.
//!
//! These are the fundamental types the whole system uses to represent
//! questions, recorded answers, and the candidate taking the assessment.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder shown when a question carries no explanation.
pub const NO_EXPLANATION: &str = "Not provided";
/// Answer text for a skipped or unvisited question.
pub const SKIPPED: &str = "Skipped";
/// Correct-answer text when the question has no valid `correct` index.
pub const NOT_MARKED: &str = "(not marked)";

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// The question text.
    pub title: String,
    /// Answer options, in display order.
    pub options: Vec<String>,
    /// Index of the correct option. Absent or negative means "not marked".
    #[serde(default, deserialize_with = "lenient_index")]
    pub correct: Option<usize>,
    /// Explanation text, possibly filled in after the user answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    pub fn new(title: impl Into<String>, options: Vec<String>, correct: Option<usize>) -> Self {
        Self {
            title: title.into(),
            options,
            correct,
            explanation: None,
        }
    }

    /// Text of the correct option, if the question marks one that exists.
    pub fn correct_text(&self) -> Option<&str> {
        self.correct
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }

    /// Text of the option at `index`.
    pub fn option_text(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    /// Whether this question can be shown at all (a title and two options).
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty() && self.options.len() >= 2
    }
}

/// Accepts a missing, null, negative or non-negative integer index.
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<i64> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|v| usize::try_from(v).ok()))
}

/// What the user did with a question they reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "option", rename_all = "lowercase")]
pub enum Answer {
    /// An option was chosen.
    Selected(usize),
    /// The question was explicitly skipped.
    Skipped,
}

impl Answer {
    pub fn selected(&self) -> Option<usize> {
        match self {
            Answer::Selected(i) => Some(*i),
            Answer::Skipped => None,
        }
    }
}

/// Assessment difficulty requested from the question source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "easy" => Ok(Difficulty::Beginner),
            "intermediate" | "medium" => Ok(Difficulty::Intermediate),
            "advanced" | "hard" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

pub const DEFAULT_NAME: &str = "Candidate";
pub const DEFAULT_ROLE: &str = "Data Scientist";

/// The person taking the assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Candidate {
    /// Build a candidate, substituting defaults for blank fields.
    pub fn new(name: &str, email: &str, role: &str, difficulty: Difficulty) -> Self {
        let or_default = |value: &str, default: &str| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        };
        Self {
            name: or_default(name, DEFAULT_NAME),
            email: email.trim().to_string(),
            role: or_default(role, DEFAULT_ROLE),
            difficulty,
        }
    }
}

impl Default for Candidate {
    fn default() -> Self {
        Self::new("", "", "", Difficulty::default())
    }
}
