//! Result and report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::format_elapsed;
use crate::model::Candidate;
use crate::scoring::{self, Tier};

/// How a single question ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
    /// Skipped explicitly or never answered.
    Skipped,
}

/// One line of the answer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    /// 1-based question number.
    pub number: usize,
    pub title: String,
    /// Chosen option text, or "Skipped".
    pub your_answer: String,
    /// Correct option text, or "(not marked)".
    pub correct_answer: String,
    /// Explanation text, or a placeholder.
    pub explanation: String,
    pub outcome: Outcome,
}

/// Output of `QuizSession::compute_results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResults {
    /// Session this result was computed from (absent for never-started sessions).
    pub session_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub correct: usize,
    pub total: usize,
    /// Wall-clock time since start, in milliseconds.
    pub elapsed_ms: u64,
    /// Local threshold tier; `None` for zero-question sessions.
    pub tier: Option<Tier>,
    pub review: Vec<ReviewEntry>,
}

impl QuizResults {
    /// `correct / total`, or 0.0 for an empty session.
    pub fn score(&self) -> f64 {
        scoring::score(self.correct, self.total).unwrap_or(0.0)
    }

    pub fn skipped(&self) -> usize {
        self.review
            .iter()
            .filter(|e| e.outcome == Outcome::Skipped)
            .count()
    }

    /// "Score: 4 / 6"
    pub fn score_line(&self) -> String {
        format!("Score: {} / {}", self.correct, self.total)
    }

    /// "Time: 01:05"
    pub fn time_line(&self) -> String {
        format!("Time: {}", format_elapsed(self.elapsed_ms))
    }
}

/// A finished assessment: who took it, what they scored, what was recommended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub created_at: DateTime<Utc>,
    pub candidate: Candidate,
    pub results: QuizResults,
    pub recommendation: String,
}

impl AssessmentReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AssessmentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
