//! Collaborator trait definitions.
//!
//! The engine depends on three seams: a question source, an explanation
//! provider and a recommendation provider. They are implemented by the
//! `skillcheck-providers` crate (bundled offline bank, remote generator).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::Epoch;
use crate::model::{Difficulty, Question};

/// Shown when no explanation could be fetched.
pub const EXPLANATION_UNAVAILABLE: &str = "Explanation not available";
/// Shown when no recommendation could be fetched.
pub const NO_RECOMMENDATION: &str = "No recommendation";

// ---------------------------------------------------------------------------
// Question source
// ---------------------------------------------------------------------------

/// Supplies the ordered question list for a session.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Human-readable source name (e.g. "offline").
    fn name(&self) -> &str;

    /// Fetch questions for a role and difficulty.
    async fn fetch_questions(&self, request: &QuestionRequest) -> anyhow::Result<Vec<Question>>;
}

/// Request for a fresh question list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub role: String,
    pub difficulty: Difficulty,
    /// Number of questions wanted. Zero lets the source decide.
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Explanation provider
// ---------------------------------------------------------------------------

/// Explains an answer after the user picks it.
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn explain(&self, request: &ExplanationRequest) -> anyhow::Result<String>;
}

/// Explanation request emitted by `select_answer`, tagged with the session epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub epoch: Epoch,
    /// Global index of the question being explained.
    pub question_index: usize,
    pub title: String,
    /// Correct answer text when marked, otherwise the chosen option.
    pub answer_text: String,
}

/// Explanation text for the question an [`ExplanationRequest`] targeted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub epoch: Epoch,
    pub question_index: usize,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Recommendation provider
// ---------------------------------------------------------------------------

/// Produces the final career recommendation from a score.
#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn recommend(&self, request: &RecommendationRequest) -> anyhow::Result<String>;
}

/// Recommendation request built from computed results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub epoch: Epoch,
    pub correct: usize,
    pub total: usize,
    /// `correct / total`, or 0.0 for an empty session.
    pub score: f64,
    pub role: String,
    pub difficulty: Difficulty,
}

// ---------------------------------------------------------------------------
// Generated-text JSON extraction
// ---------------------------------------------------------------------------

/// Pull a JSON array out of free-form generated text.
///
/// Handles:
/// - ```json``` or bare ``` fenced blocks whose body is an array
/// - Text that echoes the prompt before the array (outermost `[` ... `]`)
///
/// Returns `None` if nothing array-shaped is present.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(after.len());
        let lang = after[..body_start].trim().to_lowercase();
        let body = &after[body_start..];
        let Some(close) = body.find("```") else {
            break;
        };
        let block = body[..close].trim();
        if (lang.is_empty() || lang == "json") && block.starts_with('[') && block.ends_with(']')
        {
            return Some(block);
        }
        rest = &body[close + 3..];
    }

    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse generated text into questions, dropping anything malformed.
///
/// Never fails: unparseable text yields an empty list.
pub fn parse_generated_questions(text: &str) -> Vec<Question> {
    let Some(array) = extract_json_array(text) else {
        return Vec::new();
    };
    let values = match serde_json::from_str::<Vec<serde_json::Value>>(array) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!("generated questions are not valid JSON: {e}");
            return Vec::new();
        }
    };
    values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value::<Question>(value) {
            Ok(question) => Some(question),
            Err(e) => {
                tracing::warn!(index = i, "dropping malformed generated question: {e}");
                None
            }
        })
        .filter(Question::is_well_formed)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_fenced_json_block() {
        let input = "Here you go:\n```json\n[{\"title\":\"q\"}]\n```\nDone.";
        assert_eq!(extract_json_array(input), Some("[{\"title\":\"q\"}]"));
    }

    #[test]
    fn extract_skips_non_array_blocks() {
        let input = "```python\nprint([1])\n```\n```\n[1, 2]\n```";
        assert_eq!(extract_json_array(input), Some("[1, 2]"));
    }

    #[test]
    fn extract_after_echoed_prompt() {
        let input = "Return ONLY a JSON array of questions:\n[{\"title\":\"a\"}]";
        assert_eq!(extract_json_array(input), Some("[{\"title\":\"a\"}]"));
    }

    #[test]
    fn extract_nothing() {
        assert_eq!(extract_json_array("no arrays here"), None);
        assert_eq!(extract_json_array("] backwards ["), None);
    }

    #[test]
    fn parse_generated_drops_malformed_questions() {
        let text = r#"[
            {"title": "Good", "options": ["a", "b", "c"], "correct": 2},
            {"title": "One option", "options": ["a"], "correct": 0}
        ]"#;
        let questions = parse_generated_questions(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].title, "Good");
        assert_eq!(questions[0].correct, Some(2));
    }

    #[test]
    fn parse_generated_keeps_good_records_beside_bad_ones() {
        let text = r#"[
            {"title": "Good", "options": ["a", "b"], "correct": 1},
            {"title": "String index", "options": ["a", "b"], "correct": "0"},
            {"title": "No options", "correct": 0},
            {"title": "Also good", "options": ["x", "y", "z"], "correct": 0}
        ]"#;
        let questions = parse_generated_questions(text);
        let titles: Vec<&str> = questions.iter().map(|q| q.title.as_str()).collect();
        assert_eq!(titles, vec!["Good", "Also good"]);
        assert_eq!(questions[0].correct, Some(1));
    }

    #[test]
    fn parse_generated_garbage_is_empty() {
        assert!(parse_generated_questions("I cannot help with that.").is_empty());
        assert!(parse_generated_questions("[not json]").is_empty());
    }
}
