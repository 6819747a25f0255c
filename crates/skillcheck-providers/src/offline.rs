//! Offline collaborators: a static question bank and a fixed explainer.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use skillcheck_core::model::Question;
use skillcheck_core::parser::{parse_question_bank, parse_question_bank_str, QuestionBank};
use skillcheck_core::traits::{
    ExplanationProvider, ExplanationRequest, QuestionRequest, QuestionSource,
};

const BUNDLED_BANK: &str = include_str!("../data/ai-fundamentals.toml");

/// Explanation text used when no remote backend is configured.
pub const OFFLINE_EXPLANATION: &str = "Explanation not available in offline mode.";

/// Serves questions from a question bank loaded up front.
#[derive(Debug, Clone)]
pub struct StaticQuestionSource {
    bank: QuestionBank,
}

impl StaticQuestionSource {
    pub fn new(bank: QuestionBank) -> Self {
        Self { bank }
    }

    /// The bank compiled into the binary.
    pub fn bundled() -> Result<Self> {
        let bank = parse_question_bank_str(BUNDLED_BANK, Path::new("ai-fundamentals.toml"))?;
        Ok(Self::new(bank))
    }

    /// Load a TOML or JSON bank from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(parse_question_bank(path)?))
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    fn name(&self) -> &str {
        "offline"
    }

    async fn fetch_questions(&self, request: &QuestionRequest) -> Result<Vec<Question>> {
        if let Some(role) = &self.bank.role {
            if !role.eq_ignore_ascii_case(&request.role) {
                tracing::debug!(
                    bank_role = %role,
                    requested = %request.role,
                    "bank targets a different role, serving it anyway"
                );
            }
        }
        let take = match request.count {
            0 => self.bank.questions.len(),
            n => n,
        };
        Ok(self.bank.questions.iter().take(take).cloned().collect())
    }
}

/// Answers every explanation request with the offline placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineExplainer;

#[async_trait]
impl ExplanationProvider for OfflineExplainer {
    fn name(&self) -> &str {
        "offline"
    }

    async fn explain(&self, _request: &ExplanationRequest) -> Result<String> {
        Ok(OFFLINE_EXPLANATION.to_string())
    }
}
