//! Mock provider for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use skillcheck_core::model::Question;
use skillcheck_core::traits::{
    ExplanationProvider, ExplanationRequest, QuestionRequest, QuestionSource,
    RecommendationProvider, RecommendationRequest,
};

/// A mock collaborator for exercising sessions without a real backend.
///
/// Serves a fixed question list, echoes explanations, and returns a fixed
/// recommendation. Any of the three can be switched to fail.
pub struct MockProvider {
    questions: Vec<Question>,
    recommendation: String,
    delay: Option<Duration>,
    fail_questions: bool,
    fail_explanations: bool,
    fail_recommendations: bool,
    /// Number of calls made across all three roles.
    call_count: AtomicU32,
    /// Last question request received.
    last_request: Mutex<Option<QuestionRequest>>,
}

impl MockProvider {
    /// Create a mock that serves `questions`.
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            recommendation: "Mock recommendation".to_string(),
            delay: None,
            fail_questions: false,
            fail_explanations: false,
            fail_recommendations: false,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A mock whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail_questions: true,
            fail_explanations: true,
            fail_recommendations: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn with_recommendation(mut self, text: &str) -> Self {
        self.recommendation = text.to_string();
        self
    }

    /// Sleep before every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_failing_explanations(mut self) -> Self {
        self.fail_explanations = true;
        self
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last question request made to this provider.
    pub fn last_request(&self) -> Option<QuestionRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn enter(&self) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl QuestionSource for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_questions(&self, request: &QuestionRequest) -> anyhow::Result<Vec<Question>> {
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());
        self.enter().await;
        if self.fail_questions {
            anyhow::bail!("mock question source failure");
        }
        let take = match request.count {
            0 => self.questions.len(),
            n => n,
        };
        Ok(self.questions.iter().take(take).cloned().collect())
    }
}

#[async_trait]
impl ExplanationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn explain(&self, request: &ExplanationRequest) -> anyhow::Result<String> {
        self.enter().await;
        if self.fail_explanations {
            anyhow::bail!("mock explanation failure");
        }
        Ok(format!("\"{}\" answers \"{}\"", request.answer_text, request.title))
    }
}

#[async_trait]
impl RecommendationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn recommend(&self, _request: &RecommendationRequest) -> anyhow::Result<String> {
        self.enter().await;
        if self.fail_recommendations {
            anyhow::bail!("mock recommendation failure");
        }
        Ok(self.recommendation.clone())
    }
}
