//! Session driver: connects a [`QuizSession`] to its collaborators.
//!
//! Engine commands stay synchronous. Explanation fetches are queued as
//! futures tagged with the session epoch and applied when they resolve;
//! anything resolved for a superseded epoch is dropped by the engine.

use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;

use crate::engine::{Phase, Position, QuizSession, Step, DEFAULT_BATCH_SIZE};
use crate::error::EngineError;
use crate::model::{Candidate, Question};
use crate::report::AssessmentReport;
use crate::traits::{
    ExplanationProvider, ExplanationRequest, ExplanationResponse, QuestionRequest,
    QuestionSource, RecommendationProvider, RecommendationRequest, EXPLANATION_UNAVAILABLE,
    NO_RECOMMENDATION,
};

/// The three collaborators a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub questions: Arc<dyn QuestionSource>,
    pub explanations: Arc<dyn ExplanationProvider>,
    pub recommendations: Arc<dyn RecommendationProvider>,
}

/// Per-session sizing.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub batch_size: usize,
    /// Questions requested from the source (0 lets the source decide).
    pub question_count: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            question_count: 0,
        }
    }
}

/// Fetch questions, degrading any failure to an empty list.
pub async fn fetch_questions_or_empty(
    source: &dyn QuestionSource,
    request: &QuestionRequest,
) -> Vec<Question> {
    match source.fetch_questions(request).await {
        Ok(questions) => {
            let total = questions.len();
            let usable: Vec<Question> = questions
                .into_iter()
                .filter(Question::is_well_formed)
                .collect();
            if usable.len() < total {
                tracing::warn!(
                    "{} dropped {} malformed question(s)",
                    source.name(),
                    total - usable.len()
                );
            }
            usable
        }
        Err(e) => {
            tracing::warn!("question source {} failed: {e:#}", source.name());
            Vec::new()
        }
    }
}

/// Fetch an explanation, degrading any failure to the placeholder.
pub async fn explain_or_default(
    provider: &dyn ExplanationProvider,
    request: &ExplanationRequest,
) -> ExplanationResponse {
    let text = match provider.explain(request).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => EXPLANATION_UNAVAILABLE.to_string(),
        Err(e) => {
            tracing::warn!(
                question = request.question_index,
                "explanation provider {} failed: {e:#}",
                provider.name()
            );
            EXPLANATION_UNAVAILABLE.to_string()
        }
    };
    ExplanationResponse {
        epoch: request.epoch,
        question_index: request.question_index,
        text,
    }
}

/// Fetch a recommendation, degrading any failure to the placeholder.
pub async fn recommend_or_default(
    provider: &dyn RecommendationProvider,
    request: &RecommendationRequest,
) -> String {
    match provider.recommend(request).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => NO_RECOMMENDATION.to_string(),
        Err(e) => {
            tracing::warn!("recommendation provider {} failed: {e:#}", provider.name());
            NO_RECOMMENDATION.to_string()
        }
    }
}

/// Drives one candidate through a session.
pub struct AssessmentDriver {
    session: QuizSession,
    collaborators: Collaborators,
    config: DriverConfig,
    candidate: Candidate,
    pending: FuturesUnordered<BoxFuture<'static, ExplanationResponse>>,
}

impl AssessmentDriver {
    pub fn new(collaborators: Collaborators, config: DriverConfig) -> Self {
        Self::with_session(QuizSession::new(), collaborators, config)
    }

    /// Use a pre-configured session (e.g. custom tier thresholds).
    pub fn with_session(
        session: QuizSession,
        collaborators: Collaborators,
        config: DriverConfig,
    ) -> Self {
        Self {
            session,
            collaborators,
            config,
            candidate: Candidate::default(),
            pending: FuturesUnordered::new(),
        }
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    /// Number of explanation fetches still in flight.
    pub fn pending_explanations(&self) -> usize {
        self.pending.len()
    }

    /// Load questions for `candidate` and start a session.
    ///
    /// A failed or empty fetch leaves the session in [`Phase::Empty`].
    pub async fn start(&mut self, candidate: Candidate) -> Result<Phase, EngineError> {
        self.pending = FuturesUnordered::new();
        let epoch = self.session.invalidate();
        let request = QuestionRequest {
            role: candidate.role.clone(),
            difficulty: candidate.difficulty,
            count: self.config.question_count,
        };
        self.candidate = candidate;
        tracing::info!(
            source = self.collaborators.questions.name(),
            role = %request.role,
            difficulty = %request.difficulty,
            "loading questions"
        );

        let questions =
            fetch_questions_or_empty(self.collaborators.questions.as_ref(), &request).await;
        debug_assert_eq!(epoch, self.session.epoch());

        self.session.start(questions, self.config.batch_size)?;
        if self.session.phase() == Phase::Empty {
            tracing::warn!("no questions available, nothing to assess");
        }
        Ok(self.session.phase())
    }

    /// Record an answer and queue its explanation fetch.
    pub fn select_answer(&mut self, option: usize) -> Result<(), EngineError> {
        let request = self.session.select_answer(option)?;
        let has_explanation = self
            .session
            .questions()
            .get(request.question_index)
            .is_some_and(|q| q.explanation.is_some());
        if has_explanation {
            return Ok(());
        }

        let provider = Arc::clone(&self.collaborators.explanations);
        self.pending
            .push(async move { explain_or_default(provider.as_ref(), &request).await }.boxed());
        Ok(())
    }

    pub fn advance(&mut self) -> Step {
        self.session.advance()
    }

    pub fn retreat(&mut self) -> Position {
        self.session.retreat()
    }

    pub fn skip(&mut self) -> Step {
        self.session.skip()
    }

    /// Wait for the next explanation and apply it.
    ///
    /// Returns `None` when nothing is in flight, otherwise whether the
    /// response was applied (stale responses are not).
    pub async fn next_explanation(&mut self) -> Option<bool> {
        let response = self.pending.next().await?;
        Some(self.session.apply_explanation(response))
    }

    /// Apply every explanation that has already resolved, without waiting.
    pub fn drain_explanations(&mut self) -> usize {
        let mut applied = 0;
        while let Some(Some(response)) = self.pending.next().now_or_never() {
            if self.session.apply_explanation(response) {
                applied += 1;
            }
        }
        applied
    }

    /// Abandon the session; late explanations will be discarded.
    pub fn restart(&mut self) {
        self.pending = FuturesUnordered::new();
        self.session.restart();
    }

    /// Score the session and ask for a recommendation.
    pub async fn finish(&mut self) -> AssessmentReport {
        self.drain_explanations();
        let results = self.session.compute_results();
        let request = RecommendationRequest {
            epoch: self.session.epoch(),
            correct: results.correct,
            total: results.total,
            score: results.score(),
            role: self.candidate.role.clone(),
            difficulty: self.candidate.difficulty,
        };
        let recommendation =
            recommend_or_default(self.collaborators.recommendations.as_ref(), &request).await;

        AssessmentReport {
            created_at: Utc::now(),
            candidate: self.candidate.clone(),
            results,
            recommendation,
        }
    }
}
