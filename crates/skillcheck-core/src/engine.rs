//! Quiz progression engine.
//!
//! A [`QuizSession`] walks a fixed question list in batches of `batch_size`,
//! records answers, and derives the score and answer review. Every command is
//! synchronous; collaborator fetches happen outside the engine and come back
//! as epoch-tagged responses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::{Answer, Question, NOT_MARKED, NO_EXPLANATION, SKIPPED};
use crate::report::{Outcome, QuizResults, ReviewEntry};
use crate::scoring::TierThresholds;
use crate::traits::{ExplanationRequest, ExplanationResponse};

/// Default number of questions per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Session token. Bumped on every start and restart so late responses
/// addressed to an older session can be recognised and dropped.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Epoch(u64);

impl Epoch {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Epoch(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Never started, or restarted.
    Idle,
    /// Started with zero questions: the "no quiz" state.
    Empty,
    /// A current question exists.
    Active,
    /// The forward walk is exhausted; results are due.
    Completed,
}

/// Where the session is pointing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub batch: usize,
    pub index: usize,
    pub global: usize,
}

/// Outcome of a forward move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to a new question.
    Moved(Position),
    /// That was the last question; the session is now complete.
    Completed,
    /// Nothing to move through (no questions, or already complete).
    Ignored,
}

/// State of one assessment, owned by the caller.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    batch_size: usize,
    current_batch: usize,
    index: usize,
    answers: Vec<Option<Answer>>,
    started: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
    session_id: Option<Uuid>,
    phase: Phase,
    epoch: Epoch,
    thresholds: TierThresholds,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            current_batch: 0,
            index: 0,
            answers: Vec::new(),
            started: None,
            started_at: None,
            session_id: None,
            phase: Phase::Idle,
            epoch: Epoch::default(),
            thresholds: TierThresholds::default(),
        }
    }

    /// Use custom tier thresholds for `compute_results`.
    pub fn with_thresholds(mut self, thresholds: TierThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Begin a new session over `questions`.
    ///
    /// An empty list is accepted and leaves the session in [`Phase::Empty`].
    pub fn start(&mut self, questions: Vec<Question>, batch_size: usize) -> Result<(), EngineError> {
        if batch_size == 0 {
            return Err(EngineError::InvalidBatchSize);
        }
        self.answers = vec![None; questions.len()];
        self.phase = if questions.is_empty() {
            Phase::Empty
        } else {
            Phase::Active
        };
        self.questions = questions;
        self.batch_size = batch_size;
        self.current_batch = 0;
        self.index = 0;
        self.started = Some(Instant::now());
        self.started_at = Some(Utc::now());
        self.session_id = Some(Uuid::new_v4());
        self.epoch = self.epoch.next();
        tracing::debug!(
            epoch = %self.epoch,
            questions = self.questions.len(),
            batch_size,
            "session started"
        );
        Ok(())
    }

    /// Drop all questions and answers; the next `start` begins a new epoch.
    pub fn restart(&mut self) {
        self.questions.clear();
        self.answers.clear();
        self.current_batch = 0;
        self.index = 0;
        self.started = None;
        self.started_at = None;
        self.session_id = None;
        self.phase = Phase::Idle;
        self.epoch = self.epoch.next();
        tracing::debug!(epoch = %self.epoch, "session restarted");
    }

    /// Mark the session as superseded without touching its contents.
    ///
    /// Used while a new question list is being fetched: responses from the
    /// previous epoch must not land after this point.
    pub fn invalidate(&mut self) -> Epoch {
        self.epoch = self.epoch.next();
        self.epoch
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Completed
    }

    /// Instant the session started, for elapsed-time display.
    pub fn started(&self) -> Option<Instant> {
        self.started
    }

    pub fn position(&self) -> Position {
        Position {
            batch: self.current_batch,
            index: self.index,
            global: self.global_index(),
        }
    }

    fn global_index(&self) -> usize {
        self.current_batch * self.batch_size + self.index
    }

    /// The question under the cursor, or `None` when there is none to show.
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase != Phase::Active {
            return None;
        }
        self.questions.get(self.global_index())
    }

    /// Recorded answer for a global index (`None` = not visited).
    pub fn answer(&self, global: usize) -> Option<Answer> {
        self.answers.get(global).copied().flatten()
    }

    pub fn answers(&self) -> &[Option<Answer>] {
        &self.answers
    }

    /// Fraction of the walk reached, counting the current question.
    pub fn progress(&self) -> f64 {
        match self.phase {
            Phase::Active => (self.global_index() + 1) as f64 / self.questions.len() as f64,
            Phase::Completed => 1.0,
            Phase::Idle | Phase::Empty => 0.0,
        }
    }

    /// Record `option` for the current question.
    ///
    /// Re-selecting overwrites. Returns the explanation request to hand to
    /// an [`ExplanationProvider`](crate::traits::ExplanationProvider).
    pub fn select_answer(&mut self, option: usize) -> Result<ExplanationRequest, EngineError> {
        let global = self.global_index();
        let question = self
            .current_question()
            .ok_or(EngineError::NoActiveQuestion)?;
        let Some(chosen) = question.option_text(option) else {
            return Err(EngineError::InvalidOption {
                question: global,
                option,
                available: question.options.len(),
            });
        };

        let request = ExplanationRequest {
            epoch: self.epoch,
            question_index: global,
            title: question.title.clone(),
            answer_text: question.correct_text().unwrap_or(chosen).to_string(),
        };

        self.answers[global] = Some(Answer::Selected(option));
        tracing::debug!(question = global, option, "answer recorded");
        Ok(request)
    }

    /// Move forward one question, crossing into the next batch when needed.
    pub fn advance(&mut self) -> Step {
        if self.phase != Phase::Active {
            return Step::Ignored;
        }
        let total = self.questions.len();
        let global = self.global_index();

        if self.index < self.batch_size - 1 && global < total - 1 {
            self.index += 1;
        } else if total.saturating_sub((self.current_batch + 1) * self.batch_size) > 0 {
            self.current_batch += 1;
            self.index = 0;
        } else {
            self.phase = Phase::Completed;
            tracing::debug!(epoch = %self.epoch, "forward walk exhausted");
            return Step::Completed;
        }
        Step::Moved(self.position())
    }

    /// Move back one question. Stays put on the first question.
    pub fn retreat(&mut self) -> Position {
        if self.phase == Phase::Active {
            if self.index > 0 {
                self.index -= 1;
            } else if self.current_batch > 0 {
                self.current_batch -= 1;
                self.index = self.batch_size - 1;
            }
        }
        self.position()
    }

    /// Mark the current question skipped, then advance.
    pub fn skip(&mut self) -> Step {
        if self.phase != Phase::Active {
            return Step::Ignored;
        }
        let global = self.global_index();
        self.answers[global] = Some(Answer::Skipped);
        self.advance()
    }

    /// Store an explanation if it belongs to this session.
    ///
    /// Returns `false` (and changes nothing) for stale epochs or unknown
    /// questions.
    pub fn apply_explanation(&mut self, response: ExplanationResponse) -> bool {
        if response.epoch != self.epoch {
            tracing::debug!(
                stale = %response.epoch,
                current = %self.epoch,
                "discarding stale explanation"
            );
            return false;
        }
        match self.questions.get_mut(response.question_index) {
            Some(question) => {
                question.explanation = Some(response.text);
                true
            }
            None => false,
        }
    }

    /// Time since `start`, zero if not started.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Score and review the session.
    ///
    /// Pure over questions and answers; only `elapsed_ms` moves between calls.
    pub fn compute_results(&self) -> QuizResults {
        let review: Vec<ReviewEntry> = self
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let chosen = self.answer(i).and_then(|a| a.selected());
                let outcome = match chosen {
                    None => Outcome::Skipped,
                    Some(c) if q.correct == Some(c) => Outcome::Correct,
                    Some(_) => Outcome::Incorrect,
                };
                ReviewEntry {
                    number: i + 1,
                    title: q.title.clone(),
                    your_answer: chosen
                        .and_then(|c| q.option_text(c))
                        .unwrap_or(SKIPPED)
                        .to_string(),
                    correct_answer: q.correct_text().unwrap_or(NOT_MARKED).to_string(),
                    explanation: q
                        .explanation
                        .clone()
                        .unwrap_or_else(|| NO_EXPLANATION.to_string()),
                    outcome,
                }
            })
            .collect();

        let correct = review
            .iter()
            .filter(|e| e.outcome == Outcome::Correct)
            .count();
        let total = self.questions.len();

        QuizResults {
            session_id: self.session_id,
            started_at: self.started_at,
            correct,
            total,
            elapsed_ms: self.elapsed().as_millis() as u64,
            tier: self.thresholds.tier_for(correct, total),
            review,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Tier;

    fn questions(correct: &[Option<usize>]) -> Vec<Question> {
        correct
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Question::new(
                    format!("Q{i}"),
                    vec!["a".into(), "b".into(), "c".into()],
                    *c,
                )
            })
            .collect()
    }

    fn started(n: usize, batch_size: usize) -> QuizSession {
        let mut s = QuizSession::new();
        s.start(questions(&vec![Some(0); n]), batch_size).unwrap();
        s
    }

    #[test]
    fn start_resets_pointers_and_answers() {
        let mut s = started(6, 5);
        s.select_answer(1).unwrap();
        s.advance();
        s.start(questions(&[Some(0), Some(1)]), 5).unwrap();
        assert_eq!(s.position(), Position { batch: 0, index: 0, global: 0 });
        assert_eq!(s.answers(), &[None, None]);
        assert_eq!(s.phase(), Phase::Active);
        assert!(s.session_id().is_some());
    }

    #[test]
    fn zero_batch_size_rejected() {
        let mut s = QuizSession::new();
        assert_eq!(
            s.start(questions(&[Some(0)]), 0),
            Err(EngineError::InvalidBatchSize)
        );
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn six_questions_batch_of_five() {
        let mut s = started(6, 5);
        for expected in 1..5 {
            assert_eq!(
                s.advance(),
                Step::Moved(Position { batch: 0, index: expected, global: expected })
            );
        }
        assert_eq!(
            s.advance(),
            Step::Moved(Position { batch: 1, index: 0, global: 5 })
        );
        assert_eq!(s.advance(), Step::Completed);
        assert!(s.is_complete());
        assert_eq!(s.advance(), Step::Ignored);
        assert!(s.current_question().is_none());
    }

    #[test]
    fn retreat_crosses_batches_and_stops_at_start() {
        let mut s = started(7, 3);
        for _ in 0..3 {
            s.advance();
        }
        assert_eq!(s.position(), Position { batch: 1, index: 0, global: 3 });
        assert_eq!(s.retreat(), Position { batch: 0, index: 2, global: 2 });
        s.retreat();
        s.retreat();
        assert_eq!(s.retreat(), Position { batch: 0, index: 0, global: 0 });
    }

    #[test]
    fn select_answer_rejects_out_of_range() {
        let mut s = started(2, 5);
        let err = s.select_answer(3).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidOption { question: 0, option: 3, available: 3 }
        );
        assert_eq!(s.answer(0), None);
    }

    #[test]
    fn select_answer_overwrites_and_survives_navigation() {
        let mut s = started(3, 5);
        s.select_answer(0).unwrap();
        s.select_answer(0).unwrap();
        assert_eq!(s.answer(0), Some(Answer::Selected(0)));
        s.select_answer(2).unwrap();
        s.advance();
        s.retreat();
        assert_eq!(s.answer(0), Some(Answer::Selected(2)));
        s.advance();
        assert_eq!(s.answer(0), Some(Answer::Selected(2)));
    }

    #[test]
    fn select_answer_request_targets_correct_text() {
        let mut s = QuizSession::new();
        s.start(questions(&[Some(1), None]), 5).unwrap();
        let req = s.select_answer(2).unwrap();
        assert_eq!(req.question_index, 0);
        assert_eq!(req.answer_text, "b");
        assert_eq!(req.epoch, s.epoch());

        s.advance();
        let req = s.select_answer(2).unwrap();
        assert_eq!(req.answer_text, "c");
    }

    #[test]
    fn skip_marks_and_advances() {
        let mut s = started(2, 5);
        assert_eq!(
            s.skip(),
            Step::Moved(Position { batch: 0, index: 1, global: 1 })
        );
        assert_eq!(s.answer(0), Some(Answer::Skipped));
        assert_eq!(s.skip(), Step::Completed);
    }

    #[test]
    fn commands_are_noops_without_questions() {
        let mut s = QuizSession::new();
        assert!(s.current_question().is_none());
        assert_eq!(s.advance(), Step::Ignored);
        assert_eq!(s.skip(), Step::Ignored);
        assert_eq!(s.retreat(), Position { batch: 0, index: 0, global: 0 });
        assert_eq!(s.select_answer(0), Err(EngineError::NoActiveQuestion));

        s.start(Vec::new(), 5).unwrap();
        assert_eq!(s.phase(), Phase::Empty);
        assert!(s.current_question().is_none());
        assert_eq!(s.advance(), Step::Ignored);
    }

    #[test]
    fn scenario_four_correct() {
        let mut s = QuizSession::new();
        s.start(
            questions(&[Some(0), Some(1), Some(1), Some(0), Some(0), Some(2)]),
            5,
        )
        .unwrap();
        for choice in [Some(0), Some(1), Some(2), None, Some(0), Some(2)] {
            match choice {
                Some(c) => {
                    s.select_answer(c).unwrap();
                    s.advance();
                }
                None => {
                    s.skip();
                }
            }
        }
        assert!(s.is_complete());
        let results = s.compute_results();
        assert_eq!(results.correct, 4);
        assert_eq!(results.total, 6);
        assert_eq!(results.tier, Some(Tier::Solid));
        assert_eq!(results.review[2].outcome, Outcome::Incorrect);
        assert_eq!(results.review[3].your_answer, "Skipped");
        assert_eq!(results.review[3].outcome, Outcome::Skipped);
    }

    #[test]
    fn review_placeholders() {
        let mut s = QuizSession::new();
        s.start(questions(&[None, Some(1)]), 5).unwrap();
        let results = s.compute_results();
        assert_eq!(results.review[0].correct_answer, "(not marked)");
        assert_eq!(results.review[0].your_answer, "Skipped");
        assert_eq!(results.review[0].explanation, "Not provided");
        assert_eq!(results.review[1].correct_answer, "b");
    }

    #[test]
    fn results_are_stable_across_calls() {
        let mut s = started(3, 2);
        s.select_answer(0).unwrap();
        let first = s.compute_results();
        let second = s.compute_results();
        assert_eq!(first.review, second.review);
        assert_eq!(first.correct, second.correct);
        assert!(second.elapsed_ms >= first.elapsed_ms);
    }

    #[test]
    fn empty_session_results() {
        let mut s = QuizSession::new();
        s.start(Vec::new(), 5).unwrap();
        let results = s.compute_results();
        assert_eq!((results.correct, results.total), (0, 0));
        assert_eq!(results.tier, None);
        assert_eq!(results.score(), 0.0);
    }

    #[test]
    fn explanation_applied_only_for_current_epoch() {
        let mut s = started(2, 5);
        let req = s.select_answer(0).unwrap();
        let response = ExplanationResponse {
            epoch: req.epoch,
            question_index: req.question_index,
            text: "Because.".into(),
        };

        assert!(s.clone().apply_explanation(response.clone()));

        s.restart();
        s.start(questions(&[Some(0), Some(0)]), 5).unwrap();
        assert!(!s.apply_explanation(response));
        assert!(s.questions()[0].explanation.is_none());
    }

    #[test]
    fn restart_clears_everything() {
        let mut s = started(4, 2);
        s.select_answer(1).unwrap();
        s.advance();
        s.advance();
        let before = s.epoch();
        s.restart();
        assert!(s.is_empty());
        assert!(s.answers().is_empty());
        assert_eq!(s.position(), Position { batch: 0, index: 0, global: 0 });
        assert!(s.started().is_none());
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.epoch() > before);
        assert_eq!(s.elapsed(), std::time::Duration::ZERO);
    }

    #[test]
    fn progress_fraction() {
        let mut s = started(4, 2);
        assert_eq!(s.progress(), 0.25);
        s.advance();
        s.advance();
        assert_eq!(s.progress(), 0.75);
        s.advance();
        s.advance();
        assert_eq!(s.progress(), 1.0);
    }
}
