//! The assessment state machine.
//!
//! One [`AssessmentEngine`] drives one session: it walks the question list,
//! scores answers into a per-category aggregate, supports stepping back
//! (undoing the previous answer exactly), and finalizes into an
//! [`AssessmentResult`] that is written to the injected store.
//!
//! Choosing an option locks the engine while the answer reveal is shown and
//! hands the caller a [`PendingAdvance`]. The caller waits out its delay and
//! returns the ticket through [`AssessmentEngine::run_scheduled`]. Stepping
//! back or re-initializing invalidates the ticket, so a late timer can never
//! advance a rewound session.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::EngineError;
use crate::model::{Aggregate, AnswerRecord, Question};
use crate::scoring::{points_for_choice, AssessmentResult};
use crate::store::{keys, write_soft, KeyValueStore};

/// Configuration for the assessment engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long the answer reveal shows before auto-advancing.
    pub advance_delay: Duration,
    /// Completion points recorded for the session at finalize.
    pub completed_points: u32,
    /// Streak points recorded for the session at finalize.
    pub streak_points: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            advance_delay: Duration::from_millis(720),
            completed_points: 100,
            streak_points: 7,
        }
    }
}

/// What the UI shows right after a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    pub chosen_index: usize,
    /// The correct option, when the question is gradable.
    pub correct_index: Option<usize>,
    /// `None` for questions that are not gradable.
    pub is_correct: Option<bool>,
}

/// Identifies one scheduled auto-advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdvanceTicket(u64);

/// An auto-advance the caller should run after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdvance {
    pub ticket: AdvanceTicket,
    pub delay: Duration,
}

/// Outcome of a successful engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A choice was recorded and is being revealed until `pending` runs.
    Revealing {
        reveal: Reveal,
        pending: PendingAdvance,
    },
    /// The question at `position` is now showing, unanswered.
    Showing { position: usize },
    /// The last question was answered and the session is finalized.
    Completed(AssessmentResult),
    /// Back was pressed on the first question; leave the session.
    Exit,
}

/// Coarse session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The question source returned nothing.
    Empty,
    InProgress,
    Complete,
}

/// Drives a single assessment session.
pub struct AssessmentEngine {
    store: Arc<dyn KeyValueStore>,
    config: EngineConfig,
    session_id: Uuid,
    questions: Vec<Question>,
    position: usize,
    answer_log: Vec<AnswerRecord>,
    aggregate: Aggregate,
    locked: bool,
    pending_reveal: Option<Reveal>,
    pending_advance: Option<AdvanceTicket>,
    next_ticket: u64,
    draft: String,
    result: Option<AssessmentResult>,
}

impl AssessmentEngine {
    /// Create an engine with no questions. Nothing is written to the store
    /// until [`initialize`](Self::initialize).
    pub fn new(store: Arc<dyn KeyValueStore>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            session_id: Uuid::nil(),
            questions: Vec::new(),
            position: 0,
            answer_log: Vec::new(),
            aggregate: Aggregate::seeded(),
            locked: false,
            pending_reveal: None,
            pending_advance: None,
            next_ticket: 0,
            draft: String::new(),
            result: None,
        }
    }

    /// Create an engine and start a session over `questions`.
    pub fn start(
        store: Arc<dyn KeyValueStore>,
        config: EngineConfig,
        questions: Vec<Question>,
    ) -> Self {
        let mut engine = Self::new(store, config);
        engine.initialize(questions);
        engine
    }

    /// Start a fresh session, discarding any previous progress.
    ///
    /// An empty question list is a valid, terminal session.
    pub fn initialize(&mut self, questions: Vec<Question>) -> SessionState {
        self.session_id = Uuid::new_v4();
        self.aggregate = Aggregate::seeded_for(&questions);
        self.questions = questions;
        self.position = 0;
        self.answer_log.clear();
        self.locked = false;
        self.pending_reveal = None;
        self.pending_advance = None;
        self.draft.clear();
        self.result = None;
        self.persist_answers();

        tracing::info!(
            "session {} started with {} question(s)",
            self.session_id,
            self.questions.len()
        );
        self.state()
    }

    /// Answer the current choice question with option `index`.
    pub fn select_choice(&mut self, index: usize) -> Result<Step, EngineError> {
        self.ensure_open()?;
        if self.locked {
            return Err(EngineError::Locked);
        }
        let question = self.current_question().ok_or(EngineError::NoCurrentQuestion)?;
        if question.is_free_text() {
            return Err(EngineError::WrongQuestionKind {
                question_id: question.id,
                expected: "choice",
            });
        }
        let options = question.options();
        if index >= options.len() {
            return Err(EngineError::AnswerOutOfRange {
                index,
                len: options.len(),
            });
        }

        let points = points_for_choice(options.len(), index);
        let correct_index = question.correct_option();
        let is_correct = correct_index.map(|c| c == index);
        let record = AnswerRecord {
            question_id: question.id,
            category: question.category.clone(),
            points,
            answer: Some(options[index].clone()),
            gradable: correct_index.is_some(),
            is_correct,
        };
        tracing::debug!(
            "question {} answered with option {index} for {points} point(s)",
            record.question_id
        );
        self.record(record);

        let reveal = Reveal {
            chosen_index: index,
            correct_index,
            is_correct,
        };
        let ticket = AdvanceTicket(self.next_ticket);
        self.next_ticket += 1;
        self.locked = true;
        self.pending_reveal = Some(reveal);
        self.pending_advance = Some(ticket);

        Ok(Step::Revealing {
            reveal,
            pending: PendingAdvance {
                ticket,
                delay: self.config.advance_delay,
            },
        })
    }

    /// Answer the current free-text question and move on immediately.
    pub fn submit_free_text(&mut self, text: &str) -> Result<Step, EngineError> {
        self.ensure_open()?;
        if self.locked {
            return Err(EngineError::Locked);
        }
        let question = self.current_question().ok_or(EngineError::NoCurrentQuestion)?;
        if !question.is_free_text() {
            return Err(EngineError::WrongQuestionKind {
                question_id: question.id,
                expected: "free-text",
            });
        }

        let answer = if text.trim().is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        let record = AnswerRecord {
            question_id: question.id,
            category: question.category.clone(),
            points: 0,
            answer,
            gradable: false,
            is_correct: None,
        };
        tracing::debug!("question {} answered with free text", record.question_id);
        self.record(record);

        self.advance()
    }

    /// Submit whatever is in the draft buffer.
    pub fn submit_draft(&mut self) -> Result<Step, EngineError> {
        let text = std::mem::take(&mut self.draft);
        let outcome = self.submit_free_text(&text);
        if outcome.is_err() {
            self.draft = text;
        }
        outcome
    }

    /// Move past the answered current question, finalizing after the last.
    pub fn advance(&mut self) -> Result<Step, EngineError> {
        self.ensure_open()?;
        let question = self.current_question().ok_or(EngineError::NoCurrentQuestion)?;
        if self.answer_log.len() <= self.position {
            return Err(EngineError::Unanswered {
                question_id: question.id,
            });
        }

        self.pending_advance = None;
        self.pending_reveal = None;
        self.locked = false;
        self.draft.clear();

        if self.position + 1 < self.questions.len() {
            self.position += 1;
            tracing::debug!("advanced to position {}", self.position);
            Ok(Step::Showing {
                position: self.position,
            })
        } else {
            Ok(Step::Completed(self.finalize()))
        }
    }

    /// Step back one question, undoing its answer.
    ///
    /// While a reveal is showing this undoes the answer just given and stays
    /// on the same question. On the first unanswered question it asks the
    /// caller to leave the session.
    pub fn retreat(&mut self) -> Result<Step, EngineError> {
        self.ensure_open()?;

        if self.locked {
            self.pending_advance = None;
            self.pending_reveal = None;
            self.locked = false;
            self.undo_last();
            tracing::debug!("reveal cancelled at position {}", self.position);
            return Ok(Step::Showing {
                position: self.position,
            });
        }

        if self.position == 0 {
            return Ok(Step::Exit);
        }

        self.undo_last();
        self.position -= 1;
        self.pending_reveal = None;
        self.pending_advance = None;
        self.draft.clear();
        tracing::debug!("retreated to position {}", self.position);
        Ok(Step::Showing {
            position: self.position,
        })
    }

    /// Score the session from its answer log and persist the outcome.
    ///
    /// The aggregate is rebuilt from the log rather than trusted from the
    /// running totals. Calling this again yields the same result.
    pub fn finalize(&mut self) -> AssessmentResult {
        let aggregate = Aggregate::from_records(
            Aggregate::seeded_for(&self.questions),
            &self.answer_log,
        );
        let result = AssessmentResult::compute(&self.questions, &aggregate, &self.answer_log);
        self.aggregate = aggregate;
        self.locked = false;
        self.pending_reveal = None;
        self.pending_advance = None;

        self.persist_result(&result);
        tracing::info!(
            "session {} complete: score {} ({}), knowledge check {}/{}",
            self.session_id,
            result.scaled_score,
            result.tier,
            result.kc_correct,
            result.kc_total
        );

        self.result = Some(result.clone());
        result
    }

    /// Run a scheduled auto-advance.
    ///
    /// Returns `Ok(None)` when the ticket was cancelled or superseded.
    pub fn run_scheduled(&mut self, ticket: AdvanceTicket) -> Result<Option<Step>, EngineError> {
        if self.pending_advance != Some(ticket) {
            tracing::debug!("ignoring stale advance ticket {ticket:?}");
            return Ok(None);
        }
        self.pending_advance = None;
        self.advance().map(Some)
    }

    /// Wait out `pending.delay`, then run it.
    ///
    /// Dropping the returned future before it resolves leaves the ticket
    /// pending; use [`cancel_pending`](Self::cancel_pending) to drop it.
    pub async fn wait_pending(
        &mut self,
        pending: PendingAdvance,
    ) -> Result<Option<Step>, EngineError> {
        tokio::time::sleep(pending.delay).await;
        self.run_scheduled(pending.ticket)
    }

    /// Drop the scheduled auto-advance, if any. The reveal stays showing.
    pub fn cancel_pending(&mut self) -> bool {
        self.pending_advance.take().is_some()
    }

    pub fn state(&self) -> SessionState {
        if self.questions.is_empty() {
            SessionState::Empty
        } else if self.result.is_some() {
            SessionState::Complete
        } else {
            SessionState::InProgress
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.position)
    }

    pub fn answer_log(&self) -> &[AnswerRecord] {
        &self.answer_log
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn pending_reveal(&self) -> Option<Reveal> {
        self.pending_reveal
    }

    pub fn pending_advance(&self) -> Option<AdvanceTicket> {
        self.pending_advance
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Share of the sequence reached, counting the current question.
    pub fn progress_percent(&self) -> u8 {
        let total = self.questions.len();
        if total == 0 {
            return 0;
        }
        let pct = ((self.position + 1).min(total) * 100) / total;
        u8::try_from(pct).unwrap_or(100)
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.result.is_some() {
            Err(EngineError::SessionComplete)
        } else {
            Ok(())
        }
    }

    fn record(&mut self, record: AnswerRecord) {
        self.aggregate.add(&record.category, record.points);
        self.answer_log.push(record);
        self.persist_answers();
    }

    fn undo_last(&mut self) {
        if let Some(last) = self.answer_log.pop() {
            self.aggregate.subtract(&last.category, last.points);
            self.persist_answers();
        }
    }

    fn persist_answers(&self) {
        match serde_json::to_string(&self.answer_log) {
            Ok(json) => {
                write_soft(self.store.as_ref(), keys::ANSWERS, &json);
            }
            Err(e) => tracing::warn!("failed to encode answer log: {e}"),
        }
    }

    fn persist_result(&self, result: &AssessmentResult) {
        let store = self.store.as_ref();
        self.persist_answers();
        match serde_json::to_string(&self.aggregate) {
            Ok(json) => {
                write_soft(store, keys::AGGREGATE, &json);
            }
            Err(e) => tracing::warn!("failed to encode aggregate: {e}"),
        }

        let plan = serde_json::json!({
            "discover": "completed",
            "train": "completed",
            "execute": "completed",
        });
        let scalars = [
            (keys::SESSION_COMPLETE, "true".to_string()),
            (keys::LEVEL, result.tier.to_string()),
            (keys::FINAL_SCORE, result.scaled_score.to_string()),
            (keys::KC_TOTAL, result.kc_total.to_string()),
            (keys::KC_CORRECT, result.kc_correct.to_string()),
            (keys::KC_ALL_CORRECT, result.all_correct.to_string()),
            (keys::KC_BONUS, result.bonus.to_string()),
            (keys::COMPLETED_POINTS, self.config.completed_points.to_string()),
            (keys::STREAK_POINTS, self.config.streak_points.to_string()),
            (keys::PLAN_PROGRESS, plan.to_string()),
            (keys::COMPLETED_AT, chrono::Utc::now().to_rfc3339()),
            (keys::SESSION_ID, self.session_id.to_string()),
        ];
        for (key, value) in &scalars {
            write_soft(store, key, value);
        }
    }
}
