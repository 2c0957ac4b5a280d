//! Engine and store error types.
//!
//! `EngineError` values are programmer errors: the UI is expected to offer
//! only valid actions, so every variant means the call was rejected and the
//! engine state is exactly what it was before the call.

use thiserror::Error;

/// A rejected engine operation. The engine state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A reveal is showing and the auto-advance has not fired yet.
    #[error("engine is locked while the answer reveal is showing")]
    Locked,

    /// There is no question at the current position (empty question list).
    #[error("no current question")]
    NoCurrentQuestion,

    /// The chosen option index is outside the current question's options.
    #[error("answer index {index} out of range for {len} option(s)")]
    AnswerOutOfRange { index: usize, len: usize },

    /// The operation does not apply to the current question's kind.
    #[error("question {question_id} is not a {expected} question")]
    WrongQuestionKind {
        question_id: u32,
        expected: &'static str,
    },

    /// `advance` was called before the current question was answered.
    #[error("question {question_id} has not been answered yet")]
    Unanswered { question_id: u32 },

    /// The session already finalized; only `initialize` is accepted.
    #[error("session already complete")]
    SessionComplete,
}

/// Errors raised by a key-value store backend.
///
/// The engine never propagates these; it logs and carries on.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing medium could not be read or written.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded or decoded.
    #[error("store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store is unavailable (poisoned lock, quota, disabled backend).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Returns `true` if retrying the same call later may succeed.
    ///
    /// A locked engine unlocks once its pending advance fires; every other
    /// rejection needs a different call.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_locked_is_transient() {
        assert!(EngineError::Locked.is_transient());
        assert!(!EngineError::SessionComplete.is_transient());
        assert!(!EngineError::AnswerOutOfRange { index: 3, len: 3 }.is_transient());
    }

    #[test]
    fn messages_name_the_offending_values() {
        let err = EngineError::AnswerOutOfRange { index: 4, len: 3 };
        assert_eq!(err.to_string(), "answer index 4 out of range for 3 option(s)");

        let err = EngineError::WrongQuestionKind {
            question_id: 2,
            expected: "choice",
        };
        assert_eq!(err.to_string(), "question 2 is not a choice question");
    }
}
