//! hite-core: Assessment engine, scoring, and the store contract.
//!
//! This crate defines the data model, the session state machine, and the
//! scoring rules that the rest of hite builds on. Persistence is reached
//! only through the [`store::KeyValueStore`] trait.

pub mod engine;
pub mod error;
pub mod feedback;
pub mod model;
pub mod parser;
pub mod scoring;
pub mod store;

pub use engine::{AssessmentEngine, EngineConfig, PendingAdvance, SessionState, Step};
pub use error::{EngineError, StoreError};
pub use model::{Aggregate, AnswerRecord, Category, Question, QuestionKind, QuestionSet};
pub use scoring::{AssessmentResult, Tier};
pub use store::{KeyValueStore, MemoryStore};
