//! hite-report: Results summary and score board.
//!
//! Reads what a finished session left in the store, applies it to the score
//! board, and renders it as markdown or JSON.

pub mod render;
pub mod summary;

pub use render::{to_json, to_markdown};
pub use summary::{ResultsSummary, ScoreBoard, ScoreBoardUpdate, XpLevel};
