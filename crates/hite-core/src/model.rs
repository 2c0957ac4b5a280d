//! Core data model types for hite.
//!
//! Questions are read-only for a session. Answer records form the session's
//! navigation log, and the aggregate holds per-category running totals.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The sub-score a question contributes to.
///
/// The four named categories are always seeded in an aggregate. Any other
/// tag is carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Composure,
    Confidence,
    Competitiveness,
    Commitment,
    Other(String),
}

impl Category {
    /// Categories every aggregate starts with.
    pub const KNOWN: [Category; 4] = [
        Category::Composure,
        Category::Confidence,
        Category::Competitiveness,
        Category::Commitment,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Composure => "composure",
            Category::Confidence => "confidence",
            Category::Competitiveness => "competitiveness",
            Category::Commitment => "commitment",
            Category::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        let tag = s.trim();
        match tag.to_lowercase().as_str() {
            "composure" => Category::Composure,
            "confidence" => Category::Confidence,
            "competitiveness" => Category::Competitiveness,
            "commitment" => Category::Commitment,
            _ => Category::Other(tag.to_string()),
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::from(s.as_str())
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        match c {
            Category::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::from(s))
    }
}

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Pick one of the listed options.
    #[default]
    Choice,
    /// Type an answer; never graded, never scored.
    FreeText,
}

impl QuestionKind {
    pub fn label(self) -> &'static str {
        match self {
            QuestionKind::Choice => "choice",
            QuestionKind::FreeText => "free-text",
        }
    }
}

/// A single assessment question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within a question set.
    pub id: u32,
    /// Prompt shown to the user.
    #[serde(alias = "question")]
    pub prompt: String,
    /// Ordinal position (1-based) in the presented sequence.
    #[serde(default)]
    pub position: u32,
    /// Sub-score this question feeds.
    #[serde(rename = "score_type", alias = "category")]
    pub category: Category,
    #[serde(default)]
    pub kind: QuestionKind,
    /// Options ordered from best (index 0) to worst.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<String>>,
    /// Index of the single correct option, if the question is gradable.
    #[serde(default, alias = "correctIndex", skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
}

impl Question {
    /// A choice question with the given options.
    pub fn choice<S: Into<String>>(
        id: u32,
        prompt: impl Into<String>,
        category: Category,
        answers: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            position: id,
            category,
            kind: QuestionKind::Choice,
            answers: Some(answers.into_iter().map(Into::into).collect()),
            correct_index: None,
        }
    }

    /// A free-text question.
    pub fn free_text(id: u32, prompt: impl Into<String>, category: Category) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            position: id,
            category,
            kind: QuestionKind::FreeText,
            answers: None,
            correct_index: None,
        }
    }

    /// Marks option `index` as the correct one.
    pub fn with_correct(mut self, index: usize) -> Self {
        self.correct_index = Some(index);
        self
    }

    /// Overrides the presentation position, which otherwise follows the id.
    pub fn at_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    pub fn is_free_text(&self) -> bool {
        self.kind == QuestionKind::FreeText
    }

    /// The answer options, empty when none are declared.
    pub fn options(&self) -> &[String] {
        self.answers.as_deref().unwrap_or(&[])
    }

    /// The correct option for a gradable choice question.
    ///
    /// An index that does not point into the options is treated as absent.
    pub fn correct_option(&self) -> Option<usize> {
        match self.kind {
            QuestionKind::Choice => self.correct_index.filter(|&i| i < self.options().len()),
            QuestionKind::FreeText => None,
        }
    }

    pub fn is_gradable(&self) -> bool {
        self.correct_option().is_some()
    }

    /// Highest number of points this question can award.
    ///
    /// Free-text questions never count toward the ceiling. A choice question
    /// without options counts as a single option and contributes zero.
    pub fn max_points(&self) -> u32 {
        match self.kind {
            QuestionKind::FreeText => 0,
            QuestionKind::Choice => {
                let len = self.answers.as_ref().map_or(1, Vec::len);
                u32::try_from(len.saturating_sub(1)).unwrap_or(u32::MAX)
            }
        }
    }
}

/// One response in the session's answer log.
///
/// Field names on the wire match the `answers` store entry read by the
/// results display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    #[serde(rename = "questionId")]
    pub question_id: u32,
    #[serde(rename = "score_type")]
    pub category: Category,
    #[serde(rename = "score")]
    pub points: u32,
    /// The chosen option text or the typed text; `None` when blank.
    pub answer: Option<String>,
    #[serde(default)]
    pub gradable: bool,
    /// Present only when `gradable`.
    #[serde(rename = "isCorrect", default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

/// Running per-category totals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aggregate(BTreeMap<Category, u32>);

impl Aggregate {
    /// Every known category at zero.
    pub fn seeded() -> Self {
        Self(Category::KNOWN.iter().cloned().map(|c| (c, 0)).collect())
    }

    /// Known categories plus every category used by `questions`, at zero.
    pub fn seeded_for(questions: &[Question]) -> Self {
        let mut aggregate = Self::seeded();
        for q in questions {
            aggregate.0.entry(q.category.clone()).or_insert(0);
        }
        aggregate
    }

    /// Re-aggregate an answer log on top of a seed.
    pub fn from_records(seed: Aggregate, records: &[AnswerRecord]) -> Self {
        records.iter().fold(seed, |mut acc, r| {
            acc.add(&r.category, r.points);
            acc
        })
    }

    pub fn add(&mut self, category: &Category, points: u32) {
        let entry = self.0.entry(category.clone()).or_insert(0);
        *entry = entry.saturating_add(points);
    }

    /// Subtract, floored at zero. Unknown categories are left alone.
    pub fn subtract(&mut self, category: &Category, points: u32) {
        if let Some(entry) = self.0.get_mut(category) {
            *entry = entry.saturating_sub(points);
        }
    }

    pub fn get(&self, category: &Category) -> u32 {
        self.0.get(category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().map(|&v| u64::from(v)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, u32)> {
        self.0.iter().map(|(c, &v)| (c, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A named, ordered collection of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// The built-in two-question set used by `hite init` and in tests.
pub fn sample_question_set() -> QuestionSet {
    QuestionSet {
        id: "self-doubt".into(),
        name: "Self-Doubt Check-In".into(),
        description: "Knowledge check followed by a reflection prompt".into(),
        questions: vec![
            Question::choice(
                1,
                "What's one of the best ways to interrupt a self-doubt spiral?",
                Category::Confidence,
                [
                    "Push through until it fades.",
                    "Make one small commitment you can follow through on.",
                    "Wait for a good performance to feel better.",
                ],
            )
            .with_correct(1),
            Question::free_text(
                2,
                "Why do you think following through on small commitments helps interrupt doubt?",
                Category::Composure,
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_and_display() {
        assert_eq!(Category::from("composure"), Category::Composure);
        assert_eq!(Category::from(" Confidence "), Category::Confidence);
        assert_eq!(
            Category::from("resilience"),
            Category::Other("resilience".into())
        );
        assert_eq!(Category::Commitment.to_string(), "commitment");
        assert_eq!(Category::Other("grit".into()).to_string(), "grit");
    }

    #[test]
    fn category_serializes_as_plain_string() {
        let json = serde_json::to_string(&Category::Competitiveness).unwrap();
        assert_eq!(json, "\"competitiveness\"");
        let back: Category = serde_json::from_str("\"grit\"").unwrap();
        assert_eq!(back, Category::Other("grit".into()));
    }

    #[test]
    fn correct_option_ignores_out_of_range_index() {
        let q = Question::choice(1, "q", Category::Confidence, ["a", "b"]).with_correct(5);
        assert_eq!(q.correct_option(), None);
        assert!(!q.is_gradable());

        let q = Question::choice(1, "q", Category::Confidence, ["a", "b"]).with_correct(1);
        assert_eq!(q.correct_option(), Some(1));
    }

    #[test]
    fn original_field_names_are_accepted() {
        let q: Question = serde_json::from_str(
            r#"{"id":1,"question":"q","score_type":"confidence","answers":["a","b"],"correctIndex":0}"#,
        )
        .unwrap();
        assert_eq!(q.prompt, "q");
        assert_eq!(q.correct_option(), Some(0));
        assert_eq!(q.kind.label(), "choice");
        assert_eq!(QuestionKind::FreeText.label(), "free-text");
    }

    #[test]
    fn free_text_is_never_gradable_or_weighted() {
        let mut q = Question::free_text(2, "why?", Category::Composure);
        q.answers = Some(vec!["x".into(), "y".into(), "z".into()]);
        q.correct_index = Some(0);
        assert!(!q.is_gradable());
        assert_eq!(q.max_points(), 0);
    }

    #[test]
    fn max_points_counts_missing_answers_as_one_option() {
        let mut q = Question::choice(1, "q", Category::Confidence, ["a", "b", "c", "d"]);
        assert_eq!(q.max_points(), 3);
        q.answers = None;
        assert_eq!(q.max_points(), 0);
        q.answers = Some(vec![]);
        assert_eq!(q.max_points(), 0);
    }

    #[test]
    fn answer_record_wire_names() {
        let record = AnswerRecord {
            question_id: 1,
            category: Category::Confidence,
            points: 1,
            answer: Some("b".into()),
            gradable: true,
            is_correct: Some(true),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["questionId"], 1);
        assert_eq!(value["score_type"], "confidence");
        assert_eq!(value["score"], 1);
        assert_eq!(value["isCorrect"], true);

        let ungraded = AnswerRecord {
            gradable: false,
            is_correct: None,
            answer: None,
            ..record
        };
        let value = serde_json::to_value(&ungraded).unwrap();
        assert!(value.get("isCorrect").is_none());
        assert!(value["answer"].is_null());
    }

    #[test]
    fn aggregate_seeding_and_floor() {
        let questions = vec![Question::choice(1, "q", Category::Other("grit".into()), ["a"])];
        let mut agg = Aggregate::seeded_for(&questions);
        assert_eq!(agg.len(), 5);
        assert_eq!(agg.total(), 0);

        agg.add(&Category::Confidence, 2);
        agg.subtract(&Category::Confidence, 5);
        assert_eq!(agg.get(&Category::Confidence), 0);

        agg.subtract(&Category::Other("unseen".into()), 1);
        assert_eq!(agg.len(), 5);
    }

    #[test]
    fn aggregate_json_is_a_flat_object() {
        let mut agg = Aggregate::seeded();
        agg.add(&Category::Composure, 3);
        let value = serde_json::to_value(&agg).unwrap();
        assert_eq!(value["composure"], 3);
        assert_eq!(value["commitment"], 0);
    }

    #[test]
    fn sample_set_shape() {
        let set = sample_question_set();
        assert_eq!(set.questions.len(), 2);
        assert!(set.questions[0].is_gradable());
        assert!(set.questions[1].is_free_text());
    }
}
