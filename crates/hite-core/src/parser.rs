//! Question set parser.
//!
//! Loads question sets from TOML (or JSON) files and directories, and
//! validates them.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Category, Question, QuestionKind, QuestionSet};

/// Intermediate TOML structure for question set files.
#[derive(Debug, Serialize, Deserialize)]
struct TomlQuestionFile {
    question_set: TomlQuestionSetHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlQuestionSetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlQuestion {
    id: u32,
    prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<u32>,
    score_type: String,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correct_index: Option<usize>,
}

fn default_kind() -> String {
    "choice".to_string()
}

fn parse_kind(s: &str) -> Result<QuestionKind> {
    match s.trim().to_lowercase().as_str() {
        "choice" => Ok(QuestionKind::Choice),
        "free_text" | "free-text" | "text" => Ok(QuestionKind::FreeText),
        other => anyhow::bail!("unknown question kind: {other}"),
    }
}

/// Where a session's questions come from.
pub trait QuestionSource {
    /// Load the ordered question list. An empty list is not an error.
    fn load_questions(&self) -> Result<Vec<Question>>;
}

impl QuestionSource for QuestionSet {
    fn load_questions(&self) -> Result<Vec<Question>> {
        Ok(self.questions.clone())
    }
}

/// A question set file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl QuestionSource for FileSource {
    fn load_questions(&self) -> Result<Vec<Question>> {
        Ok(parse_question_set(&self.path)?.questions)
    }
}

/// Parse a question set file. `.json` files are read as JSON, anything
/// else as TOML.
pub fn parse_question_set(path: &Path) -> Result<QuestionSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question set file: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        parse_question_set_json(&content, path)
    } else {
        parse_question_set_str(&content, path)
    }
}

/// Parse a TOML string into a `QuestionSet` (useful for testing).
pub fn parse_question_set_str(content: &str, source_path: &Path) -> Result<QuestionSet> {
    let parsed: TomlQuestionFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| {
            let kind = parse_kind(&q.kind)
                .with_context(|| format!("question {} in {}", q.id, source_path.display()))?;
            Ok(Question {
                id: q.id,
                prompt: q.prompt,
                position: q.position.unwrap_or(i as u32 + 1),
                category: Category::from(q.score_type),
                kind,
                answers: q.answers,
                correct_index: q.correct_index,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    finish_set(
        QuestionSet {
            id: parsed.question_set.id,
            name: parsed.question_set.name,
            description: parsed.question_set.description,
            questions,
        },
        source_path,
    )
}

/// Parse JSON: either a full question set object or a bare question array.
pub fn parse_question_set_json(content: &str, source_path: &Path) -> Result<QuestionSet> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum JsonShape {
        Set(QuestionSet),
        Bare(Vec<Question>),
    }

    let shape: JsonShape = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;
    let set = match shape {
        JsonShape::Set(set) => set,
        JsonShape::Bare(questions) => {
            let stem = source_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "questions".to_string());
            QuestionSet {
                id: stem.clone(),
                name: stem,
                description: String::new(),
                questions,
            }
        }
    };
    finish_set(set, source_path)
}

/// Reject broken correct indices and order questions by position.
fn finish_set(mut set: QuestionSet, source_path: &Path) -> Result<QuestionSet> {
    for q in &set.questions {
        if let Some(correct) = q.correct_index {
            if q.kind == QuestionKind::Choice && correct >= q.options().len() {
                anyhow::bail!(
                    "question {} in {}: correct_index {} is out of range for {} answer(s)",
                    q.id,
                    source_path.display(),
                    correct,
                    q.options().len()
                );
            }
        }
    }
    set.questions.sort_by_key(|q| q.position);
    Ok(set)
}

/// Render a question set as TOML in the format [`parse_question_set_str`] reads.
pub fn render_question_set(set: &QuestionSet) -> Result<String> {
    let file = TomlQuestionFile {
        question_set: TomlQuestionSetHeader {
            id: set.id.clone(),
            name: set.name.clone(),
            description: set.description.clone(),
        },
        questions: set
            .questions
            .iter()
            .map(|q| TomlQuestion {
                id: q.id,
                prompt: q.prompt.clone(),
                position: Some(q.position),
                score_type: q.category.to_string(),
                kind: match q.kind {
                    QuestionKind::Choice => "choice".into(),
                    QuestionKind::FreeText => "free_text".into(),
                },
                answers: q.answers.clone(),
                correct_index: q.correct_index,
            })
            .collect(),
    };
    toml::to_string(&file).context("failed to render question set as TOML")
}

/// Recursively load all question set files (`.toml`, `.json`) from a directory.
pub fn load_question_directory(dir: &Path) -> Result<Vec<QuestionSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            sets.extend(load_question_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_question_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sets)
}

/// A warning from question set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Validate a question set for common issues.
pub fn validate_question_set(set: &QuestionSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let warn = |id: u32, message: String| ValidationWarning {
        question_id: Some(id),
        message,
    };

    if set.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "question set has no questions".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    let mut seen_positions = HashSet::new();
    for q in &set.questions {
        if !seen_ids.insert(q.id) {
            warnings.push(warn(q.id, format!("duplicate question ID: {}", q.id)));
        }
        if !seen_positions.insert(q.position) {
            warnings.push(warn(q.id, format!("duplicate position: {}", q.position)));
        }
    }

    for q in &set.questions {
        if q.prompt.trim().is_empty() {
            warnings.push(warn(q.id, "prompt is empty".into()));
        }

        match q.kind {
            QuestionKind::Choice if q.options().len() < 2 => {
                warnings.push(warn(
                    q.id,
                    format!(
                        "{} question has fewer than two answers and cannot award points",
                        q.kind.label()
                    ),
                ));
            }
            QuestionKind::FreeText if q.answers.is_some() || q.correct_index.is_some() => {
                warnings.push(warn(
                    q.id,
                    format!(
                        "{} question declares answers; they will be ignored",
                        q.kind.label()
                    ),
                ));
            }
            _ => {}
        }
    }

    warnings
}
