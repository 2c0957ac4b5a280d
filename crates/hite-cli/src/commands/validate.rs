//! The `hite validate` command.

use std::path::PathBuf;

use anyhow::Result;

use hite_core::parser;

pub fn execute(question_set_path: PathBuf) -> Result<()> {
    let sets = if question_set_path.is_dir() {
        parser::load_question_directory(&question_set_path)?
    } else {
        vec![parser::parse_question_set(&question_set_path)?]
    };

    let mut total_warnings = 0;

    for set in &sets {
        println!("Question set: {} ({} questions)", set.name, set.questions.len());

        let warnings = parser::validate_question_set(set);
        for w in &warnings {
            let prefix = w
                .question_id
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if sets.is_empty() {
        println!("No question sets found.");
    } else if total_warnings == 0 {
        println!("All question sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
