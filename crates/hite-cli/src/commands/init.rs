//! The `hite init` command.

use std::path::Path;

use anyhow::{Context, Result};

use hite_core::model::sample_question_set;
use hite_core::parser::render_question_set;

pub fn execute() -> Result<()> {
    if Path::new("hite.toml").exists() {
        println!("hite.toml already exists, skipping.");
    } else {
        std::fs::write("hite.toml", SAMPLE_CONFIG).context("failed to write hite.toml")?;
        println!("Created hite.toml");
    }

    std::fs::create_dir_all("question-sets")?;
    let sample_path = Path::new("question-sets/self-doubt.toml");
    if sample_path.exists() {
        println!("question-sets/self-doubt.toml already exists, skipping.");
    } else {
        let toml = render_question_set(&sample_question_set())?;
        std::fs::write(sample_path, toml)
            .with_context(|| format!("failed to write {}", sample_path.display()))?;
        println!("Created question-sets/self-doubt.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: hite validate --question-set question-sets/self-doubt.toml");
    println!("  2. Run: hite run");
    println!("  3. Run: hite summary --commit");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# hite configuration

question_set = "question-sets/self-doubt.toml"

# How long an answer reveal shows before moving on.
advance_delay_ms = 720

# Points recorded for finishing a session.
completed_points = 100
streak_points = 7

# Score board.
base_score = 952
streak_days = 6

[store]
type = "file"
path = "./hite-store.json"
"#;
