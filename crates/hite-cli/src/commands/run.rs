//! The `hite run` command.
//!
//! Reads answers line by line from stdin. Choice questions take the option
//! number; free-text questions take the whole line. `:back` steps back one
//! question and `:quit` leaves without finishing.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use tokio::io::{AsyncBufReadExt, BufReader};

use hite_core::engine::{AssessmentEngine, Reveal, SessionState, Step};
use hite_core::model::{sample_question_set, Question};
use hite_core::parser::{FileSource, QuestionSource};
use hite_core::scoring::AssessmentResult;

/// Where the session stands after an answer has played out.
enum Flow {
    Continue,
    Finished,
    Exit,
}

pub async fn execute(question_set: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let (config, store) = super::open_store(config_path.as_deref())?;

    let questions = match question_set.or_else(|| config.question_set.clone()) {
        Some(path) => FileSource::new(path).load_questions()?,
        None => sample_question_set().load_questions()?,
    };

    let mut engine = AssessmentEngine::start(store, config.engine_config(), questions);
    if engine.state() == SessionState::Empty {
        println!("No questions available.");
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(question) = engine.current_question().cloned() {
        show_question(&engine, &question);

        let Some(line) = lines.next_line().await? else {
            println!("\nInput ended before the last question; session not finished.");
            return Ok(());
        };
        let input = line.trim();

        let attempt = match input {
            ":quit" | ":q" => {
                println!("Leaving the assessment.");
                return Ok(());
            }
            ":back" | ":b" => engine.retreat(),
            _ if question.is_free_text() => engine.submit_free_text(input),
            _ => match input.parse::<usize>() {
                Ok(n) if n >= 1 => engine.select_choice(n - 1),
                _ => {
                    println!("Enter a number between 1 and {}.", question.options().len());
                    continue;
                }
            },
        };

        let step = match attempt {
            Ok(step) => step,
            Err(e) if e.is_transient() => {
                println!("Still showing the last answer; try again.");
                continue;
            }
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match follow(&mut engine, step, &question).await {
            Flow::Continue => {}
            Flow::Finished => return Ok(()),
            Flow::Exit => {
                println!("Leaving the assessment.");
                return Ok(());
            }
        }
    }

    Ok(())
}

/// Play out a step: wait through a reveal and report completion.
async fn follow(engine: &mut AssessmentEngine, step: Step, question: &Question) -> Flow {
    let mut step = step;
    loop {
        match step {
            Step::Revealing { reveal, pending } => {
                show_reveal(question, reveal);
                let outcome = tokio::select! {
                    outcome = engine.wait_pending(pending) => Some(outcome),
                    _ = tokio::signal::ctrl_c() => None,
                };
                match outcome {
                    Some(Ok(Some(next))) => step = next,
                    Some(Ok(None)) => return Flow::Continue,
                    Some(Err(e)) => {
                        println!("{e}");
                        return Flow::Continue;
                    }
                    None => {
                        engine.cancel_pending();
                        return Flow::Exit;
                    }
                }
            }
            Step::Showing { .. } => return Flow::Continue,
            Step::Completed(result) => {
                print_result(&result);
                return Flow::Finished;
            }
            Step::Exit => return Flow::Exit,
        }
    }
}

fn show_question(engine: &AssessmentEngine, question: &Question) {
    println!(
        "\n[{}/{}] {}% {}",
        engine.position() + 1,
        engine.questions().len(),
        engine.progress_percent(),
        question.prompt
    );
    if question.is_free_text() {
        println!("  (type your answer; :back to go back, :quit to leave)");
    } else {
        for (i, option) in question.options().iter().enumerate() {
            println!("  {}) {option}", i + 1);
        }
    }
}

fn show_reveal(question: &Question, reveal: Reveal) {
    match (reveal.is_correct, reveal.correct_index) {
        (Some(true), _) => println!("Correct!"),
        (Some(false), Some(correct)) => {
            let answer = question
                .options()
                .get(correct)
                .map(String::as_str)
                .unwrap_or("?");
            println!("Not quite. The answer was: {answer}");
        }
        _ => println!("Noted."),
    }
}

fn print_result(result: &AssessmentResult) {
    let mut table = Table::new();
    table.set_header(vec!["Score", "Tier", "Points", "Knowledge check", "Bonus"]);
    table.add_row(vec![
        Cell::new(format!("{} / 1000", result.scaled_score)),
        Cell::new(result.tier),
        Cell::new(format!("{}/{}", result.total_points, result.max_points)),
        Cell::new(format!("{}/{}", result.kc_correct, result.kc_total)),
        Cell::new(format!("+{}", result.bonus)),
    ]);

    println!("\nSession complete.\n{table}");
    println!("Run `hite summary` to see the full breakdown.");
}
